#![forbid(unsafe_code)]

//! Dialog configuration.
//!
//! [`DialogConfig`] is the typed builder passed to
//! [`Dialog::new`](super::Dialog::new). [`DialogOptions`] is its declarative twin,
//! deserialised from TOML or JSON, with string-typed fields validated by
//! [`DialogOptions::into_config`].
//!
//! # Defaults
//!
//! | Option | Default |
//! |--------|---------|
//! | `classPrefix` | `ui-dialog` |
//! | `hasMask` | `true` |
//! | `hideOnClickMask` | `false` |
//! | `hideOnKeyEscape` | `true` |
//! | `closeTpl` | `×` |
//! | `width` | `auto` |
//! | `height` | unset |
//! | `effect` | `none` |
//! | `zIndex` | `999` |
//! | `align` | centred on both axes |

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use veil_core::{Dimension, DimensionError, Selector, SelectorError};

use super::attrs::{Content, Effect, Trigger, UnknownEffect};
use crate::overlay::{Align, Anchor};
use crate::template::{DialogTemplate, MarkupTemplate, Template, TemplateError};

pub const DEFAULT_CLASS_PREFIX: &str = "ui-dialog";
pub const DEFAULT_CLOSE_TPL: &str = "×";
pub const DEFAULT_Z_INDEX: i32 = 999;

/// Errors from loading declarative options.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse TOML dialog options: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to parse JSON dialog options: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid {field}: {source}")]
    Dimension {
        field: &'static str,
        #[source]
        source: DimensionError,
    },
    #[error(transparent)]
    Effect(#[from] UnknownEffect),
    #[error("invalid trigger selector: {0}")]
    Trigger(#[from] SelectorError),
    #[error("invalid template: {0}")]
    Template(#[from] TemplateError),
}

/// Construction options for a dialog.
#[derive(Debug, Clone)]
pub struct DialogConfig {
    pub(crate) template: Rc<dyn Template>,
    pub(crate) trigger: Trigger,
    pub(crate) class_prefix: String,
    pub(crate) content: Content,
    pub(crate) has_mask: bool,
    pub(crate) hide_on_click_mask: bool,
    pub(crate) hide_on_key_escape: bool,
    pub(crate) close_tpl: String,
    pub(crate) width: Dimension,
    pub(crate) height: Option<Dimension>,
    pub(crate) effect: Effect,
    pub(crate) z_index: i32,
    pub(crate) align: Align,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            template: Rc::new(DialogTemplate),
            trigger: Trigger::None,
            class_prefix: DEFAULT_CLASS_PREFIX.to_owned(),
            content: Content::Empty,
            has_mask: true,
            hide_on_click_mask: false,
            hide_on_key_escape: true,
            close_tpl: DEFAULT_CLOSE_TPL.to_owned(),
            width: Dimension::Auto,
            height: None,
            effect: Effect::None,
            z_index: DEFAULT_Z_INDEX,
            align: Align::CENTERED,
        }
    }
}

impl DialogConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Skeleton template. Only read at construction.
    #[must_use]
    pub fn template(mut self, template: impl Template + 'static) -> Self {
        self.template = Rc::new(template);
        self
    }

    #[must_use]
    pub fn trigger(mut self, trigger: impl Into<Trigger>) -> Self {
        self.trigger = trigger.into();
        self
    }

    #[must_use]
    pub fn class_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.class_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn content(mut self, content: impl Into<Content>) -> Self {
        self.content = content.into();
        self
    }

    #[must_use]
    pub fn has_mask(mut self, has_mask: bool) -> Self {
        self.has_mask = has_mask;
        self
    }

    #[must_use]
    pub fn hide_on_click_mask(mut self, hide: bool) -> Self {
        self.hide_on_click_mask = hide;
        self
    }

    #[must_use]
    pub fn hide_on_key_escape(mut self, hide: bool) -> Self {
        self.hide_on_key_escape = hide;
        self
    }

    #[must_use]
    pub fn close_tpl(mut self, close_tpl: impl Into<String>) -> Self {
        self.close_tpl = close_tpl.into();
        self
    }

    #[must_use]
    pub fn width(mut self, width: Dimension) -> Self {
        self.width = width;
        self
    }

    #[must_use]
    pub fn height(mut self, height: Dimension) -> Self {
        self.height = Some(height);
        self
    }

    #[must_use]
    pub fn effect(mut self, effect: Effect) -> Self {
        self.effect = effect;
        self
    }

    #[must_use]
    pub fn z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    #[must_use]
    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }
}

/// A length given either as a bare pixel count or as text (`auto`, `300px`,
/// `50%`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum LengthOption {
    Px(u32),
    Text(String),
}

impl LengthOption {
    fn parse(&self, field: &'static str) -> Result<Dimension, ConfigError> {
        match self {
            Self::Px(px) => Ok(Dimension::Px(*px)),
            Self::Text(text) => text
                .parse()
                .map_err(|source| ConfigError::Dimension { field, source }),
        }
    }
}

/// Declarative alignment: `selfXY` on the dialog pinned to `baseXY` on the
/// viewport.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AlignOptions {
    #[serde(rename = "selfXY")]
    pub self_xy: [String; 2],
    #[serde(rename = "baseXY")]
    pub base_xy: [String; 2],
}

impl AlignOptions {
    fn parse(&self) -> Result<Align, ConfigError> {
        let anchor = |pair: &[String; 2]| -> Result<Anchor, ConfigError> {
            let axis = |value: &str| {
                value.parse::<Dimension>().map_err(|source| ConfigError::Dimension {
                    field: "align",
                    source,
                })
            };
            Ok(Anchor::new(axis(&pair[0])?, axis(&pair[1])?))
        };
        Ok(Align::new(anchor(&self.self_xy)?, anchor(&self.base_xy)?))
    }
}

/// Serialisable dialog options. Unset fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct DialogOptions {
    /// Markup template with `{{classPrefix}}` placeholders.
    pub template: Option<String>,
    /// Selector for trigger elements.
    pub trigger: Option<String>,
    pub class_prefix: Option<String>,
    pub content: Option<String>,
    pub has_mask: Option<bool>,
    pub hide_on_click_mask: Option<bool>,
    pub hide_on_key_escape: Option<bool>,
    pub close_tpl: Option<String>,
    pub width: Option<LengthOption>,
    pub height: Option<LengthOption>,
    /// `none` or `fade`.
    pub effect: Option<String>,
    pub z_index: Option<i32>,
    pub align: Option<AlignOptions>,
}

impl DialogOptions {
    /// Parse options from TOML.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Parse options from JSON.
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Validate into a [`DialogConfig`].
    pub fn into_config(self) -> Result<DialogConfig, ConfigError> {
        let mut config = DialogConfig::default();
        if let Some(source) = self.template {
            config = config.template(MarkupTemplate::parse(source)?);
        }
        if let Some(selector) = self.trigger {
            config = config.trigger(Selector::parse(&selector)?);
        }
        if let Some(prefix) = self.class_prefix {
            config = config.class_prefix(prefix);
        }
        if let Some(content) = self.content {
            config = config.content(content);
        }
        if let Some(has_mask) = self.has_mask {
            config = config.has_mask(has_mask);
        }
        if let Some(hide) = self.hide_on_click_mask {
            config = config.hide_on_click_mask(hide);
        }
        if let Some(hide) = self.hide_on_key_escape {
            config = config.hide_on_key_escape(hide);
        }
        if let Some(close_tpl) = self.close_tpl {
            config = config.close_tpl(close_tpl);
        }
        if let Some(width) = &self.width {
            config = config.width(width.parse("width")?);
        }
        if let Some(height) = &self.height {
            config = config.height(height.parse("height")?);
        }
        if let Some(effect) = &self.effect {
            config = config.effect(effect.parse()?);
        }
        if let Some(z_index) = self.z_index {
            config = config.z_index(z_index);
        }
        if let Some(align) = &self.align {
            config = config.align(align.parse()?);
        }
        Ok(config)
    }
}
