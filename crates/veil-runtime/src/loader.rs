#![forbid(unsafe_code)]

//! Remote content loaders.
//!
//! A [`ContentLoader`] turns a URL into markup. Loaders are synchronous; the
//! [`Fetcher`](crate::Fetcher) is what makes a load asynchronous from the
//! widget's point of view.
//!
//! # Failure Modes
//!
//! | Failure | Error |
//! |---------|-------|
//! | Empty or unparseable URL | [`LoadError::InvalidUrl`] |
//! | Nothing served at the URL | [`LoadError::NotFound`] |
//! | Network or server failure | [`LoadError::Transport`] |

use std::cell::Cell;

use ahash::AHashMap;

/// Errors from loading remote content.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("no content found at {url}")]
    NotFound { url: String },
    #[error("failed to load {url}: {message}")]
    Transport { url: String, message: String },
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl LoadError {
    /// The URL the failed load was for.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::NotFound { url } | Self::Transport { url, .. } | Self::InvalidUrl { url, .. } => {
                url
            }
        }
    }
}

/// Source of remote content.
pub trait ContentLoader {
    /// Load the markup served at `url`.
    fn load(&self, url: &str) -> Result<String, LoadError>;
}

#[derive(Debug, Clone)]
enum Route {
    Body(String),
    Fail(String),
}

/// In-memory loader serving fixed routes.
///
/// Useful for tests and for pages whose "remote" fragments ship with the
/// binary.
#[derive(Debug, Default)]
pub struct StaticLoader {
    routes: AHashMap<String, Route>,
    loads: Cell<usize>,
}

impl StaticLoader {
    /// Create a loader with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` at `url`.
    #[must_use]
    pub fn route(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.routes.insert(url.into(), Route::Body(body.into()));
        self
    }

    /// Fail every load of `url` with a transport error.
    #[must_use]
    pub fn failing(mut self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.routes.insert(url.into(), Route::Fail(message.into()));
        self
    }

    /// Number of loads attempted so far.
    #[must_use]
    pub fn loads(&self) -> usize {
        self.loads.get()
    }
}

impl ContentLoader for StaticLoader {
    fn load(&self, url: &str) -> Result<String, LoadError> {
        self.loads.set(self.loads.get() + 1);
        if url.trim().is_empty() {
            return Err(LoadError::InvalidUrl {
                url: url.to_owned(),
                reason: "empty url".to_owned(),
            });
        }
        match self.routes.get(url) {
            Some(Route::Body(body)) => Ok(body.clone()),
            Some(Route::Fail(message)) => Err(LoadError::Transport {
                url: url.to_owned(),
                message: message.clone(),
            }),
            None => Err(LoadError::NotFound {
                url: url.to_owned(),
            }),
        }
    }
}

#[cfg(feature = "http")]
mod http {
    use reqwest::{StatusCode, Url, blocking::Client};

    use super::{ContentLoader, LoadError};

    /// Blocking HTTP loader.
    ///
    /// Relative URLs (`/x`, `./x`, `../x`) are joined onto the base URL;
    /// without a base only absolute URLs load.
    #[derive(Debug, Clone, Default)]
    pub struct HttpLoader {
        client: Client,
        base: Option<Url>,
    }

    impl HttpLoader {
        /// Loader for absolute URLs only.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Loader resolving relative URLs against `base`.
        pub fn with_base(base: &str) -> Result<Self, LoadError> {
            let base = Url::parse(base).map_err(|err| LoadError::InvalidUrl {
                url: base.to_owned(),
                reason: err.to_string(),
            })?;
            Ok(Self {
                client: Client::new(),
                base: Some(base),
            })
        }

        fn resolve(&self, url: &str) -> Result<Url, LoadError> {
            let parsed = match &self.base {
                Some(base) => base.join(url),
                None => Url::parse(url),
            };
            parsed.map_err(|err| LoadError::InvalidUrl {
                url: url.to_owned(),
                reason: err.to_string(),
            })
        }
    }

    impl ContentLoader for HttpLoader {
        fn load(&self, url: &str) -> Result<String, LoadError> {
            let target = self.resolve(url)?;
            tracing::debug!(%target, "fetching remote content");
            let transport = |err: reqwest::Error| LoadError::Transport {
                url: url.to_owned(),
                message: err.to_string(),
            };
            let response = self.client.get(target).send().map_err(transport)?;
            if response.status() == StatusCode::NOT_FOUND {
                return Err(LoadError::NotFound {
                    url: url.to_owned(),
                });
            }
            response
                .error_for_status()
                .map_err(transport)?
                .text()
                .map_err(transport)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn relative_urls_join_onto_base() {
            let loader = HttpLoader::with_base("http://localhost:8080/pages/").unwrap();
            assert_eq!(
                loader.resolve("./demo.html").unwrap().as_str(),
                "http://localhost:8080/pages/demo.html"
            );
            assert_eq!(
                loader.resolve("/root.html").unwrap().as_str(),
                "http://localhost:8080/root.html"
            );
        }

        #[test]
        fn relative_urls_need_a_base() {
            let err = HttpLoader::new().resolve("/demo.html").unwrap_err();
            assert!(matches!(err, LoadError::InvalidUrl { .. }));
        }
    }
}

#[cfg(feature = "http")]
pub use http::HttpLoader;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serves_routes_and_counts_loads() {
        let loader = StaticLoader::new().route("/a.html", "<p>a</p>");
        assert_eq!(loader.load("/a.html").as_deref(), Ok("<p>a</p>"));
        assert_eq!(
            loader.load("/b.html"),
            Err(LoadError::NotFound {
                url: "/b.html".into()
            })
        );
        assert_eq!(loader.loads(), 2);
    }

    #[test]
    fn failing_route_reports_transport_error() {
        let loader = StaticLoader::new().failing("./x.html", "connection reset");
        let err = loader.load("./x.html").unwrap_err();
        assert_eq!(err.url(), "./x.html");
        assert_eq!(err.to_string(), "failed to load ./x.html: connection reset");
    }

    #[test]
    fn empty_url_is_invalid() {
        let err = StaticLoader::new().load("  ").unwrap_err();
        assert!(matches!(err, LoadError::InvalidUrl { .. }));
    }
}
