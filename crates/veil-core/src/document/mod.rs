#![forbid(unsafe_code)]

//! Headless document model.
//!
//! [`Document`] is a shared, single-threaded element tree standing in for a
//! browser page: nodes live in an arena addressed by [`ElementId`], carry
//! attributes and a [`Style`], and can be queried with simple selectors.
//! Listeners are registered per [`Target`] under `event.namespace` specs and
//! events bubble from their target up to the document.
//!
//! # Invariants
//!
//! 1. A node has at most one parent and appears exactly once in that
//!    parent's child list.
//! 2. Removed nodes are dead forever: every operation on a dead id is a
//!    silent no-op, and their listeners are dropped.
//! 3. No internal borrow is held while a listener runs, so listeners may
//!    freely mutate the document (including removing their own target).
//! 4. The focused element, if any, is alive.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Dead id | Node removed earlier | Reads return empty, writes ignored |
//! | Cycle | Appending an ancestor into a descendant | Ignored |
//! | Orphan reference | `insert_before` against a detached node | Ignored |

mod layout;
mod listeners;
mod node;

use std::cell::RefCell;
use std::rc::Rc;

use web_time::{Duration, Instant};

pub use layout::{CHAR_WIDTH, LINE_HEIGHT};
pub use listeners::Handler;
pub use node::{Dimension, DimensionError, Display, ElementId, FadeIn, Style};

use listeners::Listeners;
use node::{Node, NodeKind};

use crate::event::{Event, KeyCode, KeyEvent, MouseButton};
use crate::geometry::{Point, Rect, Size};
use crate::markup::{self, MarkupNode};
use crate::selector::{Matchable, Selector};

/// Viewport used by [`Document::global`].
pub const DEFAULT_VIEWPORT: Size = Size::new(1024, 768);

thread_local! {
    static GLOBAL_DOCUMENT: Document = Document::new(DEFAULT_VIEWPORT);
}

/// Where a listener is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Document,
    Element(ElementId),
}

pub(crate) struct Tree {
    nodes: Vec<Node>,
    body: ElementId,
    focused: Option<ElementId>,
    viewport: Size,
    listeners: Listeners,
}

impl Tree {
    fn node(&self, id: ElementId) -> Option<&Node> {
        self.nodes.get(id.0 as usize).filter(|n| n.alive)
    }

    fn node_mut(&mut self, id: ElementId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize).filter(|n| n.alive)
    }

    fn insert(&mut self, node: Node) -> ElementId {
        let id = ElementId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(node);
        id
    }

    fn is_ancestor(&self, ancestor: ElementId, mut id: ElementId) -> bool {
        while let Some(parent) = self.node(id).and_then(|n| n.parent) {
            if parent == ancestor {
                return true;
            }
            id = parent;
        }
        false
    }

    fn detach(&mut self, id: ElementId) {
        let Some(parent) = self.node_mut(id).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|&c| c != id);
        }
    }

    fn subtree(&self, root: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.node(id) {
                out.push(id);
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    fn kill(&mut self, root: ElementId) {
        self.detach(root);
        for id in self.subtree(root) {
            self.listeners.clear_target(Target::Element(id));
            if self.focused == Some(id) {
                self.focused = None;
            }
            if let Some(node) = self.nodes.get_mut(id.0 as usize) {
                node.alive = false;
                node.children.clear();
            }
        }
    }

    fn ancestors(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut cur = self.node(id).and_then(|n| n.parent);
        while let Some(p) = cur {
            out.push(p);
            cur = self.node(p).and_then(|n| n.parent);
        }
        out
    }

    fn is_connected(&self, id: ElementId) -> bool {
        id == self.body || self.is_ancestor(self.body, id)
    }

    fn matches(&self, id: ElementId, selector: &Selector) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        let ancestors: Vec<&Node> = self
            .ancestors(id)
            .into_iter()
            .filter_map(|a| self.node(a))
            .collect();
        selector.matches(node, ancestors)
    }

    fn build(&mut self, parent: ElementId, nodes: &[MarkupNode]) {
        for markup in nodes {
            let id = match markup {
                MarkupNode::Text(text) => self.insert(Node::text(text)),
                MarkupNode::Element {
                    tag,
                    attrs,
                    children,
                } => {
                    let mut node = Node::element(tag);
                    for (name, value) in attrs {
                        node.set_attr(name, value);
                    }
                    let id = self.insert(node);
                    self.build(id, children);
                    id
                }
            };
            if let Some(node) = self.node_mut(id) {
                node.parent = Some(parent);
            }
            if let Some(p) = self.node_mut(parent) {
                p.children.push(id);
            }
        }
    }

    fn to_markup(&self, id: ElementId) -> Option<MarkupNode> {
        let node = self.node(id)?;
        Some(match &node.kind {
            NodeKind::Text(text) => MarkupNode::Text(text.clone()),
            NodeKind::Element { tag } => MarkupNode::Element {
                tag: tag.clone(),
                attrs: node.attrs.clone(),
                children: node
                    .children
                    .iter()
                    .filter_map(|&c| self.to_markup(c))
                    .collect(),
            },
        })
    }

    fn text_content(&self, id: ElementId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element { .. } => {
                for &child in &node.children {
                    self.text_content(child, out);
                }
            }
        }
    }
}

/// Shared handle to a document.
///
/// Cloning is cheap; all clones observe the same tree.
#[derive(Clone)]
pub struct Document {
    tree: Rc<RefCell<Tree>>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tree = self.tree.borrow();
        f.debug_struct("Document")
            .field("nodes", &tree.nodes.len())
            .field("viewport", &tree.viewport)
            .field("focused", &tree.focused)
            .finish()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.tree, &other.tree)
    }
}

impl Document {
    /// Create an empty document with a `<body>` and the given viewport.
    #[must_use]
    pub fn new(viewport: Size) -> Self {
        let mut nodes = Vec::new();
        nodes.push(Node::element("body"));
        Self {
            tree: Rc::new(RefCell::new(Tree {
                nodes,
                body: ElementId(0),
                focused: None,
                viewport,
                listeners: Listeners::default(),
            })),
        }
    }

    /// Access the global document (thread-local).
    #[must_use]
    pub fn global() -> Self {
        GLOBAL_DOCUMENT.with(Clone::clone)
    }

    /// The `<body>` element.
    #[must_use]
    pub fn body(&self) -> ElementId {
        self.tree.borrow().body
    }

    /// Current viewport size.
    #[must_use]
    pub fn viewport(&self) -> Size {
        self.tree.borrow().viewport
    }

    /// Resize the viewport.
    pub fn set_viewport(&self, size: Size) {
        self.tree.borrow_mut().viewport = size;
    }

    // --- Tree construction ---

    /// Create a detached element.
    pub fn create_element(&self, tag: &str) -> ElementId {
        self.tree.borrow_mut().insert(Node::element(tag))
    }

    /// Create a detached text node.
    pub fn create_text(&self, text: &str) -> ElementId {
        self.tree.borrow_mut().insert(Node::text(text))
    }

    /// Create detached nodes from markup. Returns the top-level ids.
    pub fn create_markup(&self, nodes: &[MarkupNode]) -> Vec<ElementId> {
        let holder = self.create_element("template");
        self.tree.borrow_mut().build(holder, nodes);
        let children = self.children(holder);
        for &child in &children {
            self.detach(child);
        }
        self.remove(holder);
        children
    }

    /// Append `child` as the last child of `parent`, moving it if attached.
    /// The body never moves.
    pub fn append_child(&self, parent: ElementId, child: ElementId) {
        let mut tree = self.tree.borrow_mut();
        let parent_ok = tree.node(parent).is_some_and(|n| !n.is_text());
        if !parent_ok
            || tree.node(child).is_none()
            || child == parent
            || child == tree.body
            || tree.is_ancestor(child, parent)
        {
            return;
        }
        tree.detach(child);
        if let Some(node) = tree.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(p) = tree.node_mut(parent) {
            p.children.push(child);
        }
    }

    /// Move `node` so it becomes the sibling immediately before `reference`.
    pub fn insert_before(&self, node: ElementId, reference: ElementId) {
        let mut tree = self.tree.borrow_mut();
        if node == reference || node == tree.body || tree.node(node).is_none() {
            return;
        }
        let Some(parent) = tree.node(reference).and_then(|n| n.parent) else {
            return;
        };
        if tree.is_ancestor(node, parent) {
            return;
        }
        tree.detach(node);
        if let Some(node_ref) = tree.node_mut(node) {
            node_ref.parent = Some(parent);
        }
        if let Some(p) = tree.node_mut(parent) {
            let index = p
                .children
                .iter()
                .position(|&c| c == reference)
                .unwrap_or(p.children.len());
            p.children.insert(index, node);
        }
    }

    /// Detach `id` from its parent without destroying it.
    pub fn detach(&self, id: ElementId) {
        self.tree.borrow_mut().detach(id);
    }

    /// Remove `id` and its subtree permanently.
    pub fn remove(&self, id: ElementId) {
        let mut tree = self.tree.borrow_mut();
        if id == tree.body {
            return;
        }
        tree.kill(id);
    }

    /// Remove every child of `id`.
    pub fn empty(&self, id: ElementId) {
        let mut tree = self.tree.borrow_mut();
        let children = tree.node(id).map(|n| n.children.clone()).unwrap_or_default();
        for child in children {
            tree.kill(child);
        }
    }

    // --- Tree queries ---

    /// Whether `id` refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: ElementId) -> bool {
        self.tree.borrow().node(id).is_some()
    }

    /// Whether `id` is attached (transitively) to the body.
    #[must_use]
    pub fn is_connected(&self, id: ElementId) -> bool {
        self.tree.borrow().is_connected(id)
    }

    /// Parent of `id`.
    #[must_use]
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.tree.borrow().node(id).and_then(|n| n.parent)
    }

    /// Children of `id`, in order.
    #[must_use]
    pub fn children(&self, id: ElementId) -> Vec<ElementId> {
        self.tree
            .borrow()
            .node(id)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Element children of `id`, skipping text nodes.
    #[must_use]
    pub fn element_children(&self, id: ElementId) -> Vec<ElementId> {
        let tree = self.tree.borrow();
        tree.node(id)
            .map(|n| {
                n.children
                    .iter()
                    .copied()
                    .filter(|&c| tree.node(c).is_some_and(|c| !c.is_text()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn sibling(&self, id: ElementId, offset: isize) -> Option<ElementId> {
        let tree = self.tree.borrow();
        let parent = tree.node(id)?.parent?;
        let siblings = &tree.node(parent)?.children;
        let index = siblings.iter().position(|&c| c == id)?;
        siblings.get(index.checked_add_signed(offset)?).copied()
    }

    /// The node immediately after `id` in its parent.
    #[must_use]
    pub fn next_sibling(&self, id: ElementId) -> Option<ElementId> {
        self.sibling(id, 1)
    }

    /// The node immediately before `id` in its parent.
    #[must_use]
    pub fn previous_sibling(&self, id: ElementId) -> Option<ElementId> {
        self.sibling(id, -1)
    }

    /// Whether `ancestor` strictly contains `id`.
    #[must_use]
    pub fn contains(&self, ancestor: ElementId, id: ElementId) -> bool {
        self.tree.borrow().is_ancestor(ancestor, id)
    }

    /// Lower-case tag name; `None` for text nodes and dead ids.
    #[must_use]
    pub fn tag_name(&self, id: ElementId) -> Option<String> {
        self.tree
            .borrow()
            .node(id)
            .and_then(|n| n.tag_name().map(str::to_owned))
    }

    // --- Attributes ---

    /// Set an attribute.
    pub fn set_attr(&self, id: ElementId, name: &str, value: &str) {
        if let Some(node) = self.tree.borrow_mut().node_mut(id) {
            node.set_attr(name, value);
        }
    }

    /// Read an attribute.
    #[must_use]
    pub fn attr(&self, id: ElementId, name: &str) -> Option<String> {
        self.tree
            .borrow()
            .node(id)
            .and_then(|n| n.attribute(name).map(str::to_owned))
    }

    /// Remove an attribute.
    pub fn remove_attr(&self, id: ElementId, name: &str) {
        if let Some(node) = self.tree.borrow_mut().node_mut(id) {
            node.remove_attr(name);
        }
    }

    /// Add a class if not already present.
    pub fn add_class(&self, id: ElementId, class: &str) {
        let mut tree = self.tree.borrow_mut();
        let Some(node) = tree.node_mut(id) else {
            return;
        };
        if node.has_class(class) {
            return;
        }
        let mut list: Vec<&str> = node.classes().collect();
        list.push(class);
        let joined = list.join(" ");
        node.set_attr("class", &joined);
    }

    /// Remove a class.
    pub fn remove_class(&self, id: ElementId, class: &str) {
        let mut tree = self.tree.borrow_mut();
        let Some(node) = tree.node_mut(id) else {
            return;
        };
        let joined = node
            .classes()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        node.set_attr("class", &joined);
    }

    /// Whether the element carries `class`.
    #[must_use]
    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.tree.borrow().node(id).is_some_and(|n| n.has_class(class))
    }

    // --- Content ---

    /// Replace the children of `id` with a single text node.
    pub fn set_text(&self, id: ElementId, text: &str) {
        self.empty(id);
        if text.is_empty() {
            return;
        }
        let node = self.create_text(text);
        self.append_child(id, node);
    }

    /// Append markup nodes as children of `id`.
    pub fn append_markup(&self, id: ElementId, nodes: &[MarkupNode]) {
        let mut tree = self.tree.borrow_mut();
        if tree.node(id).is_some_and(|n| !n.is_text()) {
            tree.build(id, nodes);
        }
    }

    /// Replace the children of `id` with parsed markup. Leading text and
    /// character references are allowed; `source` is kept as literal text
    /// only when the parser produces no nodes from it.
    pub fn set_markup(&self, id: ElementId, source: &str) {
        let nodes = markup::parse_fragment(source).unwrap_or_else(|| markup::parse_markup(source));
        if nodes.is_empty() {
            self.set_text(id, source);
            return;
        }
        self.empty(id);
        self.append_markup(id, &nodes);
    }

    /// Concatenated text of `id` and its descendants.
    #[must_use]
    pub fn inner_text(&self, id: ElementId) -> String {
        let mut out = String::new();
        self.tree.borrow().text_content(id, &mut out);
        out
    }

    /// Serialised markup of the children of `id`.
    #[must_use]
    pub fn inner_html(&self, id: ElementId) -> String {
        let tree = self.tree.borrow();
        let nodes: Vec<MarkupNode> = tree
            .node(id)
            .map(|n| n.children.iter().filter_map(|&c| tree.to_markup(c)).collect())
            .unwrap_or_default();
        markup::serialize(&nodes)
    }

    // --- Style & visibility ---

    /// Snapshot of the element style.
    #[must_use]
    pub fn style(&self, id: ElementId) -> Style {
        self.tree
            .borrow()
            .node(id)
            .map(|n| n.style.clone())
            .unwrap_or_default()
    }

    /// Mutate the element style in place.
    pub fn update_style(&self, id: ElementId, f: impl FnOnce(&mut Style)) {
        if let Some(node) = self.tree.borrow_mut().node_mut(id) {
            f(&mut node.style);
        }
    }

    /// Display the element immediately, cancelling any fade.
    pub fn show(&self, id: ElementId) {
        self.update_style(id, |s| {
            s.display = Display::Block;
            s.fade = None;
        });
    }

    /// Hide the element immediately.
    pub fn hide(&self, id: ElementId) {
        self.update_style(id, |s| {
            s.display = Display::None;
            s.fade = None;
        });
    }

    /// Display the element, fading its opacity in over `duration`.
    pub fn fade_in(&self, id: ElementId, duration: Duration) {
        let started = Instant::now();
        self.update_style(id, |s| {
            s.display = Display::Block;
            s.fade = Some(FadeIn { started, duration });
        });
    }

    /// Whether the element's own display is not `none`.
    #[must_use]
    pub fn is_displayed(&self, id: ElementId) -> bool {
        self.tree
            .borrow()
            .node(id)
            .is_some_and(|n| n.style.display != Display::None)
    }

    /// Whether the element is rendered: alive, connected to the body, and
    /// neither it nor any ancestor is hidden.
    #[must_use]
    pub fn is_visible(&self, id: ElementId) -> bool {
        let tree = self.tree.borrow();
        if !tree.is_connected(id) {
            return false;
        }
        std::iter::once(id)
            .chain(tree.ancestors(id))
            .all(|a| tree.node(a).is_some_and(|n| n.style.display != Display::None))
    }

    /// Current opacity: `0.0` when hidden, fade progress while fading.
    #[must_use]
    pub fn opacity(&self, id: ElementId) -> f32 {
        let style = self.style(id);
        if style.display == Display::None || !self.is_alive(id) {
            return 0.0;
        }
        style.fade.map_or(1.0, |fade| fade.opacity_at(Instant::now()))
    }

    // --- Focus ---

    /// Move keyboard focus to `id`.
    pub fn focus(&self, id: ElementId) {
        let mut tree = self.tree.borrow_mut();
        if tree.node(id).is_some() {
            tree.focused = Some(id);
        }
    }

    /// Clear keyboard focus.
    pub fn blur(&self) {
        self.tree.borrow_mut().focused = None;
    }

    /// Currently focused element.
    #[must_use]
    pub fn focused(&self) -> Option<ElementId> {
        self.tree.borrow().focused
    }

    // --- Selectors ---

    /// Whether `id` matches `selector`.
    #[must_use]
    pub fn matches(&self, id: ElementId, selector: &Selector) -> bool {
        self.tree.borrow().matches(id, selector)
    }

    /// Connected elements matching `selector`, in document order.
    #[must_use]
    pub fn query(&self, selector: &Selector) -> Vec<ElementId> {
        let body = self.body();
        let mut out = self.query_within(body, selector);
        if self.matches(body, selector) {
            out.insert(0, body);
        }
        out
    }

    /// Descendants of `root` matching `selector`, in document order.
    #[must_use]
    pub fn query_within(&self, root: ElementId, selector: &Selector) -> Vec<ElementId> {
        let tree = self.tree.borrow();
        tree.subtree(root)
            .into_iter()
            .skip(1)
            .filter(|&id| tree.matches(id, selector))
            .collect()
    }

    /// First descendant of `root` matching `selector`.
    #[must_use]
    pub fn find(&self, root: ElementId, selector: &Selector) -> Option<ElementId> {
        self.query_within(root, selector).into_iter().next()
    }

    // --- Layout ---

    /// Laid-out size of `id`.
    #[must_use]
    pub fn measure(&self, id: ElementId) -> Size {
        self.tree.borrow().measure(id)
    }

    /// Position and size of `id`.
    #[must_use]
    pub fn rect(&self, id: ElementId) -> Rect {
        let style = self.style(id);
        Rect::from_parts(Point::new(style.left, style.top), self.measure(id))
    }

    // --- Listeners ---

    /// Register `handler` under an `event.namespace` spec.
    pub fn on(&self, target: Target, spec: &str, handler: Handler) {
        let added = self.tree.borrow_mut().listeners.add(target, spec, handler);
        if !added {
            #[cfg(feature = "tracing")]
            tracing::warn!(spec, "listener spec names no event; ignored");
        }
    }

    /// Remove listeners covered by `spec`. Returns how many were removed.
    pub fn off(&self, target: Target, spec: &str) -> usize {
        self.tree.borrow_mut().listeners.remove(target, spec)
    }

    /// Number of listeners registered on `target`.
    #[must_use]
    pub fn listener_count(&self, target: Target) -> usize {
        self.tree.borrow().listeners.count(target)
    }

    /// Dispatch `event`, bubbling from its target through every ancestor and
    /// finally to the document.
    pub fn dispatch(&self, event: Event) {
        let path: Vec<Target> = {
            let tree = self.tree.borrow();
            match event.target().filter(|&t| tree.node(t).is_some()) {
                Some(target) => std::iter::once(target)
                    .chain(tree.ancestors(target))
                    .map(Target::Element)
                    .chain(std::iter::once(Target::Document))
                    .collect(),
                None => vec![Target::Document],
            }
        };
        #[cfg(feature = "tracing")]
        tracing::trace!(event = event.name(), depth = path.len(), "dispatch");
        for target in path {
            let handlers = self.tree.borrow().listeners.snapshot(target, event.name());
            for handler in handlers {
                handler(&event, target);
            }
        }
    }

    /// Click `id` with the primary button.
    pub fn click(&self, id: ElementId) {
        self.dispatch(Event::Click {
            target: id,
            button: MouseButton::Left,
        });
    }

    /// Dispatch a key press on `target`, or on the focused element when
    /// `target` is `None`.
    pub fn key_down(&self, target: Option<ElementId>, code: KeyCode) {
        let target = target.or_else(|| self.focused());
        self.dispatch(Event::Key {
            target,
            key: KeyEvent::new(code),
        });
    }

    /// Dispatch a key release on `target`, or on the focused element when
    /// `target` is `None`.
    pub fn key_up(&self, target: Option<ElementId>, code: KeyCode) {
        let target = target.or_else(|| self.focused());
        self.dispatch(Event::Key {
            target,
            key: KeyEvent::new(code).released(),
        });
    }

    /// Press and release `code`.
    pub fn key_press(&self, target: Option<ElementId>, code: KeyCode) {
        self.key_down(target, code);
        self.key_up(target, code);
    }
}
