use std::collections::BTreeSet;

use crate::{
    geometry::Point,
    identifier::Id,
    model::{Level, NodeKind},
};

/// Optional size overrides for a node.
///
/// An explicit `width` or `height` wins over the measured value. When only
/// one dimension is given together with `aspect` (width / height), the other
/// dimension is derived from it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SizeHint {
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub aspect: Option<f32>,
}

impl SizeHint {
    pub fn is_empty(&self) -> bool {
        self.width.is_none() && self.height.is_none() && self.aspect.is_none()
    }
}

/// An element of the architecture model.
///
/// # Examples
///
/// ```
/// # use c4_layout_core::{identifier::Id, model::{Level, Node, NodeKind}};
/// let shop = Id::new("shop").unwrap();
/// let api = Node::new(Id::new("api").unwrap(), "API", NodeKind::Container)
///     .with_parent(shop)
///     .with_technology("Rust")
///     .with_tag("internal");
///
/// assert_eq!(api.level(), Level::Container);
/// assert_eq!(api.parent(), Some(shop));
/// assert!(api.has_tag("internal"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: Id,
    label: String,
    kind: NodeKind,
    level: Level,
    parent: Option<Id>,
    description: Option<String>,
    technology: Option<String>,
    tags: BTreeSet<String>,
    size_hint: SizeHint,
    priority: i32,
    hidden: bool,
    pinned: Option<Point>,
    collapse_children: bool,
    sort_key: Option<String>,
}

impl Node {
    /// Creates a node whose level defaults from its kind.
    pub fn new(id: Id, label: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id,
            label: label.into(),
            kind,
            level: kind.default_level(),
            parent: None,
            description: None,
            technology: None,
            tags: BTreeSet::new(),
            size_hint: SizeHint::default(),
            priority: 0,
            hidden: false,
            pinned: None,
            collapse_children: false,
            sort_key: None,
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_parent(mut self, parent: Id) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_technology(mut self, technology: impl Into<String>) -> Self {
        self.technology = Some(technology.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_size_hint(mut self, size_hint: SizeHint) -> Self {
        self.size_hint = size_hint;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Pins the node's top-left corner. Honored for root-level nodes.
    pub fn with_pinned(mut self, position: Point) -> Self {
        self.pinned = Some(position);
        self
    }

    pub fn with_collapse_children(mut self, collapse: bool) -> Self {
        self.collapse_children = collapse;
        self
    }

    pub fn with_sort_key(mut self, sort_key: impl Into<String>) -> Self {
        self.sort_key = Some(sort_key.into());
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn parent(&self) -> Option<Id> {
        self.parent
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn technology(&self) -> Option<&str> {
        self.technology.as_deref()
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn size_hint(&self) -> SizeHint {
        self.size_hint
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn pinned(&self) -> Option<Point> {
        self.pinned
    }

    pub fn collapse_children(&self) -> bool {
        self.collapse_children
    }

    pub fn sort_key(&self) -> Option<&str> {
        self.sort_key.as_deref()
    }

    /// Key used to order siblings after priority: the sort key if set, else the label.
    pub fn ordering_key(&self) -> &str {
        self.sort_key.as_deref().unwrap_or(&self.label)
    }
}
