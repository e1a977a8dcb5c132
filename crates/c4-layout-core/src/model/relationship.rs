use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::identifier::Id;

/// Preferred routing style for a relationship.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutingHint {
    /// Use the configured default style.
    #[default]
    Auto,
    Orthogonal,
    Spline,
    Straight,
}

/// How the two ends of a relationship communicate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionKind {
    #[default]
    Unspecified,
    Sync,
    Async,
    DataFlow,
}

/// A directed connection between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    id: Id,
    from: Id,
    to: Id,
    label: Option<String>,
    technology: Option<String>,
    interaction: InteractionKind,
    routing: RoutingHint,
    avoid: Vec<Id>,
    z_index: i32,
    tags: BTreeSet<String>,
}

impl Relationship {
    pub fn new(id: Id, from: Id, to: Id) -> Self {
        Self {
            id,
            from,
            to,
            label: None,
            technology: None,
            interaction: InteractionKind::default(),
            routing: RoutingHint::default(),
            avoid: Vec::new(),
            z_index: 0,
            tags: BTreeSet::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_technology(mut self, technology: impl Into<String>) -> Self {
        self.technology = Some(technology.into());
        self
    }

    pub fn with_interaction(mut self, interaction: InteractionKind) -> Self {
        self.interaction = interaction;
        self
    }

    pub fn with_routing(mut self, routing: RoutingHint) -> Self {
        self.routing = routing;
        self
    }

    /// Adds a node the routed path should keep extra distance from.
    pub fn with_avoid(mut self, node: Id) -> Self {
        self.avoid.push(node);
        self
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn from(&self) -> Id {
        self.from
    }

    pub fn to(&self) -> Id {
        self.to
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn technology(&self) -> Option<&str> {
        self.technology.as_deref()
    }

    /// Label text as rendered on the edge: label then `[technology]`.
    pub fn display_label(&self) -> Option<String> {
        match (self.label.as_deref(), self.technology.as_deref()) {
            (None, None) => None,
            (Some(label), None) => Some(label.to_string()),
            (None, Some(tech)) => Some(format!("[{tech}]")),
            (Some(label), Some(tech)) => Some(format!("{label}\n[{tech}]")),
        }
    }

    pub fn interaction(&self) -> InteractionKind {
        self.interaction
    }

    pub fn routing(&self) -> RoutingHint {
        self.routing
    }

    pub fn avoid(&self) -> &[Id] {
        &self.avoid
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> Id {
        Id::new(s).unwrap()
    }

    #[test]
    fn test_display_label_combinations() {
        let base = Relationship::new(id("r"), id("a"), id("b"));
        assert_eq!(base.display_label(), None);
        assert_eq!(
            base.clone().with_label("Reads").display_label().as_deref(),
            Some("Reads")
        );
        assert_eq!(
            base.clone().with_technology("SQL").display_label().as_deref(),
            Some("[SQL]")
        );
        assert_eq!(
            base.with_label("Reads").with_technology("SQL").display_label().as_deref(),
            Some("Reads\n[SQL]")
        );
    }

    #[test]
    fn test_self_loop() {
        assert!(Relationship::new(id("r"), id("a"), id("a")).is_self_loop());
        assert!(!Relationship::new(id("r"), id("a"), id("b")).is_self_loop());
    }
}
