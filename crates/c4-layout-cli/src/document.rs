//! The TOML graph document read by the CLI.
//!
//! ```toml
//! [metadata]
//! title = "Internet Banking"
//!
//! [[node]]
//! id = "banking"
//! label = "Internet Banking System"
//! kind = "system"
//!
//! [[node]]
//! id = "api"
//! label = "API Application"
//! kind = "container"
//! parent = "banking"
//!
//! [[relationship]]
//! id = "reads"
//! from = "api"
//! to = "banking"
//! ```

use std::collections::BTreeMap;

use log::debug;
use serde::Deserialize;

use c4_layout::{
    geometry::Point,
    model::{Graph, InteractionKind, Level, Node, NodeKind, Relationship, RoutingHint, SizeHint},
};
use c4_layout_core::error::ValidationError;

use crate::error::CliError;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Document {
    pub metadata: BTreeMap<String, String>,
    #[serde(rename = "node")]
    pub nodes: Vec<NodeEntry>,
    #[serde(rename = "relationship")]
    pub relationships: Vec<RelationshipEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct NodeEntry {
    pub id: String,
    pub label: Option<String>,
    pub kind: NodeKind,
    pub level: Option<Level>,
    pub parent: Option<String>,
    pub description: Option<String>,
    pub technology: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub aspect: Option<f32>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub hidden: bool,
    /// Top-left corner as `[x, y]`.
    pub pinned: Option<[f32; 2]>,
    #[serde(default)]
    pub collapse: bool,
    pub sort_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RelationshipEntry {
    pub id: String,
    pub from: String,
    pub to: String,
    pub label: Option<String>,
    pub technology: Option<String>,
    #[serde(default)]
    pub interaction: InteractionKind,
    #[serde(default)]
    pub routing: RoutingHint,
    #[serde(default)]
    pub avoid: Vec<String>,
    #[serde(default)]
    pub z_index: i32,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Document {
    /// Parses a document from TOML source.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Document`] with the offending span for malformed
    /// TOML, unknown keys or unknown kinds.
    pub fn parse(src: &str) -> Result<Self, CliError> {
        let document: Document =
            toml::from_str(src).map_err(|err| CliError::new_document_error(err, src))?;
        debug!(
            nodes = document.nodes.len(),
            relationships = document.relationships.len();
            "Graph document parsed",
        );
        Ok(document)
    }

    /// Validates the document into a [`Graph`].
    ///
    /// Entries with malformed ids are skipped while the builder records the
    /// violation, so every problem is reported at once.
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] listing every violation.
    pub fn into_graph(self) -> Result<Graph, ValidationError> {
        let mut builder = Graph::builder();
        for (key, value) in self.metadata {
            builder.with_metadata(key, value);
        }

        for entry in self.nodes {
            let Some(id) = builder.id(&entry.id) else {
                continue;
            };
            let mut node = Node::new(id, entry.label.unwrap_or(entry.id), entry.kind)
                .with_tags(entry.tags)
                .with_priority(entry.priority)
                .with_hidden(entry.hidden)
                .with_collapse_children(entry.collapse)
                .with_size_hint(SizeHint {
                    width: entry.width,
                    height: entry.height,
                    aspect: entry.aspect,
                });
            if let Some(level) = entry.level {
                node = node.with_level(level);
            }
            if let Some(parent) = entry.parent.as_deref().and_then(|p| builder.id(p)) {
                node = node.with_parent(parent);
            }
            if let Some(description) = entry.description {
                node = node.with_description(description);
            }
            if let Some(technology) = entry.technology {
                node = node.with_technology(technology);
            }
            if let Some([x, y]) = entry.pinned {
                node = node.with_pinned(Point::new(x, y));
            }
            if let Some(sort_key) = entry.sort_key {
                node = node.with_sort_key(sort_key);
            }
            builder.add_node(node);
        }

        for entry in self.relationships {
            let (Some(id), Some(from), Some(to)) = (
                builder.id(&entry.id),
                builder.id(&entry.from),
                builder.id(&entry.to),
            ) else {
                continue;
            };
            let mut rel = Relationship::new(id, from, to)
                .with_interaction(entry.interaction)
                .with_routing(entry.routing)
                .with_z_index(entry.z_index);
            if let Some(label) = entry.label {
                rel = rel.with_label(label);
            }
            if let Some(technology) = entry.technology {
                rel = rel.with_technology(technology);
            }
            for avoid in &entry.avoid {
                if let Some(node) = builder.id(avoid) {
                    rel = rel.with_avoid(node);
                }
            }
            for tag in entry.tags {
                rel = rel.with_tag(tag);
            }
            builder.add_relationship(rel);
        }

        builder.build()
    }
}
