use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// The C4 element type of a node.
///
/// Declaration order is the sort order used wherever nodes are grouped by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Person,
    System,
    Container,
    Component,
    DeploymentNode,
    Database,
    Queue,
    Topic,
    Cache,
    #[serde(rename = "filesystem")]
    FileSystem,
    ExternalPerson,
    ExternalSystem,
    ExternalContainer,
    ExternalComponent,
    ExternalDatabase,
    BoundaryEnterprise,
    BoundarySystem,
    BoundaryContainer,
}

impl NodeKind {
    pub const ALL: [NodeKind; 18] = [
        NodeKind::Person,
        NodeKind::System,
        NodeKind::Container,
        NodeKind::Component,
        NodeKind::DeploymentNode,
        NodeKind::Database,
        NodeKind::Queue,
        NodeKind::Topic,
        NodeKind::Cache,
        NodeKind::FileSystem,
        NodeKind::ExternalPerson,
        NodeKind::ExternalSystem,
        NodeKind::ExternalContainer,
        NodeKind::ExternalComponent,
        NodeKind::ExternalDatabase,
        NodeKind::BoundaryEnterprise,
        NodeKind::BoundarySystem,
        NodeKind::BoundaryContainer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Person => "person",
            NodeKind::System => "system",
            NodeKind::Container => "container",
            NodeKind::Component => "component",
            NodeKind::DeploymentNode => "deployment-node",
            NodeKind::Database => "database",
            NodeKind::Queue => "queue",
            NodeKind::Topic => "topic",
            NodeKind::Cache => "cache",
            NodeKind::FileSystem => "filesystem",
            NodeKind::ExternalPerson => "external-person",
            NodeKind::ExternalSystem => "external-system",
            NodeKind::ExternalContainer => "external-container",
            NodeKind::ExternalComponent => "external-component",
            NodeKind::ExternalDatabase => "external-database",
            NodeKind::BoundaryEnterprise => "boundary-enterprise",
            NodeKind::BoundarySystem => "boundary-system",
            NodeKind::BoundaryContainer => "boundary-container",
        }
    }

    /// Returns true for kinds whose children are laid out inside them.
    pub fn is_container_kind(self) -> bool {
        matches!(
            self,
            NodeKind::System
                | NodeKind::Container
                | NodeKind::DeploymentNode
                | NodeKind::ExternalSystem
                | NodeKind::ExternalContainer
                | NodeKind::BoundaryEnterprise
                | NodeKind::BoundarySystem
                | NodeKind::BoundaryContainer
        )
    }

    pub fn is_external(self) -> bool {
        matches!(
            self,
            NodeKind::ExternalPerson
                | NodeKind::ExternalSystem
                | NodeKind::ExternalContainer
                | NodeKind::ExternalComponent
                | NodeKind::ExternalDatabase
        )
    }

    pub fn is_person(self) -> bool {
        matches!(self, NodeKind::Person | NodeKind::ExternalPerson)
    }

    /// Systems and the boundaries that group systems.
    pub fn is_system_like(self) -> bool {
        matches!(
            self,
            NodeKind::System
                | NodeKind::ExternalSystem
                | NodeKind::BoundarySystem
                | NodeKind::BoundaryEnterprise
        )
    }

    /// Containers and the boundaries that group containers.
    pub fn is_container_like(self) -> bool {
        matches!(
            self,
            NodeKind::Container | NodeKind::ExternalContainer | NodeKind::BoundaryContainer
        )
    }

    /// Datastores and messaging infrastructure.
    pub fn is_infrastructure(self) -> bool {
        matches!(
            self,
            NodeKind::Database
                | NodeKind::Queue
                | NodeKind::Topic
                | NodeKind::Cache
                | NodeKind::FileSystem
                | NodeKind::ExternalDatabase
        )
    }

    /// The C4 level a node of this kind belongs to unless stated otherwise.
    pub fn default_level(self) -> Level {
        match self {
            NodeKind::BoundaryEnterprise => Level::Landscape,
            NodeKind::Person
            | NodeKind::ExternalPerson
            | NodeKind::System
            | NodeKind::ExternalSystem
            | NodeKind::BoundarySystem => Level::Context,
            NodeKind::Container
            | NodeKind::ExternalContainer
            | NodeKind::BoundaryContainer
            | NodeKind::Database
            | NodeKind::ExternalDatabase
            | NodeKind::Queue
            | NodeKind::Topic
            | NodeKind::Cache
            | NodeKind::FileSystem => Level::Container,
            NodeKind::Component | NodeKind::ExternalComponent => Level::Component,
            NodeKind::DeploymentNode => Level::Deployment,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown node kind `{s}`"))
    }
}

/// C4 abstraction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Level {
    Landscape,
    Context,
    Container,
    Component,
    Deployment,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Landscape => "landscape",
            Level::Context => "context",
            Level::Container => "container",
            Level::Component => "component",
            Level::Deployment => "deployment",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in NodeKind::ALL {
            assert_eq!(kind.as_str().parse::<NodeKind>(), Ok(kind));
        }
        assert!("widget".parse::<NodeKind>().is_err());
    }

    #[test]
    fn test_container_kinds() {
        let containers: Vec<_> = NodeKind::ALL
            .into_iter()
            .filter(|k| k.is_container_kind())
            .collect();
        assert_eq!(containers.len(), 8);
        assert!(!NodeKind::Database.is_container_kind());
        assert!(!NodeKind::Component.is_container_kind());
        assert!(!NodeKind::Person.is_container_kind());
    }

    #[test]
    fn test_default_levels() {
        assert_eq!(NodeKind::Person.default_level(), Level::Context);
        assert_eq!(NodeKind::Queue.default_level(), Level::Container);
        assert_eq!(NodeKind::ExternalComponent.default_level(), Level::Component);
        assert_eq!(NodeKind::BoundaryEnterprise.default_level(), Level::Landscape);
        assert_eq!(NodeKind::DeploymentNode.default_level(), Level::Deployment);
    }

    #[test]
    fn test_system_and_container_like_are_disjoint() {
        for kind in NodeKind::ALL {
            assert!(!(kind.is_system_like() && kind.is_container_like()), "{kind}");
        }
    }
}
