//! C4 Layout Core Types and Definitions
//!
//! This crate provides the foundational types for laying out C4 architecture
//! diagrams. It includes:
//!
//! - **Identifiers**: Validated, string-interned identifiers ([`identifier::Id`])
//! - **Geometry**: Basic geometric types ([`geometry`] module)
//! - **Model**: Nodes, relationships and the validated [`model::Graph`]
//! - **View**: Filters and focus projections over a graph ([`view`] module)
//! - **Errors**: Graph validation failures with stable codes ([`error`] module)

pub mod error;
pub mod geometry;
pub mod identifier;
pub mod model;
pub mod view;
