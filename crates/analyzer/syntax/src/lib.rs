//! # VLS Syntax Surface
//!
//! This crate defines the syntax-tree surface the semantic analyzer consumes:
//! source text with byte/point conversions, the closed set of node and field
//! tags, and an arena-backed tree with lightweight cursors.
//!
//! The real parser is an external collaborator. It feeds trees through
//! [`TreeBuilder`], which is also what the semantic test suites use to build
//! fixtures without a grammar.

pub mod node;
pub mod source;

pub use node::{Field, Node, NodeId, NodeKind, SyntaxTree, TreeBuilder};
pub use source::{Point, Range, SourceText};
