//! Core types of the operation graph
//!
//! This module contains the fundamental types:
//! - `OpCode` / `ChainOp` / `CompareOp` - operation kinds
//! - `Node` / `Argument` / `NodeId` - graph nodes and edges
//! - `Graph` - the arena owning every node of a handler
//! - construction-time folding and identity rules

pub(crate) mod graph;
pub(crate) mod node;
pub(crate) mod opcode;
pub(crate) mod rules;

pub use graph::Graph;
pub use node::{Argument, Node, NodeId};
pub use opcode::{ChainOp, CompareOp, OpCode};
