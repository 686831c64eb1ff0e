//! # Scene Management Module
//!
//! The live 3D scene: a graph of tagged nodes, their transforms and the
//! render-resource handles they own.
//!
//! ## Key Components
//!
//! - [`SceneGraph`] - Owns the render group, the ground node and the light rig
//! - [`SceneNode`] - Transform, optional mesh and children
//! - [`NodeKind`] - `Placed`, `Ghost`, `Outline`, `Ground` or `Part`
//! - [`Vertex3D`] - Vertex layout shared by every mesh
//!
//! Nodes never free their resources on drop; removal goes through
//! [`SceneGraph::remove_node`] or [`SceneNode::dispose`] with the backend that
//! allocated them.

pub mod graph;
pub mod node;
pub mod vertex;

// Re-export main types
pub use graph::{LightRig, SceneGraph};
pub use node::{MeshPart, NodeId, NodeKind, SceneNode, Transform};
pub use vertex::Vertex3D;
