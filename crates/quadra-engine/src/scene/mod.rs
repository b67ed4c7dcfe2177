//! Scene model.
//!
//! Responsibilities:
//! - own drawable nodes and their derived geometry
//! - partition nodes into ordered buckets, one per [`NodeKind`]
//! - carry the projection and camera transforms shared by a frame

mod kind;
mod node;
#[allow(clippy::module_inception)]
mod scene;

pub use kind::NodeKind;
pub use node::{GeometryMode, Node, NodeId, DEFAULT_NODE_COLOR, GEOMETRY_LEN, VERTEX_COUNT};
pub use scene::{Scene, DEFAULT_SCENE_COLOR};
