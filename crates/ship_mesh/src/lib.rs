//! Polygonal mesh model for procedural hulls.
//!
//! Vertices and faces live in arenas; faces are addressed by generation-checked
//! [`FaceId`] handles so a deleted face can never be mistaken for a live one.
//! Every editing operation keeps face loops valid and the surface closed.

pub mod bevel;
pub mod export;
pub mod material;
pub mod mesh;
pub mod mirror;
pub mod obj;
pub mod ops;
pub mod tags;

pub use bevel::*;
pub use export::*;
pub use material::*;
pub use mesh::*;
pub use mirror::*;
pub use obj::*;
pub use ops::*;
pub use tags::*;
