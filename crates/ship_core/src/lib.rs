//! Core types shared by every spaceship generation stage.
//!
//! This crate provides the foundational pieces the mesh model and the
//! generation pipeline are built on:
//! - Seeded random streams (geometry and material, advanced independently)
//! - The error type every fallible operation returns
//! - Face-local transforms used to place surface details

pub mod error;
pub mod random;
pub mod transform;

pub use error::*;
pub use random::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{Mat3, Quat, Vec2, Vec3};
