//! Procedural spaceship generation.
//!
//! The pipeline runs strictly in order, every stage mutating the same mesh:
//! hull builder, asymmetry pass, face classifier, detail generator, then
//! symmetry and finishing. All randomness comes from the two seeded streams
//! of [`ship_core::RandomStreams`], so a config always yields the same ship.

pub mod asymmetry;
pub mod classify;
pub mod config;
pub mod detail;
pub mod finishing;
pub mod hull;
pub mod palette;
pub mod pipeline;

pub use asymmetry::*;
pub use classify::*;
pub use config::*;
pub use detail::*;
pub use finishing::*;
pub use hull::*;
pub use palette::*;
pub use pipeline::*;
