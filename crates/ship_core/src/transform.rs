//! Transform and utilities for face-local positioning.
//!
//! Surface details are placed in the frame of the face they grow from:
//! local `X` runs along the face's first edge, local `Z` is the outward
//! normal and local `Y` completes the right-handed basis.

use glam::{Mat3, Quat, Vec3};

/// A 3D transform representing position, rotation, and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform with position and rotation.
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Build a frame from an origin, a tangent hint and a normal.
    ///
    /// The tangent is orthonormalised against the normal; if it is parallel
    /// to the normal (or zero) any perpendicular direction is used instead.
    pub fn from_normal_tangent(origin: Vec3, normal: Vec3, tangent: Vec3) -> Self {
        let z = normal.normalize_or_zero();
        let z = if z == Vec3::ZERO { Vec3::Z } else { z };
        let mut x = (tangent - z * tangent.dot(z)).normalize_or_zero();
        if x == Vec3::ZERO {
            x = z.any_orthonormal_vector();
        }
        let y = z.cross(x);
        Self::from_position_rotation(origin, Quat::from_mat3(&Mat3::from_cols(x, y, z)))
    }

    /// Local `X` axis (along the face's first edge).
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Local `Y` axis.
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Local `Z` axis (the face normal).
    pub fn normal(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Map a local point into world space.
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * (local * self.scale)
    }

    /// Map a world point into local space.
    pub fn inverse_transform_point(&self, world: Vec3) -> Vec3 {
        (self.rotation.inverse() * (world - self.position)) / self.scale
    }
}
