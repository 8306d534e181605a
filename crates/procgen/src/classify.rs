//! Face classification: orientation and exposure of every face, used to decide
//! which detail (if any) grows from it.

use crate::config::Tuning;
use glam::Vec3;
use ship_core::ShipResult;
use ship_mesh::{FaceId, Mesh, AREA_EPSILON};

/// Offset of the exposure ray origin above the face, so the face itself is
/// never hit.
const RAY_OFFSET: f32 = 1e-3;

/// Coarse direction a face points in. `+X` is forward, `+Y` left, `+Z` up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Forward,
    Rear,
    Left,
    Right,
    Top,
    Bottom,
}

impl Orientation {
    /// Classify a unit normal. `sin(dead_zone)` is added to `|n.z|` before it
    /// is compared with the horizontal components; ties go to `Top`.
    pub fn from_normal(normal: Vec3, dead_zone: f32) -> Self {
        let a = normal.abs();
        if a.z + dead_zone.sin() >= a.x.max(a.y) {
            if normal.z >= 0.0 {
                Orientation::Top
            } else {
                Orientation::Bottom
            }
        } else if a.x >= a.y {
            if normal.x >= 0.0 {
                Orientation::Forward
            } else {
                Orientation::Rear
            }
        } else if normal.y >= 0.0 {
            Orientation::Left
        } else {
            Orientation::Right
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FaceInfo {
    pub id: FaceId,
    pub normal: Vec3,
    pub centroid: Vec3,
    pub area: f32,
    pub aspect: f32,
    pub orientation: Orientation,
    /// Nothing else lies in front of the face within the probe distance.
    pub exposed: bool,
    /// The normal points away from the centre of the mesh bounds.
    pub outward: bool,
}

#[derive(Debug, Clone, Copy)]
struct Triangle {
    face: usize,
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
}

/// Möller–Trumbore ray/triangle test, hits closer than `max_dist` only.
fn ray_hits_triangle(origin: Vec3, dir: Vec3, tri: &Triangle, max_dist: f32) -> bool {
    let edge1 = tri.v1 - tri.v0;
    let edge2 = tri.v2 - tri.v0;
    let h = dir.cross(edge2);
    let a = edge1.dot(h);

    if a.abs() < 0.00001 {
        return false;
    }

    let f = 1.0 / a;
    let s = origin - tri.v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return false;
    }

    let q = s.cross(edge1);
    let v = f * dir.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return false;
    }

    let t = f * edge2.dot(q);
    t > 0.0 && t < max_dist
}

/// Classify every live face, in face order.
pub fn classify_faces(mesh: &Mesh, tuning: &Tuning) -> ShipResult<Vec<FaceInfo>> {
    let dead_zone = tuning.dead_zone_degrees.to_radians();
    let center = match mesh.bounds() {
        Some((min, max)) => (min + max) * 0.5,
        None => Vec3::ZERO,
    };

    let ids = mesh.face_ids();
    let mut triangles = Vec::new();
    for (index, id) in ids.iter().enumerate() {
        let points = mesh.loop_points(*id)?;
        for i in 1..points.len() - 1 {
            triangles.push(Triangle {
                face: index,
                v0: points[0],
                v1: points[i],
                v2: points[i + 1],
            });
        }
    }

    let mut infos = Vec::with_capacity(ids.len());
    for (index, &id) in ids.iter().enumerate() {
        let normal = mesh.normal(id)?;
        let centroid = mesh.centroid(id)?;
        let area = mesh.area(id)?;

        let exposed = area > AREA_EPSILON && {
            let origin = centroid + normal * RAY_OFFSET;
            !triangles
                .iter()
                .filter(|tri| tri.face != index)
                .any(|tri| ray_hits_triangle(origin, normal, tri, tuning.exposure_probe_distance))
        };

        infos.push(FaceInfo {
            id,
            normal,
            centroid,
            area,
            aspect: mesh.aspect_ratio(id)?,
            orientation: Orientation::from_normal(normal, dead_zone),
            exposed,
            outward: normal.dot(centroid - center) > 0.0,
        });
    }

    log::debug!(
        "classify: {} faces, {} exposed",
        infos.len(),
        infos.iter().filter(|info| info.exposed).count()
    );
    Ok(infos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ship_mesh::Extrusion;

    #[test]
    fn box_faces_get_their_axis() {
        let mut mesh = Mesh::new();
        let faces = mesh.add_box(Vec3::new(2.0, 1.0, 1.0)).unwrap();
        let infos = classify_faces(&mesh, &Tuning::default()).unwrap();
        let orientations: Vec<Orientation> = infos.iter().map(|info| info.orientation).collect();
        assert_eq!(
            orientations,
            [
                Orientation::Forward,
                Orientation::Rear,
                Orientation::Left,
                Orientation::Right,
                Orientation::Top,
                Orientation::Bottom
            ]
        );
        assert!(infos.iter().all(|info| info.exposed && info.outward));
        assert_eq!(infos[0].id, faces[0]);
        assert!((infos[0].aspect - 1.0).abs() < 1e-5);
        assert!((infos[2].aspect - 2.0).abs() < 1e-5);
    }

    #[test]
    fn dead_zone_favours_vertical() {
        let dead_zone = 20f32.to_radians();
        // sin 35 + sin 20 clears cos 35, so the face tips over to Top
        let tilted = Vec3::new(35f32.to_radians().cos(), 0.0, 35f32.to_radians().sin());
        assert_eq!(Orientation::from_normal(tilted, dead_zone), Orientation::Top);
        // sin 30 + sin 20 falls short of cos 30
        let steep = Vec3::new(30f32.to_radians().cos(), 0.0, 30f32.to_radians().sin());
        assert_eq!(Orientation::from_normal(steep, dead_zone), Orientation::Forward);
        assert_eq!(Orientation::from_normal(steep, 0.0), Orientation::Forward);
        let shallow = Vec3::new(5f32.to_radians().cos(), 0.0, -5f32.to_radians().sin());
        assert_eq!(Orientation::from_normal(shallow, dead_zone), Orientation::Forward);
        assert_eq!(Orientation::from_normal(Vec3::NEG_Y, 0.0), Orientation::Right);
        let diagonal = Vec3::new(0.0, 1.0, 1.0).normalize();
        assert_eq!(Orientation::from_normal(diagonal, 0.0), Orientation::Top);
    }

    #[test]
    fn faces_facing_a_wall_are_hidden() {
        let mut mesh = Mesh::new();
        let faces = mesh.add_box(Vec3::ONE).unwrap();
        // A narrow stalk off the top, then a wide cap that hangs over the box
        let stalk = mesh.extrude(faces[4], Extrusion::along(0.1).uniform(0.2)).unwrap();
        let neck = mesh.extrude(stalk.top, Extrusion::along(0.2)).unwrap();
        let cap = mesh.extrude(neck.top, Extrusion::default().uniform(8.0)).unwrap();
        mesh.extrude(cap.top, Extrusion::along(0.1)).unwrap();

        let infos = classify_faces(&mesh, &Tuning::default()).unwrap();
        let info = |id: FaceId| infos.iter().find(|info| info.id == id).unwrap().clone();
        // The rim around the stalk looks straight up into the underside of the cap
        let rim = stalk.sides[0];
        assert_eq!(info(rim).orientation, Orientation::Top);
        assert!(!info(rim).exposed);
        assert!(info(faces[0]).exposed);
        assert!(info(faces[5]).exposed);
    }

    #[test]
    fn degenerate_faces_are_unexposed() {
        let mut mesh = Mesh::new();
        let faces = mesh.add_box(Vec3::ONE).unwrap();
        // A zero-height extrusion leaves zero-area side walls
        let out = mesh.extrude(faces[0], Extrusion::default()).unwrap();
        let infos = classify_faces(&mesh, &Tuning::default()).unwrap();
        for side in out.sides {
            let info = infos.iter().find(|info| info.id == side).unwrap();
            assert!(!info.exposed);
        }
    }
}
