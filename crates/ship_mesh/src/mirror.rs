//! Mirror-merge across a principal plane.

use crate::material::MaterialSlot;
use crate::mesh::Mesh;
use crate::tags::TagSet;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use ship_core::{ShipError, ShipResult};
use std::collections::{HashMap, HashSet};

/// Principal axis; mirroring across `axis` reflects that coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn reflect(self, p: Vec3) -> Vec3 {
        let mut q = p;
        q[self.index()] = -q[self.index()];
        q
    }
}

/// Outcome of [`Mesh::mirror`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorReport {
    /// The mesh already matched its reflection; only snapping happened.
    pub already_symmetric: bool,
    /// On-plane vertices shared by both halves.
    pub welded: usize,
    /// Edges cut where they crossed the plane.
    pub cut_edges: usize,
    /// Faces discarded for lying in the plane or on the negative side.
    pub dropped: usize,
}

type PendingFace = (Vec<u32>, TagSet, MaterialSlot);

/// Rotate a loop so its smallest index comes first, keeping direction.
fn canonical(verts: &[u32]) -> Vec<u32> {
    let start = verts
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| **v)
        .map(|(i, _)| i)
        .unwrap_or(0);
    verts[start..].iter().chain(&verts[..start]).copied().collect()
}

/// Uniform grid over vertex positions for tolerance lookups.
struct SpatialHash {
    cell: f32,
    buckets: HashMap<(i64, i64, i64), Vec<u32>>,
}

impl SpatialHash {
    fn new(positions: &[Vec3], cell: f32) -> Self {
        let mut buckets: HashMap<(i64, i64, i64), Vec<u32>> = HashMap::new();
        for (i, p) in positions.iter().enumerate() {
            buckets.entry(Self::key(*p, cell)).or_default().push(i as u32);
        }
        Self { cell, buckets }
    }

    fn key(p: Vec3, cell: f32) -> (i64, i64, i64) {
        let q = (p / cell).floor();
        (q.x as i64, q.y as i64, q.z as i64)
    }

    /// Closest vertex within `epsilon` of `target`; ties go to the lower index.
    fn nearest(&self, positions: &[Vec3], target: Vec3, epsilon: f32) -> Option<u32> {
        let (kx, ky, kz) = Self::key(target, self.cell);
        let mut best: Option<(f32, u32)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(bucket) = self.buckets.get(&(kx + dx, ky + dy, kz + dz)) else {
                        continue;
                    };
                    for &v in bucket {
                        let d = positions[v as usize].distance(target);
                        if d > epsilon {
                            continue;
                        }
                        best = match best {
                            Some((bd, bv)) if bd < d || (bd == d && bv < v) => Some((bd, bv)),
                            _ => Some((d, v)),
                        };
                    }
                }
            }
        }
        best.map(|(_, v)| v)
    }
}

/// Sign changes around a loop, ignoring vertices on the plane.
fn plane_crossings(side: &[f32]) -> usize {
    let signs: Vec<bool> = side.iter().filter(|c| **c != 0.0).map(|c| *c > 0.0).collect();
    (0..signs.len())
        .filter(|&i| signs[i] != signs[(i + 1) % signs.len()])
        .count()
}

impl Mesh {
    /// Reflection partner of every vertex, if the mesh matches its mirror
    /// image within `epsilon` (positions and face loops).
    fn mirror_partners(&self, axis: Axis, epsilon: f32) -> Option<Vec<u32>> {
        let hash = SpatialHash::new(&self.positions, epsilon.max(1e-6));
        let partners: Option<Vec<u32>> = self
            .positions
            .iter()
            .map(|p| hash.nearest(&self.positions, axis.reflect(*p), epsilon))
            .collect();
        let partners = partners?;

        let loops: HashSet<Vec<u32>> = self.faces().map(|(_, face)| canonical(&face.verts)).collect();
        let symmetric = self.faces().all(|(_, face)| {
            let mirrored: Vec<u32> = face.verts.iter().rev().map(|&v| partners[v as usize]).collect();
            loops.contains(&canonical(&mirrored))
        });
        symmetric.then_some(partners)
    }

    /// Make the mesh symmetric across the plane through the origin normal to
    /// `axis`: the positive half is kept and reflected, vertices within
    /// `epsilon` of the plane are welded. A mesh that is already symmetric
    /// only has its near-plane vertices snapped.
    ///
    /// Each face may cross the plane at most twice (true for convex loops),
    /// and an edge lying in the plane may border only one kept face. Meshes
    /// breaking either rule fail with `InvalidTopology` before any face is
    /// replaced.
    pub fn mirror(&mut self, axis: Axis, epsilon: f32) -> ShipResult<MirrorReport> {
        self.compact();
        let k = axis.index();
        let mut report = MirrorReport::default();

        let already_symmetric = self.mirror_partners(axis, epsilon).is_some();
        for p in &mut self.positions {
            if p[k].abs() <= epsilon {
                p[k] = 0.0;
            }
        }
        self.touch();

        if already_symmetric {
            report.already_symmetric = true;
            report.welded = self.positions.iter().filter(|p| p[k] == 0.0).count();
            log::debug!("mirror {:?}: already symmetric, {} vertices on plane", axis, report.welded);
            return Ok(report);
        }

        // Clip every face to the positive half-space
        let mut cuts: HashMap<(u32, u32), u32> = HashMap::new();
        let mut kept: Vec<PendingFace> = Vec::new();
        let ids = self.face_ids();
        for id in &ids {
            let face = self.face(*id)?;
            let (verts, tags, material) = (face.verts.clone(), face.tags, face.material);
            let side: Vec<f32> = verts.iter().map(|&v| self.position(v)[k]).collect();

            if side.iter().all(|c| *c <= 0.0) {
                report.dropped += 1;
                continue;
            }
            if side.iter().all(|c| *c >= 0.0) {
                kept.push((verts, tags, material));
                continue;
            }

            if plane_crossings(&side) > 2 {
                return Err(ShipError::topology(format!(
                    "face {} crosses the {:?} mirror plane more than twice",
                    id, axis
                )));
            }

            let n = verts.len();
            let mut clipped = Vec::with_capacity(n + 2);
            for i in 0..n {
                let j = (i + 1) % n;
                let (a, b) = (verts[i], verts[j]);
                let (ca, cb) = (side[i], side[j]);
                if ca >= 0.0 {
                    clipped.push(a);
                }
                if (ca > 0.0 && cb < 0.0) || (ca < 0.0 && cb > 0.0) {
                    let key = (a.min(b), a.max(b));
                    let cut = match cuts.get(&key) {
                        Some(v) => *v,
                        None => {
                            let t = ca / (ca - cb);
                            let mut p = self.position(a).lerp(self.position(b), t);
                            p[k] = 0.0;
                            let v = self.add_vertex(p);
                            cuts.insert(key, v);
                            report.cut_edges += 1;
                            v
                        }
                    };
                    clipped.push(cut);
                }
            }
            if clipped.len() >= 3 {
                kept.push((clipped, tags, material));
            } else {
                report.dropped += 1;
            }
        }

        let mut on_plane: HashSet<(u32, u32)> = HashSet::new();
        for (verts, _, _) in &kept {
            for (i, &a) in verts.iter().enumerate() {
                let b = verts[(i + 1) % verts.len()];
                if self.position(a)[k] != 0.0 || self.position(b)[k] != 0.0 {
                    continue;
                }
                if !on_plane.insert((a, b)) || on_plane.contains(&(b, a)) {
                    return Err(ShipError::topology(format!(
                        "edge {}-{} on the {:?} mirror plane borders two kept faces",
                        a, b, axis
                    )));
                }
            }
        }

        for id in ids {
            self.remove_face(id)?;
        }

        // On-plane vertices map to themselves, the rest get a reflected twin
        let mut twin: Vec<Option<u32>> = vec![None; self.positions.len()];
        for (verts, _, _) in &kept {
            for &v in verts {
                if twin[v as usize].is_some() {
                    continue;
                }
                let p = self.position(v);
                twin[v as usize] = Some(if p[k] == 0.0 {
                    report.welded += 1;
                    v
                } else {
                    self.add_vertex(axis.reflect(p))
                });
            }
        }

        for (verts, tags, material) in &kept {
            self.add_face(verts.clone(), *tags, *material)?;
        }
        for (verts, tags, material) in &kept {
            let mirrored: Vec<u32> = verts
                .iter()
                .rev()
                .map(|&v| twin[v as usize].unwrap_or(v))
                .collect();
            self.add_face(mirrored, *tags, *material)?;
        }

        self.compact();
        log::debug!(
            "mirror {:?}: kept {} faces, welded {}, cut {} edges, dropped {}",
            axis,
            kept.len(),
            report.welded,
            report.cut_edges,
            report.dropped
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::Extrusion;
    use crate::tags::FaceTag;

    fn lopsided() -> Mesh {
        let mut mesh = Mesh::new();
        let faces = mesh.add_box(Vec3::ONE).unwrap();
        let arm = mesh.extrude(faces[2], Extrusion::along(1.0).uniform(0.5)).unwrap();
        mesh.tag(&[arm.top], FaceTag::Turret).unwrap();
        mesh
    }

    #[test]
    fn symmetric_box_is_left_alone() {
        let mut mesh = Mesh::new();
        mesh.add_box(Vec3::new(2.0, 1.0, 1.0)).unwrap();
        for axis in [Axis::X, Axis::Y, Axis::Z] {
            let report = mesh.mirror(axis, 1e-4).unwrap();
            assert!(report.already_symmetric);
            assert_eq!(mesh.vertex_count(), 8);
            assert_eq!(mesh.face_count(), 6);
        }
    }

    #[test]
    fn mirrored_asymmetric_mesh_is_closed() {
        let mut mesh = lopsided();
        let report = mesh.mirror(Axis::Y, 1e-4).unwrap();
        assert!(!report.already_symmetric);
        assert_eq!(report.cut_edges, 4);
        mesh.validate().unwrap();
        assert!(mesh.is_closed());

        let (min, max) = mesh.bounds().unwrap();
        assert!((min.y + 1.5).abs() < 1e-5 && (max.y - 1.5).abs() < 1e-5);

        // The arm was copied, tags included
        let turrets = mesh.faces().filter(|(_, f)| f.has_tag(FaceTag::Turret)).count();
        assert_eq!(turrets, 2);
    }

    #[test]
    fn mirroring_twice_keeps_vertex_count() {
        let mut mesh = lopsided();
        mesh.mirror(Axis::Y, 1e-4).unwrap();
        let vertices = mesh.vertex_count();
        let faces = mesh.face_count();
        let report = mesh.mirror(Axis::Y, 1e-4).unwrap();
        assert!(report.already_symmetric);
        assert_eq!(mesh.vertex_count(), vertices);
        assert_eq!(mesh.face_count(), faces);
    }

    #[test]
    fn concave_face_across_the_plane_is_rejected() {
        let mut mesh = Mesh::new();
        // A U-shaped loop whose two prongs cross y = 0
        let points = [
            (-1.0, -1.0),
            (1.0, -1.0),
            (1.0, 1.0),
            (0.5, 1.0),
            (0.5, -0.5),
            (-0.5, -0.5),
            (-0.5, 1.0),
            (-1.0, 1.0),
        ];
        let verts = points
            .iter()
            .map(|&(x, y)| mesh.add_vertex(Vec3::new(x, y, 0.0)))
            .collect();
        mesh.add_face(verts, TagSet::single(FaceTag::Hull), MaterialSlot::Hull).unwrap();
        let faces = mesh.face_count();
        assert!(matches!(mesh.mirror(Axis::Y, 1e-4), Err(ShipError::InvalidTopology { .. })));
        assert_eq!(mesh.face_count(), faces);
    }

    #[test]
    fn shared_edge_on_the_plane_is_rejected() {
        let mut mesh = Mesh::new();
        // Two fins on the +Y side hinged on the same edge in the plane
        let a = mesh.add_vertex(Vec3::new(0.0, 0.0, 0.0));
        let b = mesh.add_vertex(Vec3::new(1.0, 0.0, 0.0));
        let c = mesh.add_vertex(Vec3::new(0.5, 1.0, 0.5));
        let d = mesh.add_vertex(Vec3::new(0.5, 1.0, -0.5));
        let hull = TagSet::single(FaceTag::Hull);
        mesh.add_face(vec![a, b, c], hull, MaterialSlot::Hull).unwrap();
        mesh.add_face(vec![b, a, d], hull, MaterialSlot::Hull).unwrap();
        mesh.add_face(vec![c, d, a], hull, MaterialSlot::Hull).unwrap();
        assert!(matches!(mesh.mirror(Axis::Y, 1e-4), Err(ShipError::InvalidTopology { .. })));
    }

    #[test]
    fn near_plane_vertices_are_welded_not_duplicated() {
        let mut mesh = Mesh::new();
        let faces = mesh.add_box(Vec3::ONE).unwrap();
        // Push the -Y face almost onto the plane, then grow the +Y side
        mesh.translate(&[faces[3]], Vec3::new(0.0, 0.5 - 1e-6, 0.0)).unwrap();
        mesh.extrude(faces[2], Extrusion::along(0.5)).unwrap();
        let report = mesh.mirror(Axis::Y, 1e-4).unwrap();
        assert_eq!(report.welded, 4);
        assert_eq!(report.cut_edges, 0);
        // 8 kept above the plane, 4 shared on it
        assert_eq!(mesh.vertex_count(), 4 + 8 + 8);
        assert!(mesh.is_closed());
    }
}
