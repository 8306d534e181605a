//! Chamfer pass rounding off the blocky silhouette.
//!
//! Every face shrinks towards its interior by a fraction of its adjacent edge
//! lengths. The gaps left behind are closed with one strip per edge and one
//! polygon per vertex. Faces tagged `KeepSharp` keep their original corners,
//! so an edge between two of them stays sharp.

use crate::material::MaterialSlot;
use crate::mesh::Mesh;
use crate::tags::{FaceTag, TagSet};
use ship_core::{ShipError, ShipResult};
use std::collections::HashMap;

/// Largest accepted bevel fraction; at 0.5 neighbouring corners would meet.
pub const MAX_BEVEL_FRACTION: f32 = 0.45;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BevelSettings {
    /// Distance each corner moves along both of its edges, as a fraction of
    /// the edge length.
    pub fraction: f32,
}

impl Default for BevelSettings {
    fn default() -> Self {
        Self { fraction: 0.1 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BevelReport {
    /// Strips added along edges.
    pub strips: usize,
    /// Polygons added at vertices.
    pub corners: usize,
    /// Edges left sharp between two `KeepSharp` faces.
    pub sharp_edges: usize,
    /// Vertices that could not be opened (non-manifold or on an open border).
    pub pinned: usize,
}

struct SourceFace {
    verts: Vec<u32>,
    tags: TagSet,
    material: MaterialSlot,
    sharp: bool,
}

impl SourceFace {
    fn corner_of(&self, v: u32) -> Option<usize> {
        self.verts.iter().position(|&x| x == v)
    }

    fn next_after(&self, v: u32) -> Option<u32> {
        self.corner_of(v).map(|i| self.verts[(i + 1) % self.verts.len()])
    }
}

/// Drop consecutive repeats, including the wrap-around pair.
fn dedupe_cyclic(mut verts: Vec<u32>) -> Vec<u32> {
    verts.dedup();
    while verts.len() > 1 && verts.first() == verts.last() {
        verts.pop();
    }
    verts
}

/// Split a loop at every repeat of `anchor` into simple loops.
fn split_at(verts: Vec<u32>, anchor: u32) -> Vec<Vec<u32>> {
    let hits: Vec<usize> = verts
        .iter()
        .enumerate()
        .filter(|(_, v)| **v == anchor)
        .map(|(i, _)| i)
        .collect();
    if hits.len() <= 1 {
        return vec![verts];
    }
    let start = hits[0];
    let rotated: Vec<u32> = verts[start..].iter().chain(&verts[..start]).copied().collect();
    rotated
        .split(|v| *v == anchor)
        .skip(1)
        .map(|segment| {
            let mut piece = Vec::with_capacity(segment.len() + 1);
            piece.push(anchor);
            piece.extend_from_slice(segment);
            piece
        })
        .collect()
}

impl Mesh {
    /// Chamfer every edge of the mesh.
    pub fn bevel(&mut self, settings: BevelSettings) -> ShipResult<BevelReport> {
        let t = settings.fraction;
        if !(t > 0.0 && t <= MAX_BEVEL_FRACTION) {
            return Err(ShipError::range(0.0, t));
        }

        self.compact();
        let ids = self.face_ids();
        let mut faces = Vec::with_capacity(ids.len());
        for id in &ids {
            let face = self.face(*id)?;
            faces.push(SourceFace {
                verts: face.verts.clone(),
                tags: face.tags,
                material: face.material,
                sharp: face.tags.contains(FaceTag::KeepSharp),
            });
        }

        let vertex_count = self.positions.len();
        let mut pinned = vec![false; vertex_count];
        let mut edge_face: HashMap<(u32, u32), usize> = HashMap::new();
        let mut incident: Vec<Vec<usize>> = vec![Vec::new(); vertex_count];
        for (fi, face) in faces.iter().enumerate() {
            let n = face.verts.len();
            for i in 0..n {
                let (a, b) = (face.verts[i], face.verts[(i + 1) % n]);
                if edge_face.insert((a, b), fi).is_some() {
                    pinned[a as usize] = true;
                    pinned[b as usize] = true;
                }
                incident[a as usize].push(fi);
            }
        }
        for face in &faces {
            let n = face.verts.len();
            for i in 0..n {
                let (a, b) = (face.verts[i], face.verts[(i + 1) % n]);
                if !edge_face.contains_key(&(b, a)) {
                    pinned[a as usize] = true;
                    pinned[b as usize] = true;
                }
            }
        }

        // Faces around each vertex, stepping across the outgoing edge
        let mut fans: Vec<Vec<usize>> = vec![Vec::new(); vertex_count];
        for v in 0..vertex_count {
            if pinned[v] || incident[v].is_empty() {
                continue;
            }
            let vertex = v as u32;
            let start = incident[v][0];
            let mut fan = vec![start];
            let mut current = start;
            let complete = loop {
                let step = faces[current]
                    .next_after(vertex)
                    .and_then(|n| edge_face.get(&(n, vertex)).copied());
                match step {
                    Some(next) if next == start => break true,
                    Some(next) if fan.len() < incident[v].len() => {
                        fan.push(next);
                        current = next;
                    }
                    _ => break false,
                }
            };
            if complete && fan.len() == incident[v].len() {
                fans[v] = fan;
            } else {
                pinned[v] = true;
            }
        }

        // Corner copies; sharp faces and pinned vertices keep the original
        let mut corners: Vec<Vec<u32>> = Vec::with_capacity(faces.len());
        for face in &faces {
            let n = face.verts.len();
            let normal = self.vector_area(&face.verts).normalize_or_zero();
            let mut copies = Vec::with_capacity(n);
            for i in 0..n {
                let v = face.verts[i];
                if face.sharp || pinned[v as usize] {
                    copies.push(v);
                    continue;
                }
                let p = self.position(v);
                let to_prev = self.position(face.verts[(i + n - 1) % n]) - p;
                let to_next = self.position(face.verts[(i + 1) % n]) - p;
                let mut offset = (to_prev + to_next) * t;
                // Straight-through vertex (from an edge split): push inwards instead
                let reach = t * to_prev.length().min(to_next.length());
                if offset.length() < 1e-3 * reach {
                    offset = normal.cross(to_next - to_prev).normalize_or_zero() * reach;
                }
                copies.push(self.add_vertex(p + offset));
            }
            corners.push(copies);
        }
        let copy_of = |fi: usize, v: u32| -> Option<u32> { faces[fi].corner_of(v).map(|i| corners[fi][i]) };

        let mut report = BevelReport {
            pinned: pinned.iter().filter(|p| **p).count(),
            ..Default::default()
        };
        let mut pending: Vec<(Vec<u32>, TagSet, MaterialSlot)> = Vec::new();

        for (fi, face) in faces.iter().enumerate() {
            pending.push((corners[fi].clone(), face.tags, face.material));
        }

        for (fi, face) in faces.iter().enumerate() {
            let n = face.verts.len();
            for i in 0..n {
                let (a, b) = (face.verts[i], face.verts[(i + 1) % n]);
                let Some(&gi) = edge_face.get(&(b, a)) else {
                    continue;
                };
                if gi <= fi {
                    continue;
                }
                let other = &faces[gi];
                let strip = match (copy_of(fi, a), copy_of(fi, b), copy_of(gi, a), copy_of(gi, b)) {
                    (Some(a_f), Some(b_f), Some(a_g), Some(b_g)) => dedupe_cyclic(vec![b_f, a_f, a_g, b_g]),
                    _ => continue,
                };
                if strip.len() < 3 {
                    report.sharp_edges += 1;
                    continue;
                }
                let material = if face.material == other.material {
                    face.material
                } else {
                    MaterialSlot::Hull
                };
                pending.push((strip, face.tags.intersection(other.tags), material));
                report.strips += 1;
            }
        }

        for (v, fan) in fans.iter().enumerate() {
            if fan.is_empty() {
                continue;
            }
            let vertex = v as u32;
            let mut ring = Vec::with_capacity(fan.len());
            let mut tags = faces[fan[0]].tags;
            for &fi in fan.iter().rev() {
                if let Some(copy) = copy_of(fi, vertex) {
                    ring.push(copy);
                }
                tags = tags.intersection(faces[fi].tags);
            }
            for piece in split_at(dedupe_cyclic(ring), vertex) {
                let piece = dedupe_cyclic(piece);
                if piece.len() >= 3 {
                    pending.push((piece, tags, faces[fan[0]].material));
                    report.corners += 1;
                }
            }
        }

        for id in ids {
            self.remove_face(id)?;
        }
        for (verts, tags, material) in pending {
            self.add_face(verts, tags, material)?;
        }
        self.compact();

        log::debug!(
            "bevel {:.3}: {} strips, {} corners, {} sharp edges, {} pinned",
            t,
            report.strips,
            report.corners,
            report.sharp_edges,
            report.pinned
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::Extrusion;
    use glam::Vec3;

    #[test]
    fn bevelled_box_has_chamfered_edges_and_corners() {
        let mut mesh = Mesh::new();
        mesh.add_box(Vec3::ONE).unwrap();
        let report = mesh.bevel(BevelSettings { fraction: 0.1 }).unwrap();
        assert_eq!(report.strips, 12);
        assert_eq!(report.corners, 8);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.face_count(), 26);
        assert!(mesh.is_closed());
        mesh.validate().unwrap();

        // Corners were pulled in, the bounds did not grow
        let (min, max) = mesh.bounds().unwrap();
        assert!((max - Vec3::splat(0.5)).abs().max_element() < 1e-5);
        assert!((min + Vec3::splat(0.5)).abs().max_element() < 1e-5);
        for (_, face) in mesh.faces() {
            assert!(face.has_tag(FaceTag::Hull));
        }
    }

    #[test]
    fn keep_sharp_faces_keep_their_shared_edge() {
        let mut mesh = Mesh::new();
        let faces = mesh.add_box(Vec3::ONE).unwrap();
        mesh.tag(&[faces[0], faces[4]], FaceTag::KeepSharp).unwrap();
        let report = mesh.bevel(BevelSettings { fraction: 0.2 }).unwrap();
        assert_eq!(report.sharp_edges, 1);
        assert_eq!(report.strips, 11);
        assert_eq!(report.corners, 6);
        assert_eq!(mesh.vertex_count(), 22);
        assert_eq!(mesh.face_count(), 23);
        assert!(mesh.is_closed());

        // Strips next to a sharp face do not inherit KeepSharp
        let sharp = mesh.faces().filter(|(_, f)| f.has_tag(FaceTag::KeepSharp)).count();
        assert_eq!(sharp, 2);
    }

    #[test]
    fn extruded_hull_stays_closed() {
        let mut mesh = Mesh::new();
        let faces = mesh.add_box(Vec3::ONE).unwrap();
        let out = mesh.extrude(faces[0], Extrusion::along(1.0).uniform(0.6)).unwrap();
        mesh.split_grid(out.sides[0], 2, 2).unwrap();
        mesh.subdivide_face_edges(out.top, 1).unwrap();
        mesh.bevel(BevelSettings::default()).unwrap();
        assert!(mesh.is_closed());
        mesh.validate().unwrap();
    }

    #[test]
    fn open_border_vertices_are_pinned() {
        let mut mesh = Mesh::new();
        let faces = mesh.add_box(Vec3::ONE).unwrap();
        mesh.delete(&[faces[4]]).unwrap();
        let report = mesh.bevel(BevelSettings::default()).unwrap();
        assert_eq!(report.pinned, 4);
        mesh.validate().unwrap();
    }

    #[test]
    fn fraction_out_of_range_is_rejected() {
        let mut mesh = Mesh::new();
        mesh.add_box(Vec3::ONE).unwrap();
        assert!(mesh.bevel(BevelSettings { fraction: 0.0 }).is_err());
        assert!(mesh.bevel(BevelSettings { fraction: 0.5 }).is_err());
    }

    #[test]
    fn loops_split_at_repeated_anchor() {
        assert_eq!(split_at(vec![7, 1, 2, 7, 3], 7), vec![vec![7, 1, 2], vec![7, 3]]);
        assert_eq!(dedupe_cyclic(vec![4, 4, 5, 6, 4]), vec![4, 5, 6]);
    }
}
