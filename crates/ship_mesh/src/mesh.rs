//! Arena mesh: vertex positions plus generation-checked face slots.

use crate::material::MaterialSlot;
use crate::tags::{FaceTag, TagSet};
use glam::{Vec2, Vec3};
use ship_core::{ShipError, ShipResult, Transform};
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;

/// Faces with an area at or below this are degenerate.
pub const AREA_EPSILON: f32 = 1e-7;

/// Loops of the seed box, in the order `+X, -X, +Y, -Y, +Z, -Z`.
/// Corner `i` has x from bit 0, y from bit 1 and z from bit 2.
const BOX_FACES: [[u32; 4]; 6] = [
    [1, 3, 7, 5],
    [0, 4, 6, 2],
    [2, 6, 7, 3],
    [0, 1, 5, 4],
    [4, 5, 7, 6],
    [0, 2, 3, 1],
];

/// Handle to a face. Only valid while the face it was issued for is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaceId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl FaceId {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub(crate) fn stale(&self) -> ShipError {
        ShipError::StaleHandle {
            index: self.index,
            generation: self.generation,
        }
    }
}

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.index, self.generation)
    }
}

/// A polygon: a counter-clockwise (seen from outside) loop of vertex indices.
#[derive(Debug, Clone)]
pub struct Face {
    pub(crate) verts: Vec<u32>,
    pub(crate) tags: TagSet,
    pub(crate) material: MaterialSlot,
    /// Unit normal together with the mesh epoch it was computed at.
    normal: Cell<Option<(u64, Vec3)>>,
}

impl Face {
    fn new(verts: Vec<u32>, tags: TagSet, material: MaterialSlot) -> Self {
        Self {
            verts,
            tags,
            material,
            normal: Cell::new(None),
        }
    }

    pub fn verts(&self) -> &[u32] {
        &self.verts
    }

    pub fn sides(&self) -> usize {
        self.verts.len()
    }

    pub fn tags(&self) -> TagSet {
        self.tags
    }

    pub fn has_tag(&self, tag: FaceTag) -> bool {
        self.tags.contains(tag)
    }

    pub fn material(&self) -> MaterialSlot {
        self.material
    }

    /// Directed edges `(v[i], v[i + 1])` of the loop.
    pub fn edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let n = self.verts.len();
        (0..n).map(move |i| (self.verts[i], self.verts[(i + 1) % n]))
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FaceSlot {
    pub(crate) generation: u32,
    pub(crate) face: Option<Face>,
}

/// Polygon mesh owned by one generation run.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub(crate) positions: Vec<Vec3>,
    pub(crate) slots: Vec<FaceSlot>,
    /// Freed slot indices, reused last-in first-out.
    pub(crate) free: Vec<u32>,
    /// Bumped by every mutation; cached normals from older epochs are stale.
    pub(crate) epoch: u64,
    pub(crate) open: bool,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn face_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.face.is_some()).count()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn position(&self, vertex: u32) -> Vec3 {
        self.positions[vertex as usize]
    }

    pub fn set_position(&mut self, vertex: u32, position: Vec3) {
        self.positions[vertex as usize] = position;
        self.touch();
    }

    /// `true` once faces have been deleted without replacement.
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub(crate) fn touch(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
    }

    pub fn add_vertex(&mut self, position: Vec3) -> u32 {
        self.positions.push(position);
        self.touch();
        (self.positions.len() - 1) as u32
    }

    /// Add a face from an explicit loop. The loop must hold at least three
    /// distinct, existing vertices.
    pub fn add_face(&mut self, verts: Vec<u32>, tags: TagSet, material: MaterialSlot) -> ShipResult<FaceId> {
        self.check_loop(&verts)?;
        let face = Face::new(verts, tags, material);
        self.touch();

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.face = Some(face);
            return Ok(FaceId {
                index,
                generation: slot.generation,
            });
        }

        self.slots.push(FaceSlot {
            generation: 0,
            face: Some(face),
        });
        Ok(FaceId {
            index: (self.slots.len() - 1) as u32,
            generation: 0,
        })
    }

    fn check_loop(&self, verts: &[u32]) -> ShipResult<()> {
        if verts.len() < 3 {
            return Err(ShipError::topology(format!("loop of {} vertices", verts.len())));
        }
        for (i, &v) in verts.iter().enumerate() {
            if v as usize >= self.positions.len() {
                return Err(ShipError::topology(format!("vertex {} does not exist", v)));
            }
            if verts[..i].contains(&v) {
                return Err(ShipError::topology(format!("vertex {} repeats in loop {:?}", v, verts)));
            }
        }
        Ok(())
    }

    pub fn face(&self, id: FaceId) -> ShipResult<&Face> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.face.as_ref())
            .ok_or_else(|| id.stale())
    }

    pub(crate) fn face_mut(&mut self, id: FaceId) -> ShipResult<&mut Face> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.face.as_mut())
            .ok_or_else(|| id.stale())
    }

    pub fn contains(&self, id: FaceId) -> bool {
        self.face(id).is_ok()
    }

    /// Handles of all live faces in slot order.
    pub fn face_ids(&self) -> Vec<FaceId> {
        self.faces().map(|(id, _)| id).collect()
    }

    pub fn faces(&self) -> impl Iterator<Item = (FaceId, &Face)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.face.as_ref().map(|face| {
                (
                    FaceId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    face,
                )
            })
        })
    }

    /// Remove a face and retire its handle. Does not flag the mesh open:
    /// callers replace the face in the same operation.
    pub(crate) fn remove_face(&mut self, id: FaceId) -> ShipResult<Face> {
        let slot = match self.slots.get_mut(id.index as usize) {
            Some(slot) if slot.generation == id.generation => slot,
            _ => return Err(id.stale()),
        };
        let face = slot.face.take().ok_or_else(|| id.stale())?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.touch();
        Ok(face)
    }

    /// Fail with `StaleHandle` on the first dead handle.
    pub fn ensure_live(&self, ids: &[FaceId]) -> ShipResult<()> {
        for id in ids {
            self.face(*id)?;
        }
        Ok(())
    }

    /// Sorted, de-duplicated vertices of a face set.
    pub fn unique_vertices(&self, ids: &[FaceId]) -> ShipResult<Vec<u32>> {
        let mut verts = Vec::new();
        for id in ids {
            verts.extend_from_slice(&self.face(*id)?.verts);
        }
        verts.sort_unstable();
        verts.dedup();
        Ok(verts)
    }

    /// Vector area of a loop (Newell's method): direction is the normal,
    /// length is the area.
    pub(crate) fn vector_area(&self, verts: &[u32]) -> Vec3 {
        let n = verts.len();
        let mut sum = Vec3::ZERO;
        for i in 0..n {
            let cur = self.position(verts[i]);
            let next = self.position(verts[(i + 1) % n]);
            sum.x += (cur.y - next.y) * (cur.z + next.z);
            sum.y += (cur.z - next.z) * (cur.x + next.x);
            sum.z += (cur.x - next.x) * (cur.y + next.y);
        }
        sum * 0.5
    }

    /// Unit outward normal (zero for a degenerate face).
    pub fn normal(&self, id: FaceId) -> ShipResult<Vec3> {
        let face = self.face(id)?;
        if let Some((epoch, normal)) = face.normal.get() {
            if epoch == self.epoch {
                return Ok(normal);
            }
        }
        let normal = self.vector_area(&face.verts).normalize_or_zero();
        face.normal.set(Some((self.epoch, normal)));
        Ok(normal)
    }

    pub fn area(&self, id: FaceId) -> ShipResult<f32> {
        Ok(self.vector_area(&self.face(id)?.verts).length())
    }

    pub fn centroid(&self, id: FaceId) -> ShipResult<Vec3> {
        let face = self.face(id)?;
        let sum: Vec3 = face.verts.iter().map(|&v| self.position(v)).sum();
        Ok(sum / face.verts.len() as f32)
    }

    pub fn loop_points(&self, id: FaceId) -> ShipResult<Vec<Vec3>> {
        Ok(self.face(id)?.verts.iter().map(|&v| self.position(v)).collect())
    }

    /// Local frame of a face: origin at the centroid, `Z` along the normal and
    /// `X` along the first edge.
    pub fn frame(&self, id: FaceId) -> ShipResult<Transform> {
        let face = self.face(id)?;
        let tangent = self.position(face.verts[1]) - self.position(face.verts[0]);
        Ok(Transform::from_normal_tangent(self.centroid(id)?, self.normal(id)?, tangent))
    }

    /// Extent of a face along the `X` and `Y` axes of its frame.
    pub fn face_size(&self, id: FaceId) -> ShipResult<Vec2> {
        let frame = self.frame(id)?;
        let mut min = Vec2::splat(f32::MAX);
        let mut max = Vec2::splat(f32::MIN);
        for p in self.loop_points(id)? {
            let local = frame.inverse_transform_point(p).truncate();
            min = min.min(local);
            max = max.max(local);
        }
        Ok(max - min)
    }

    /// Long side over short side; infinite for a sliver.
    pub fn aspect_ratio(&self, id: FaceId) -> ShipResult<f32> {
        let size = self.face_size(id)?;
        let short = size.min_element();
        if short <= 1e-6 {
            return Ok(f32::INFINITY);
        }
        Ok(size.max_element() / short)
    }

    /// Check the loop invariants of every face.
    pub fn validate(&self) -> ShipResult<()> {
        for (id, face) in self.faces() {
            self.check_loop(&face.verts)
                .map_err(|err| ShipError::topology(format!("face {}: {}", id, err)))?;
        }
        Ok(())
    }

    /// Every directed edge appears once and is matched by its reverse.
    pub fn is_closed(&self) -> bool {
        let mut edges: HashMap<(u32, u32), u32> = HashMap::new();
        for (_, face) in self.faces() {
            for edge in face.edges() {
                *edges.entry(edge).or_default() += 1;
            }
        }
        edges
            .iter()
            .all(|(&(a, b), &count)| count == 1 && edges.get(&(b, a)) == Some(&1))
    }

    /// Drop vertices no face references, keeping the order of the rest.
    /// Returns the number of vertices removed.
    pub fn compact(&mut self) -> usize {
        let mut used = vec![false; self.positions.len()];
        for (_, face) in self.faces() {
            for &v in &face.verts {
                used[v as usize] = true;
            }
        }

        let mut remap = vec![u32::MAX; self.positions.len()];
        let mut kept = Vec::with_capacity(self.positions.len());
        for (i, position) in self.positions.iter().enumerate() {
            if used[i] {
                remap[i] = kept.len() as u32;
                kept.push(*position);
            }
        }

        let removed = self.positions.len() - kept.len();
        for slot in &mut self.slots {
            if let Some(face) = slot.face.as_mut() {
                for v in &mut face.verts {
                    *v = remap[*v as usize];
                }
            }
        }
        self.positions = kept;
        self.touch();
        removed
    }

    /// Axis-aligned bounds of the vertices used by faces.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut bounds: Option<(Vec3, Vec3)> = None;
        for (_, face) in self.faces() {
            for &v in &face.verts {
                let p = self.position(v);
                bounds = Some(match bounds {
                    Some((min, max)) => (min.min(p), max.max(p)),
                    None => (p, p),
                });
            }
        }
        bounds
    }

    /// Area-weighted centroid of the surface.
    pub fn surface_centroid(&self) -> Vec3 {
        let mut weighted = Vec3::ZERO;
        let mut total = 0.0;
        for (_, face) in self.faces() {
            let area = self.vector_area(&face.verts).length();
            let centroid: Vec3 = face.verts.iter().map(|&v| self.position(v)).sum::<Vec3>() / face.verts.len() as f32;
            weighted += centroid * area;
            total += area;
        }
        if total > AREA_EPSILON {
            weighted / total
        } else {
            Vec3::ZERO
        }
    }

    /// Move the mesh so its surface centroid sits at the origin. Returns the
    /// applied offset.
    pub fn recenter(&mut self) -> Vec3 {
        let offset = -self.surface_centroid();
        for p in &mut self.positions {
            *p += offset;
        }
        self.touch();
        offset
    }

    /// Add an axis-aligned box centred on the origin. Faces come back in the
    /// order `+X, -X, +Y, -Y, +Z, -Z`, tagged `Hull`.
    pub fn add_box(&mut self, dimensions: Vec3) -> ShipResult<Vec<FaceId>> {
        if dimensions.min_element() <= 0.0 || !dimensions.is_finite() {
            return Err(ShipError::range(0.0, dimensions.min_element()));
        }
        let half = dimensions * 0.5;
        let base = self.positions.len() as u32;
        for i in 0..8u32 {
            let sign = |bit: u32| if i & bit != 0 { 1.0 } else { -1.0 };
            self.add_vertex(Vec3::new(sign(1) * half.x, sign(2) * half.y, sign(4) * half.z));
        }

        BOX_FACES
            .iter()
            .map(|quad| {
                self.add_face(
                    quad.iter().map(|v| base + v).collect(),
                    TagSet::single(FaceTag::Hull),
                    MaterialSlot::Hull,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn box_is_closed_with_outward_normals() {
        let mut mesh = Mesh::new();
        let faces = mesh.add_box(Vec3::new(2.0, 1.0, 0.5)).unwrap();
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.face_count(), 6);
        assert!(mesh.is_closed());
        mesh.validate().unwrap();

        let expected = [Vec3::X, -Vec3::X, Vec3::Y, -Vec3::Y, Vec3::Z, -Vec3::Z];
        for (id, normal) in faces.iter().zip(expected) {
            assert!(close(mesh.normal(*id).unwrap(), normal));
        }
        assert!((mesh.area(faces[0]).unwrap() - 0.5).abs() < 1e-6);
        assert!((mesh.area(faces[4]).unwrap() - 2.0).abs() < 1e-6);
        assert!((mesh.aspect_ratio(faces[4]).unwrap() - 2.0).abs() < 1e-5);

        let (min, max) = mesh.bounds().unwrap();
        assert!(close(min, Vec3::new(-1.0, -0.5, -0.25)));
        assert!(close(max, Vec3::new(1.0, 0.5, 0.25)));
    }

    #[test]
    fn removed_face_handle_goes_stale() {
        let mut mesh = Mesh::new();
        let faces = mesh.add_box(Vec3::ONE).unwrap();
        mesh.remove_face(faces[2]).unwrap();
        assert_eq!(
            mesh.normal(faces[2]),
            Err(ShipError::StaleHandle {
                index: faces[2].index(),
                generation: 0
            })
        );

        // The slot is reused, but the old handle stays dead
        let reused = mesh
            .add_face(vec![2, 6, 7, 3], TagSet::single(FaceTag::Hull), MaterialSlot::Hull)
            .unwrap();
        assert_eq!(reused.index(), faces[2].index());
        assert_eq!(reused.generation(), 1);
        assert!(!mesh.contains(faces[2]));
        assert!(mesh.contains(reused));
        assert!(mesh.is_closed());
    }

    #[test]
    fn bad_loops_are_rejected() {
        let mut mesh = Mesh::new();
        mesh.add_box(Vec3::ONE).unwrap();
        let tags = TagSet::EMPTY;
        assert!(matches!(
            mesh.add_face(vec![0, 1], tags, MaterialSlot::Hull),
            Err(ShipError::InvalidTopology { .. })
        ));
        assert!(matches!(
            mesh.add_face(vec![0, 1, 0], tags, MaterialSlot::Hull),
            Err(ShipError::InvalidTopology { .. })
        ));
        assert!(matches!(
            mesh.add_face(vec![0, 1, 99], tags, MaterialSlot::Hull),
            Err(ShipError::InvalidTopology { .. })
        ));
    }

    #[test]
    fn cached_normal_follows_vertex_moves() {
        let mut mesh = Mesh::new();
        let faces = mesh.add_box(Vec3::ONE).unwrap();
        let top = faces[4];
        assert!(close(mesh.normal(top).unwrap(), Vec3::Z));
        // Tilt the top face by raising its +X edge
        for v in [5, 7] {
            let p = mesh.position(v);
            mesh.set_position(v, p + Vec3::Z);
        }
        let tilted = mesh.normal(top).unwrap();
        assert!(tilted.x < -0.5 && tilted.z > 0.5);
    }

    #[test]
    fn compact_drops_orphans_and_recenter_moves_to_origin() {
        let mut mesh = Mesh::new();
        mesh.add_vertex(Vec3::splat(100.0));
        mesh.add_box(Vec3::ONE).unwrap();
        assert_eq!(mesh.compact(), 1);
        assert_eq!(mesh.vertex_count(), 8);
        mesh.validate().unwrap();
        assert!(mesh.is_closed());

        for p in &mut mesh.positions {
            *p += Vec3::new(3.0, -1.0, 2.0);
        }
        mesh.touch();
        let offset = mesh.recenter();
        assert!(close(offset, Vec3::new(-3.0, 1.0, -2.0)));
        assert!(close(mesh.surface_centroid(), Vec3::ZERO));
    }

    #[test]
    fn non_positive_box_is_rejected() {
        let mut mesh = Mesh::new();
        assert!(matches!(
            mesh.add_box(Vec3::new(1.0, 0.0, 1.0)),
            Err(ShipError::InvalidRange { .. })
        ));
    }
}
