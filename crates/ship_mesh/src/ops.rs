//! Editing operations on the mesh.
//!
//! Every operation either keeps the surface closed or, for [`Mesh::delete`],
//! flags it open. Operations validate all handles before mutating anything.

use crate::material::MaterialSlot;
use crate::mesh::{FaceId, Mesh, AREA_EPSILON};
use crate::tags::FaceTag;
use glam::{Quat, Vec2, Vec3};
use ship_core::{ShipError, ShipResult, Transform};

/// Smallest scale factor accepted by [`Mesh::scale`].
pub const MIN_SCALE_FACTOR: f32 = 1e-3;

/// Parameters of a single extrusion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extrusion {
    /// Offset along the face normal. Negative pushes into the surface.
    pub distance: f32,
    /// Scale of the new top face along its frame's `X` and `Y` axes.
    pub scale: Vec2,
    /// Rotation of the new top face about its normal, in radians.
    pub roll: f32,
}

impl Default for Extrusion {
    fn default() -> Self {
        Self {
            distance: 0.0,
            scale: Vec2::ONE,
            roll: 0.0,
        }
    }
}

impl Extrusion {
    pub fn along(distance: f32) -> Self {
        Self {
            distance,
            ..Default::default()
        }
    }

    pub fn scaled(mut self, x: f32, y: f32) -> Self {
        self.scale = Vec2::new(x, y);
        self
    }

    pub fn uniform(self, factor: f32) -> Self {
        self.scaled(factor, factor)
    }

    pub fn rolled(mut self, roll: f32) -> Self {
        self.roll = roll;
        self
    }
}

/// Faces produced by an extrusion.
#[derive(Debug, Clone, PartialEq)]
pub struct Extruded {
    /// The moved copy of the original face.
    pub top: FaceId,
    /// One quad per edge of the original loop, in loop order.
    pub sides: Vec<FaceId>,
}

impl Extruded {
    /// Top and sides together.
    pub fn all(&self) -> Vec<FaceId> {
        let mut faces = self.sides.clone();
        faces.push(self.top);
        faces
    }
}

/// Result of [`Mesh::split_grid`].
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    /// Cells in row-major order: `cells[j * cells_u + i]`.
    pub cells: Vec<FaceId>,
    pub cells_u: usize,
    pub cells_v: usize,
    /// Vertices strictly inside the split face.
    pub interior: Vec<u32>,
}

impl Grid {
    pub fn cell(&self, i: usize, j: usize) -> FaceId {
        self.cells[j * self.cells_u + i]
    }
}

impl Mesh {
    fn check_area(&self, id: FaceId) -> ShipResult<f32> {
        let area = self.area(id)?;
        if area <= AREA_EPSILON || !area.is_finite() {
            return Err(ShipError::DegenerateFace {
                index: id.index(),
                generation: id.generation(),
                area,
            });
        }
        Ok(area)
    }

    /// Extrude a face along its normal. The face is replaced by a top copy
    /// plus one side quad per edge; the top is then scaled in its own frame
    /// and rolled about its normal.
    pub fn extrude(&mut self, id: FaceId, extrusion: Extrusion) -> ShipResult<Extruded> {
        self.check_area(id)?;
        let normal = self.normal(id)?;
        let offset = normal * extrusion.distance;
        let face = self.remove_face(id)?;

        let top_verts: Vec<u32> = face
            .verts
            .iter()
            .map(|&v| {
                let p = self.position(v);
                self.add_vertex(p + offset)
            })
            .collect();

        let n = face.verts.len();
        let mut sides = Vec::with_capacity(n);
        for i in 0..n {
            let j = (i + 1) % n;
            sides.push(self.add_face(
                vec![face.verts[i], face.verts[j], top_verts[j], top_verts[i]],
                face.tags,
                face.material,
            )?);
        }
        let top = self.add_face(top_verts, face.tags, face.material)?;

        if extrusion.scale != Vec2::ONE {
            self.scale(&[top], extrusion.scale.extend(1.0))?;
        }
        if extrusion.roll != 0.0 {
            self.roll(top, extrusion.roll)?;
        }
        Ok(Extruded { top, sides })
    }

    /// Shrink a face into itself, leaving a rim of `fraction` of its size.
    pub fn inset(&mut self, id: FaceId, fraction: f32) -> ShipResult<Extruded> {
        if !(0.0..1.0).contains(&fraction) {
            return Err(ShipError::range(0.0, fraction));
        }
        self.extrude(id, Extrusion::default().uniform(1.0 - fraction))
    }

    /// Local frame of a face set: origin at the mean of its vertices, `Z`
    /// along the averaged normal and `X` along the first face's first edge.
    pub fn set_frame(&self, ids: &[FaceId]) -> ShipResult<Transform> {
        let first = *ids.first().ok_or_else(|| ShipError::topology("empty face set"))?;
        let verts = self.unique_vertices(ids)?;
        let pivot = verts.iter().map(|&v| self.position(v)).sum::<Vec3>() / verts.len() as f32;

        let mut normal = Vec3::ZERO;
        for id in ids {
            normal += self.normal(*id)?;
        }
        if normal.length_squared() <= f32::EPSILON {
            normal = self.normal(first)?;
        }

        let face = self.face(first)?;
        let tangent = self.position(face.verts[1]) - self.position(face.verts[0]);
        Ok(Transform::from_normal_tangent(pivot, normal, tangent))
    }

    /// Scale a face set about its pivot in the set's local frame
    /// (`factors` = tangent, bitangent, normal).
    pub fn scale(&mut self, ids: &[FaceId], factors: Vec3) -> ShipResult<()> {
        for factor in factors.to_array() {
            if !factor.is_finite() || factor < MIN_SCALE_FACTOR {
                return Err(ShipError::range(MIN_SCALE_FACTOR, factor));
            }
        }
        for id in ids {
            self.check_area(*id)?;
        }
        if ids.is_empty() {
            return Ok(());
        }

        let frame = self.set_frame(ids)?;
        for v in self.unique_vertices(ids)? {
            let local = frame.inverse_transform_point(self.position(v));
            self.positions[v as usize] = frame.transform_point(local * factors);
        }
        self.touch();
        Ok(())
    }

    pub fn translate(&mut self, ids: &[FaceId], delta: Vec3) -> ShipResult<()> {
        for v in self.unique_vertices(ids)? {
            self.positions[v as usize] += delta;
        }
        self.touch();
        Ok(())
    }

    /// Rotate a face set about `axis` through `pivot`.
    pub fn rotate(&mut self, ids: &[FaceId], axis: Vec3, angle: f32, pivot: Vec3) -> ShipResult<()> {
        let axis = axis.normalize_or_zero();
        if axis == Vec3::ZERO {
            return Err(ShipError::range(0.0, 0.0));
        }
        let rotation = Quat::from_axis_angle(axis, angle);
        for v in self.unique_vertices(ids)? {
            let p = self.position(v);
            self.positions[v as usize] = pivot + rotation * (p - pivot);
        }
        self.touch();
        Ok(())
    }

    /// Spin a face about its own normal through its centroid.
    pub fn roll(&mut self, id: FaceId, angle: f32) -> ShipResult<()> {
        let normal = self.normal(id)?;
        let centroid = self.centroid(id)?;
        if normal == Vec3::ZERO {
            return Ok(());
        }
        self.rotate(&[id], normal, angle, centroid)
    }

    /// Delete faces without replacement; the mesh is flagged open.
    pub fn delete(&mut self, ids: &[FaceId]) -> ShipResult<()> {
        self.ensure_live(ids)?;
        for id in ids {
            // Duplicate handles in the set are already gone
            if self.contains(*id) {
                self.remove_face(*id)?;
            }
        }
        self.open = true;
        Ok(())
    }

    pub fn tag(&mut self, ids: &[FaceId], tag: FaceTag) -> ShipResult<()> {
        self.ensure_live(ids)?;
        for id in ids {
            self.face_mut(*id)?.tags.insert(tag);
        }
        Ok(())
    }

    pub fn untag(&mut self, ids: &[FaceId], tag: FaceTag) -> ShipResult<()> {
        self.ensure_live(ids)?;
        for id in ids {
            self.face_mut(*id)?.tags.remove(tag);
        }
        Ok(())
    }

    pub fn set_material(&mut self, id: FaceId, slot: MaterialSlot) -> ShipResult<()> {
        self.face_mut(id)?.material = slot;
        Ok(())
    }

    /// Insert `vertex` between `a` and `b` in every face using that edge, in
    /// either direction. Returns how many faces were updated.
    pub(crate) fn insert_on_edge(&mut self, a: u32, b: u32, vertex: u32) -> usize {
        let mut updated = 0;
        for slot in &mut self.slots {
            let Some(face) = slot.face.as_mut() else {
                continue;
            };
            let n = face.verts.len();
            let hit = (0..n).find(|&i| {
                let (p, q) = (face.verts[i], face.verts[(i + 1) % n]);
                (p == a && q == b) || (p == b && q == a)
            });
            if let Some(i) = hit {
                face.verts.insert(i + 1, vertex);
                updated += 1;
            }
        }
        self.touch();
        updated
    }

    /// Insert a run of vertices, ordered from `a` to `b`, along edge `a-b`.
    fn insert_chain(&mut self, a: u32, b: u32, chain: &[u32]) {
        let mut prev = a;
        for &v in chain {
            self.insert_on_edge(prev, b, v);
            prev = v;
        }
    }

    /// Split edge `a-b` at parameter `t`, updating every face that uses it.
    pub fn split_edge(&mut self, a: u32, b: u32, t: f32) -> ShipResult<u32> {
        if !(t > 0.0 && t < 1.0) {
            return Err(ShipError::range(0.0, t));
        }
        let used = self.faces().any(|(_, face)| {
            face.edges().any(|(p, q)| (p == a && q == b) || (p == b && q == a))
        });
        if !used {
            return Err(ShipError::topology(format!("no face uses edge {}-{}", a, b)));
        }
        let position = self.position(a).lerp(self.position(b), t);
        let vertex = self.add_vertex(position);
        self.insert_on_edge(a, b, vertex);
        Ok(vertex)
    }

    /// Cut every edge of a face into `cuts + 1` equal pieces.
    pub fn subdivide_face_edges(&mut self, id: FaceId, cuts: usize) -> ShipResult<()> {
        let verts = self.face(id)?.verts.clone();
        if cuts == 0 {
            return Ok(());
        }
        let n = verts.len();
        for i in 0..n {
            let (a, b) = (verts[i], verts[(i + 1) % n]);
            let (pa, pb) = (self.position(a), self.position(b));
            let chain: Vec<u32> = (1..=cuts)
                .map(|k| self.add_vertex(pa.lerp(pb, k as f32 / (cuts + 1) as f32)))
                .collect();
            self.insert_chain(a, b, &chain);
        }
        Ok(())
    }

    /// Split a quad into a `cells_u` x `cells_v` grid. Boundary vertices are
    /// shared with the neighbours of the quad, which keeps the surface closed.
    pub fn split_grid(&mut self, id: FaceId, cells_u: usize, cells_v: usize) -> ShipResult<Grid> {
        let sides = self.face(id)?.sides();
        if sides != 4 {
            return Err(ShipError::UnsupportedPolygon { sides });
        }
        if cells_u == 0 || cells_v == 0 {
            return Err(ShipError::range(1.0, cells_u.min(cells_v) as f32));
        }

        let face = self.remove_face(id)?;
        let c = [face.verts[0], face.verts[1], face.verts[2], face.verts[3]];
        let p = c.map(|v| self.position(v));

        // grid[j][i]: i along c0 -> c1, j along c0 -> c3
        let mut grid = vec![vec![0u32; cells_u + 1]; cells_v + 1];
        let mut interior = Vec::new();
        for (j, row) in grid.iter_mut().enumerate() {
            for (i, slot) in row.iter_mut().enumerate() {
                let corner = match (i, j) {
                    (0, 0) => Some(c[0]),
                    (i, 0) if i == cells_u => Some(c[1]),
                    (i, j) if i == cells_u && j == cells_v => Some(c[2]),
                    (0, j) if j == cells_v => Some(c[3]),
                    _ => None,
                };
                *slot = match corner {
                    Some(v) => v,
                    None => {
                        let u = i as f32 / cells_u as f32;
                        let w = j as f32 / cells_v as f32;
                        let position = p[0].lerp(p[1], u).lerp(p[3].lerp(p[2], u), w);
                        let v = self.add_vertex(position);
                        if i > 0 && i < cells_u && j > 0 && j < cells_v {
                            interior.push(v);
                        }
                        v
                    }
                };
            }
        }

        let bottom: Vec<u32> = (1..cells_u).map(|i| grid[0][i]).collect();
        let right: Vec<u32> = (1..cells_v).map(|j| grid[j][cells_u]).collect();
        let top: Vec<u32> = (1..cells_u).rev().map(|i| grid[cells_v][i]).collect();
        let left: Vec<u32> = (1..cells_v).rev().map(|j| grid[j][0]).collect();
        self.insert_chain(c[0], c[1], &bottom);
        self.insert_chain(c[1], c[2], &right);
        self.insert_chain(c[2], c[3], &top);
        self.insert_chain(c[3], c[0], &left);

        let mut cells = Vec::with_capacity(cells_u * cells_v);
        for j in 0..cells_v {
            for i in 0..cells_u {
                cells.push(self.add_face(
                    vec![grid[j][i], grid[j][i + 1], grid[j + 1][i + 1], grid[j + 1][i]],
                    face.tags,
                    face.material,
                )?);
            }
        }

        Ok(Grid {
            cells,
            cells_u,
            cells_v,
            interior,
        })
    }
}
