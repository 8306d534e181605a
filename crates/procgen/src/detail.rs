//! Surface detail: engines, plating, turrets and the other greebles grown out
//! of exposed hull faces.
//!
//! Planning draws one value per eligible face from the geometry stream and
//! picks at most one [`DetailKind`] from the face orientation. Every detail
//! starts by insetting its face, so it only ever edits that face and the faces
//! it creates itself. Engines, cylinders, turrets and antennas are laid out on
//! a grid over the inset face. Decisions that only pick a material (lit
//! plating walls, glowing pits, dark antennas) come from the material stream.

use crate::classify::{FaceInfo, Orientation};
use crate::config::ShipConfig;
use glam::{Vec2, Vec3};
use noise::{NoiseFn, Perlin};
use ship_core::{RandomStream, ShipResult, Transform};
use ship_mesh::{Extruded, Extrusion, FaceId, FaceTag, Mesh};
use std::collections::BTreeMap;
use std::f32::consts::{FRAC_1_SQRT_2, FRAC_PI_2, FRAC_PI_4, PI, TAU};

/// Faces smaller than this get no detail.
pub const MIN_DETAIL_AREA: f32 = 0.01;

/// Sampling frequency of the plating jitter noise.
const JITTER_FREQUENCY: f64 = 3.7;
/// Largest jitter of a plating grid vertex, relative to the cell size.
const JITTER_AMPLITUDE: f32 = 0.15;
/// Latitude rings of a dome, excluding the cap.
const DOME_RINGS: u32 = 3;
/// Chance of a spire in each cell of an antenna field.
const ANTENNA_CELL_CHANCE: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DetailKind {
    Engine,
    Cylinders,
    Plating,
    LightPits,
    Turret,
    Antenna,
    Cockpit,
    Dome,
    Disc,
    EmitPanel,
}

/// A detail chosen for a face, with the face frame at planning time.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailPlacement {
    pub face: FaceId,
    pub kind: DetailKind,
    pub frame: Transform,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailReport {
    /// Faces that passed the exposure, aspect and area filters.
    pub candidates: usize,
    pub placements: Vec<DetailPlacement>,
    pub counts: BTreeMap<DetailKind, usize>,
}

#[derive(Debug, Default)]
struct Planner {
    rear_seen: bool,
    forward_seen: bool,
    side_seen: bool,
}

impl Planner {
    fn pick(&mut self, info: &FaceInfo, r: f32) -> Option<DetailKind> {
        match info.orientation {
            Orientation::Rear => {
                let first = !std::mem::replace(&mut self.rear_seen, true);
                Some(if first || r > 0.75 {
                    DetailKind::Engine
                } else if r > 0.5 {
                    DetailKind::Cylinders
                } else if r > 0.25 {
                    DetailKind::Plating
                } else {
                    DetailKind::EmitPanel
                })
            }
            Orientation::Forward => {
                let first = !std::mem::replace(&mut self.forward_seen, true);
                Some(if info.outward && r > 0.7 {
                    DetailKind::Antenna
                } else if first && r < 0.15 {
                    DetailKind::Cockpit
                } else if r > 0.4 {
                    DetailKind::Plating
                } else {
                    DetailKind::EmitPanel
                })
            }
            Orientation::Top => {
                if info.outward && r > 0.7 {
                    Some(DetailKind::Antenna)
                } else if r > 0.6 {
                    Some(DetailKind::Plating)
                } else if r > 0.3 {
                    Some(DetailKind::Cylinders)
                } else {
                    None
                }
            }
            Orientation::Bottom => {
                if r > 0.75 {
                    Some(DetailKind::Disc)
                } else if r > 0.5 {
                    Some(DetailKind::Plating)
                } else if r > 0.25 {
                    Some(DetailKind::Turret)
                } else {
                    None
                }
            }
            Orientation::Left | Orientation::Right => {
                let first = !std::mem::replace(&mut self.side_seen, true);
                Some(if first || r > 0.75 {
                    DetailKind::Turret
                } else if r > 0.6 {
                    DetailKind::Plating
                } else if r > 0.4 {
                    DetailKind::Dome
                } else {
                    DetailKind::LightPits
                })
            }
        }
    }
}

fn eligible(info: &FaceInfo, config: &ShipConfig) -> bool {
    info.exposed && info.area >= MIN_DETAIL_AREA && info.aspect <= config.tuning.max_detail_aspect
}

/// Choose the details of a classified mesh, in face order.
pub fn plan_details(
    mesh: &Mesh,
    infos: &[FaceInfo],
    config: &ShipConfig,
    geometry: &mut RandomStream,
) -> ShipResult<Vec<DetailPlacement>> {
    let mut planner = Planner::default();
    let mut placements = Vec::new();
    for info in infos.iter().filter(|info| eligible(info, config)) {
        let r = geometry.unit();
        if let Some(kind) = planner.pick(info, r) {
            placements.push(DetailPlacement {
                face: info.id,
                kind,
                frame: mesh.frame(info.id)?,
            });
        }
    }
    Ok(placements)
}

/// Plan and build the details of every eligible face.
pub fn add_details(
    mesh: &mut Mesh,
    infos: &[FaceInfo],
    config: &ShipConfig,
    geometry: &mut RandomStream,
    material: &mut RandomStream,
) -> ShipResult<DetailReport> {
    let placements = plan_details(mesh, infos, config, geometry)?;
    let mut counts = BTreeMap::new();
    for placement in &placements {
        apply_detail(mesh, placement, geometry, material)?;
        *counts.entry(placement.kind).or_insert(0) += 1;
    }

    let report = DetailReport {
        candidates: infos.iter().filter(|info| eligible(info, config)).count(),
        placements,
        counts,
    };
    log::debug!(
        "detail: {} placements on {} candidates {:?}, {} faces",
        report.placements.len(),
        report.candidates,
        report.counts,
        mesh.face_count()
    );
    Ok(report)
}

/// Build one detail on its face.
pub fn apply_detail(
    mesh: &mut Mesh,
    placement: &DetailPlacement,
    geometry: &mut RandomStream,
    material: &mut RandomStream,
) -> ShipResult<()> {
    let face = placement.face;
    match placement.kind {
        DetailKind::Engine => engine(mesh, face, geometry),
        DetailKind::Cylinders => cylinders(mesh, face, geometry),
        DetailKind::Plating => plating(mesh, face, geometry, material),
        DetailKind::LightPits => light_pits(mesh, face, geometry, material),
        DetailKind::Turret => turret(mesh, face, &placement.frame, geometry),
        DetailKind::Antenna => antenna(mesh, face, geometry, material),
        DetailKind::Cockpit => cockpit(mesh, face),
        DetailKind::Dome => dome(mesh, face),
        DetailKind::Disc => disc(mesh, face),
        DetailKind::EmitPanel => mesh.tag(&[face], FaceTag::Emit),
    }
}

/// Faces created by one detail, tagged together once it is built.
#[derive(Debug, Default)]
struct Parts(Vec<FaceId>);

impl Parts {
    fn push(&mut self, out: Extruded) -> FaceId {
        self.0.extend(out.sides);
        self.0.push(out.top);
        out.top
    }

    /// Faces that were not consumed by later steps.
    fn live(&self, mesh: &Mesh) -> Vec<FaceId> {
        self.0.iter().copied().filter(|id| mesh.contains(*id)).collect()
    }
}

/// Split a quad into a grid with a drawn number of cells per axis. Other
/// polygons stay a single cell.
fn grid_cells(mesh: &mut Mesh, id: FaceId, range: (i64, i64), geometry: &mut RandomStream) -> ShipResult<Vec<FaceId>> {
    let cells_u = geometry.next_int(range.0, range.1)? as usize;
    let cells_v = geometry.next_int(range.0, range.1)? as usize;
    if mesh.face(id)?.sides() != 4 {
        return Ok(vec![id]);
    }
    Ok(mesh.split_grid(id, cells_u, cells_v)?.cells)
}

/// Move the loop of a face onto the ellipse inscribed in its extent. The
/// starting angle snaps to a multiple of the step, so loops with a multiple of
/// four sides keep a vertex on each end of both frame axes.
fn circularize(mesh: &mut Mesh, id: FaceId) -> ShipResult<()> {
    let frame = mesh.frame(id)?;
    let half = mesh.face_size(id)? * 0.5;
    let verts = mesh.face(id)?.verts().to_vec();
    let step = TAU / verts.len() as f32;
    let first = frame.inverse_transform_point(mesh.position(verts[0]));
    let start = (first.y.atan2(first.x) / step).round() * step;
    for (k, &v) in verts.iter().enumerate() {
        let angle = start + step * k as f32;
        let local = Vec3::new(half.x * angle.cos(), half.y * angle.sin(), 0.0);
        mesh.set_position(v, frame.transform_point(local));
    }
    Ok(())
}

/// Inset, cut each edge `cuts` times and round off. A quad becomes a
/// `4 * (cuts + 1)`-gon.
fn round_base(mesh: &mut Mesh, face: FaceId, inset: f32, cuts: usize) -> ShipResult<FaceId> {
    let base = mesh.inset(face, inset)?.top;
    mesh.subdivide_face_edges(base, cuts)?;
    circularize(mesh, base)?;
    Ok(base)
}

fn engine(mesh: &mut Mesh, face: FaceId, geometry: &mut RandomStream) -> ShipResult<()> {
    let top = mesh.inset(face, 0.1)?.top;
    let max_cuts = ((4.0 - mesh.aspect_ratio(top)?).floor() as i64).clamp(1, 3);
    let cells = grid_cells(mesh, top, (1, max_cuts), geometry)?;
    mesh.tag(&cells, FaceTag::Engine)?;
    mesh.tag(&cells, FaceTag::Dark)?;

    for cell in cells {
        let length = geometry.next_float(0.1, 0.2)?;
        let outer = 1.0 / geometry.next_float(1.3, 1.6)?;
        let inner = 1.0 / geometry.next_float(1.05, 1.1)?;
        let housing = mesh.extrude(cell, Extrusion::along(length).uniform(outer))?;
        let nozzle = mesh.extrude(housing.top, Extrusion::along(-0.9 * length).uniform(inner))?;
        mesh.tag(&nozzle.all(), FaceTag::KeepSharp)?;
        mesh.tag(&[nozzle.top], FaceTag::EngineGlow)?;
    }
    Ok(())
}

/// Stubby cylinders, one per grid cell. Quad cells round off to 8 or 12 sides.
fn cylinders(mesh: &mut Mesh, face: FaceId, geometry: &mut RandomStream) -> ShipResult<()> {
    let top = mesh.inset(face, 0.05)?.top;
    let cells = grid_cells(mesh, top, (1, 3), geometry)?;
    let cuts = geometry.next_int(1, 2)? as usize;
    for cell in cells {
        let base = round_base(mesh, cell, 0.35, cuts)?;
        let height = 0.5 * mesh.face_size(base)?.min_element();
        let body = mesh.extrude(base, Extrusion::along(height))?;
        mesh.inset(body.top, 0.15)?;
    }
    Ok(())
}

/// Nudge grid vertices within the face plane with Perlin noise.
fn jitter(mesh: &mut Mesh, verts: &[u32], frame: &Transform, cell: Vec2, seed: u32) {
    let perlin = Perlin::new(seed);
    let reach = cell * JITTER_AMPLITUDE;
    for &v in verts {
        let p = mesh.position(v);
        let sample = [
            p.x as f64 * JITTER_FREQUENCY,
            p.y as f64 * JITTER_FREQUENCY,
            p.z as f64 * JITTER_FREQUENCY,
        ];
        let du = perlin.get(sample).clamp(-1.0, 1.0) as f32;
        let dv = perlin.get([sample[0] + 17.5, sample[1] - 4.25, sample[2]]).clamp(-1.0, 1.0) as f32;
        let offset = frame.right() * du * reach.x + frame.up() * dv * reach.y;
        mesh.set_position(v, p + offset);
    }
}

fn plating(mesh: &mut Mesh, face: FaceId, geometry: &mut RandomStream, material: &mut RandomStream) -> ShipResult<()> {
    let top = mesh.inset(face, 0.05)?.top;
    let frame = mesh.frame(top)?;
    let size = mesh.face_size(top)?;
    let cells_u = geometry.next_int(2, 4)? as usize;
    let cells_v = geometry.next_int(2, 4)? as usize;
    let noise_seed = geometry.next_int(0, u32::MAX as i64)? as u32;

    let cells = if mesh.face(top)?.sides() == 4 {
        let grid = mesh.split_grid(top, cells_u, cells_v)?;
        let cell = size / Vec2::new(cells_u as f32, cells_v as f32);
        jitter(mesh, &grid.interior, &frame, cell, noise_seed);
        grid.cells
    } else {
        vec![top]
    };

    let mut parts = Parts::default();
    for cell in cells {
        let height = geometry.next_float(0.025, 0.15)?;
        let plate = mesh.extrude(cell, Extrusion::along(height).uniform(0.8))?;
        if material.chance(0.5) {
            let mut walls = Vec::new();
            for &side in &plate.sides {
                if mesh.normal(side)?.z.abs() < FRAC_1_SQRT_2 {
                    walls.push(side);
                }
            }
            mesh.tag(&walls, FaceTag::Emit)?;
        }
        parts.push(plate);
    }
    mesh.tag(&parts.live(mesh), FaceTag::Plating)
}

fn light_pits(mesh: &mut Mesh, face: FaceId, geometry: &mut RandomStream, material: &mut RandomStream) -> ShipResult<()> {
    let top = mesh.inset(face, 0.1)?.top;
    for cell in grid_cells(mesh, top, (2, 4), geometry)? {
        let pit = mesh.inset(cell, 0.3)?.top;
        let depth = 0.25 * mesh.face_size(pit)?.min_element();
        let floor = mesh.extrude(pit, Extrusion::along(-depth))?.top;
        if material.chance(0.6) {
            mesh.tag(&[floor], FaceTag::Emit)?;
        }
    }
    Ok(())
}

fn turret(mesh: &mut Mesh, face: FaceId, frame: &Transform, geometry: &mut RandomStream) -> ShipResult<()> {
    let top = mesh.inset(face, 0.05)?.top;
    let mut parts = Parts::default();
    for cell in grid_cells(mesh, top, (1, 2), geometry)? {
        mount_turret(mesh, cell, frame, geometry, &mut parts)?;
    }
    mesh.tag(&parts.live(mesh), FaceTag::Turret)
}

/// One turret on a grid cell: round foundation, spun housing and a barrel
/// raised about the face's `X` axis.
fn mount_turret(
    mesh: &mut Mesh,
    cell: FaceId,
    frame: &Transform,
    geometry: &mut RandomStream,
    parts: &mut Parts,
) -> ShipResult<()> {
    let base = round_base(mesh, cell, 0.2, 1)?;
    let size = mesh.face_size(base)?.min_element();
    let spin = geometry.next_float(0.0, FRAC_PI_2)?;
    let elevation = geometry.next_float(0.0, FRAC_PI_4)?;

    let foundation = parts.push(mesh.extrude(base, Extrusion::along(0.1 * size).uniform(0.9))?);
    let housing = parts.push(mesh.extrude(foundation, Extrusion::along(0.25 * size).uniform(0.7).rolled(spin))?);
    let muzzle = parts.push(mesh.inset(housing, 0.6)?);
    let pivot = mesh.centroid(muzzle)?;
    let barrel = parts.push(mesh.extrude(muzzle, Extrusion::along(0.6 * size))?);
    mesh.rotate(&[barrel], frame.right(), elevation, pivot)?;
    Ok(())
}

/// A field of spires: each cell of a 4-10 x 4-10 grid sprouts one with a
/// small chance, and an empty field gets one in a drawn cell.
fn antenna(mesh: &mut Mesh, face: FaceId, geometry: &mut RandomStream, material: &mut RandomStream) -> ShipResult<()> {
    let top = mesh.inset(face, 0.05)?.top;
    let reach = mesh.area(top)?.sqrt();
    let cells = grid_cells(mesh, top, (4, 10), geometry)?;
    let mut picked: Vec<FaceId> = cells
        .iter()
        .copied()
        .filter(|_| geometry.chance(ANTENNA_CELL_CHANCE))
        .collect();
    if picked.is_empty() {
        let k = geometry.next_int(0, cells.len() as i64 - 1)? as usize;
        picked.push(cells[k]);
    }
    for cell in picked {
        spire(mesh, cell, reach, geometry, material)?;
    }
    Ok(())
}

fn spire(
    mesh: &mut Mesh,
    cell: FaceId,
    reach: f32,
    geometry: &mut RandomStream,
    material: &mut RandomStream,
) -> ShipResult<()> {
    let base = mesh.inset(cell, 0.3)?.top;
    let size = mesh.face_size(base)?.min_element();
    let height = geometry.next_float(0.1, 1.5)? * reach;

    let mut parts = Parts::default();
    let plinth = parts.push(mesh.extrude(base, Extrusion::along(0.05 * size).uniform(0.6))?);
    let mast = parts.push(mesh.extrude(plinth, Extrusion::along(height).uniform(0.2))?);
    parts.push(mesh.extrude(mast, Extrusion::along(0.1 * size).uniform(0.5))?);

    let faces = parts.live(mesh);
    mesh.tag(&faces, FaceTag::Antenna)?;
    if material.chance(0.5) {
        mesh.tag(&faces, FaceTag::Dark)?;
    }
    Ok(())
}

fn cockpit(mesh: &mut Mesh, face: FaceId) -> ShipResult<()> {
    let base = mesh.inset(face, 0.25)?.top;
    let size = mesh.face_size(base)?.min_element();

    let mut parts = Parts::default();
    let canopy = parts.push(mesh.extrude(base, Extrusion::along(0.15 * size).uniform(0.85))?);
    parts.push(mesh.extrude(canopy, Extrusion::along(0.1 * size).uniform(0.6))?);

    let faces = parts.live(mesh);
    mesh.tag(&faces, FaceTag::Cockpit)?;
    mesh.tag(&faces, FaceTag::Emit)
}

fn dome(mesh: &mut Mesh, face: FaceId) -> ShipResult<()> {
    let mut cap = round_base(mesh, face, 0.15, 3)?;
    let radius = 0.5 * mesh.face_size(cap)?.min_element();
    let mut latitude = 0.0f32;
    for ring in 1..=DOME_RINGS {
        let next = ring as f32 * PI / 8.0;
        let rise = radius * (next.sin() - latitude.sin());
        let shrink = next.cos() / latitude.cos();
        cap = mesh.extrude(cap, Extrusion::along(rise).uniform(shrink))?.top;
        latitude = next;
    }
    Ok(())
}

fn disc(mesh: &mut Mesh, face: FaceId) -> ShipResult<()> {
    let base = round_base(mesh, face, 0.1, 3)?;
    let depth = 0.125 * mesh.face_size(base)?.min_element();
    let pad = mesh.extrude(base, Extrusion::along(depth).uniform(1.2))?;
    let ring = mesh.inset(pad.top, 0.3)?;
    mesh.tag(&ring.sides, FaceTag::GlowDisc)?;
    mesh.extrude(ring.top, Extrusion::along(-0.5 * depth))?;
    Ok(())
}
