//! Hull builder: grows the main spine of the ship from a seed box.
//!
//! Two growth tips start on the `+X` (forward) and `-X` (rear) faces of the
//! box. Every iteration picks one active tip and pushes it further out,
//! occasionally perturbing it with a scale, a roll, a sideways shift or a
//! tilt. The most recent face of each end is always the only tip, so the
//! hull stays a single connected spine.

use crate::config::{ShipConfig, Tuning};
use glam::{Vec2, Vec3};
use ship_core::{RandomStream, ShipResult};
use ship_mesh::{Extrusion, FaceId, FaceTag, Mesh};
use std::f32::consts::SQRT_2;

/// Longest hull step: an extrusion plus its optional extra quarter.
const STEP_REACH: f32 = 1.25;
/// Largest sideways shift per step: `0.4` of a `2.0`-high seed box.
const SHIFT_REACH: f32 = 0.8;

/// Which end of the ship a tip grows from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HullEnd {
    Forward,
    Rear,
}

#[derive(Debug, Clone)]
struct GrowthTip {
    end: HullEnd,
    face: FaceId,
    /// Length of every segment grown from this tip.
    segment_length: f32,
    /// Accumulated scale of the tip face along its frame axes.
    scale: Vec2,
    segments: u32,
    retired: bool,
}

/// Summary of the hull builder.
#[derive(Debug, Clone, PartialEq)]
pub struct HullReport {
    pub seed_scale: Vec3,
    /// Segment count drawn for this ship.
    pub planned_segments: u32,
    pub forward_segments: u32,
    pub rear_segments: u32,
    pub ribbed_segments: u32,
    /// Final forward and rear tip faces.
    pub tips: Vec<FaceId>,
}

impl HullReport {
    pub fn total_segments(&self) -> u32 {
        self.forward_segments + self.rear_segments
    }
}

/// Bound on every vertex coordinate after the hull builder, for a config.
///
/// A tip centroid starts within 1 of the origin (half the largest seed box),
/// moves at most `STEP_REACH + SHIFT_REACH` step lengths per segment and is
/// only ever rotated about the origin. Tip vertices lie within half a
/// diagonal of the largest tip face from their centroid.
pub fn max_hull_extent(config: &ShipConfig) -> f32 {
    let tuning = &config.tuning;
    1.0 + config.num_hull_segments as f32 * (STEP_REACH + SHIFT_REACH) * tuning.max_step_distance
        + SQRT_2 * tuning.max_tip_scale
}

/// Build the hull into an empty mesh.
pub fn build_hull(mesh: &mut Mesh, config: &ShipConfig, rng: &mut RandomStream) -> ShipResult<HullReport> {
    let tuning = &config.tuning;
    let seed_scale = Vec3::new(
        rng.next_float(0.75, 2.0)?,
        rng.next_float(0.75, 2.0)?,
        rng.next_float(0.75, 2.0)?,
    );
    let faces = mesh.add_box(seed_scale)?;

    let (min, max) = config.hull_segment_range();
    let planned = rng.next_int(min, max)? as u32;

    let mut tips = Vec::with_capacity(2);
    for (end, face) in [(HullEnd::Forward, faces[0]), (HullEnd::Rear, faces[1])] {
        tips.push(GrowthTip {
            end,
            face,
            segment_length: rng.next_float(0.3, 1.0)? * tuning.max_step_distance,
            scale: Vec2::ONE,
            segments: 0,
            retired: false,
        });
    }

    let mut ribbed = 0;
    for i in 0..planned {
        let active: Vec<(usize, f32)> = tips
            .iter()
            .enumerate()
            .filter(|(_, tip)| !tip.retired)
            .map(|(index, _)| (index, 1.0))
            .collect();
        if active.is_empty() {
            log::debug!("hull: every tip retired after {} segments", i);
            break;
        }
        let index = *rng.choice(&active)?;
        let last = i + 1 == planned;
        let tip = &mut tips[index];

        if rng.chance(0.9) {
            grow_segment(mesh, tip, seed_scale, last, tuning, rng)?;
        } else {
            grow_ribbed_segment(mesh, tip, rng)?;
            ribbed += 1;
        }
        tip.segments += 1;

        if tip.scale.min_element() < tuning.min_tip_scale {
            log::debug!("hull: {:?} tip retired at scale {:?}", tip.end, tip.scale);
            tip.retired = true;
        }
    }

    let tip_faces: Vec<FaceId> = tips.iter().map(|tip| tip.face).collect();
    mesh.tag(&tip_faces, FaceTag::HullTip)?;

    let segments_of = |end: HullEnd| {
        tips.iter()
            .filter(|tip| tip.end == end)
            .map(|tip| tip.segments)
            .sum::<u32>()
    };
    let report = HullReport {
        seed_scale,
        planned_segments: planned,
        forward_segments: segments_of(HullEnd::Forward),
        rear_segments: segments_of(HullEnd::Rear),
        ribbed_segments: ribbed,
        tips: tip_faces,
    };
    log::debug!(
        "hull: seed {:?}, {} forward + {} rear segments ({} ribbed), {} faces",
        report.seed_scale,
        report.forward_segments,
        report.rear_segments,
        report.ribbed_segments,
        mesh.face_count()
    );
    Ok(report)
}

/// Regular segment: extrude, then maybe scale, roll, shift and tilt the tip.
fn grow_segment(
    mesh: &mut Mesh,
    tip: &mut GrowthTip,
    seed_scale: Vec3,
    last: bool,
    tuning: &Tuning,
    rng: &mut RandomStream,
) -> ShipResult<()> {
    let length = tip.segment_length;
    tip.face = mesh.extrude(tip.face, Extrusion::along(length))?.top;
    if rng.chance(0.25) {
        tip.face = mesh.extrude(tip.face, Extrusion::along(length * 0.25))?.top;
    }

    if rng.chance(0.5) {
        let mut factor = Vec2::new(rng.next_float(1.2, 1.5)?, rng.next_float(1.2, 1.5)?);
        let shrink = last || rng.chance(0.5) || (tip.scale * factor).max_element() > tuning.max_tip_scale;
        if shrink {
            factor = Vec2::ONE / factor;
        }
        let factor = factor.max(Vec2::splat(tuning.min_scale_fraction));
        mesh.scale(&[tip.face], factor.extend(1.0))?;
        tip.scale *= factor;
    }

    if rng.chance(0.5) {
        let roll = rng.next_float(-tuning.roll_degrees, tuning.roll_degrees)?;
        mesh.roll(tip.face, roll.to_radians())?;
    }

    if rng.chance(0.5) {
        let shift = rng.next_float(0.1, 0.4)? * seed_scale.z * length * rng.sign();
        mesh.translate(&[tip.face], Vec3::new(0.0, 0.0, shift))?;
    }

    if rng.chance(0.5) {
        let tilt = tuning.tilt_degrees.to_radians() * rng.sign();
        mesh.rotate(&[tip.face], Vec3::Y, tilt, Vec3::ZERO)?;
    }
    Ok(())
}

/// Corrugated segment: every rib pinches the tip in and lets it out again.
fn grow_ribbed_segment(mesh: &mut Mesh, tip: &mut GrowthTip, rng: &mut RandomStream) -> ShipResult<()> {
    let ribs = rng.next_int(2, 4)?;
    let rib_scale = rng.next_float(0.75, 0.95)?;
    let rib_length = tip.segment_length / ribs as f32;

    let mut face = tip.face;
    for _ in 0..ribs {
        face = mesh.extrude(face, Extrusion::along(rib_length * 0.25))?.top;
        face = mesh.extrude(face, Extrusion::default().uniform(rib_scale))?.top;
        face = mesh.extrude(face, Extrusion::along(rib_length * 0.5))?.top;
        face = mesh.extrude(face, Extrusion::default().uniform(1.0 / rib_scale))?.top;
        face = mesh.extrude(face, Extrusion::along(rib_length * 0.25))?.top;
    }
    tip.face = face;
    Ok(())
}
