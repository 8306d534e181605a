//! Final pass: optional mirror symmetry, bevel, recentring and material
//! resolution.

use crate::config::ShipConfig;
use glam::Vec3;
use ship_core::{RandomStream, ShipResult};
use ship_mesh::{Axis, BevelReport, BevelSettings, MaterialSlot, Mesh, MirrorReport};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinishReport {
    /// Mirror across the `Y = 0` plane (left/right), if it happened.
    pub horizontal: Option<MirrorReport>,
    /// Mirror across the `Z = 0` plane (top/bottom), if it happened.
    pub vertical: Option<MirrorReport>,
    pub bevel: Option<BevelReport>,
    /// Translation applied by recentring.
    pub offset: Vec3,
    /// Faces per material slot, indexed by [`MaterialSlot::index`].
    pub material_counts: [usize; 5],
    pub closed: bool,
}

pub fn finish(mesh: &mut Mesh, config: &ShipConfig, geometry: &mut RandomStream) -> ShipResult<FinishReport> {
    let tuning = &config.tuning;
    let mut report = FinishReport::default();

    if config.allow_horizontal_symmetry && geometry.chance(tuning.symmetry_probability) {
        report.horizontal = Some(mesh.mirror(Axis::Y, tuning.weld_epsilon)?);
    }
    if config.allow_vertical_symmetry && geometry.chance(tuning.symmetry_probability) {
        report.vertical = Some(mesh.mirror(Axis::Z, tuning.weld_epsilon)?);
    }

    if config.bevel_width > 0.0 {
        report.bevel = Some(mesh.bevel(BevelSettings {
            fraction: config.bevel_width,
        })?);
    }

    if config.recenter {
        report.offset = mesh.recenter();
    }

    for id in mesh.face_ids() {
        let slot = MaterialSlot::resolve(mesh.face(id)?.tags());
        mesh.set_material(id, slot)?;
        report.material_counts[slot.index() as usize] += 1;
    }

    report.closed = mesh.is_closed();
    if !report.closed {
        log::warn!("finished mesh is not closed ({} faces)", mesh.face_count());
    }
    log::debug!(
        "finish: mirrored y={} z={}, bevel {:?}, offset {:?}, {} vertices, {} faces",
        report.horizontal.is_some(),
        report.vertical.is_some(),
        report.bevel,
        report.offset,
        mesh.vertex_count(),
        mesh.face_count()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ship_mesh::{Extrusion, FaceTag};

    fn lopsided() -> Mesh {
        let mut mesh = Mesh::new();
        let faces = mesh.add_box(Vec3::ONE).unwrap();
        let arm = mesh.extrude(faces[2], Extrusion::along(1.0).uniform(0.5)).unwrap();
        mesh.tag(&[arm.top], FaceTag::EngineGlow).unwrap();
        mesh.tag(&[faces[4]], FaceTag::Dark).unwrap();
        mesh
    }

    #[test]
    fn mirror_and_bevel_keep_the_ship_closed() {
        let config = ShipConfig {
            tuning: crate::config::Tuning {
                symmetry_probability: 1.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut mesh = lopsided();
        let mut rng = RandomStream::new("geometry", 3);
        let report = finish(&mut mesh, &config, &mut rng).unwrap();
        assert!(report.horizontal.is_some());
        assert!(report.vertical.is_none());
        assert!(report.bevel.is_some());
        assert!(report.closed);
        mesh.validate().unwrap();

        // The arm now reaches out on both sides
        let (min, max) = mesh.bounds().unwrap();
        assert!((min.y + max.y).abs() < 1e-4);
        assert!(mesh.surface_centroid().length() < 1e-4);
    }

    #[test]
    fn materials_follow_tag_priority() {
        let config = ShipConfig {
            allow_horizontal_symmetry: false,
            bevel_width: 0.0,
            recenter: false,
            ..Default::default()
        };
        let mut mesh = lopsided();
        let mut rng = RandomStream::new("geometry", 1);
        let report = finish(&mut mesh, &config, &mut rng).unwrap();
        assert_eq!(report.material_counts[MaterialSlot::ExhaustBurn.index() as usize], 1);
        assert_eq!(report.material_counts[MaterialSlot::HullDark.index() as usize], 1);
        assert_eq!(report.material_counts.iter().sum::<usize>(), mesh.face_count());
        assert_eq!(report.offset, Vec3::ZERO);
        for (_, face) in mesh.faces() {
            assert_eq!(face.material(), MaterialSlot::resolve(face.tags()));
        }
        // Nothing was drawn for symmetry that is not allowed
        assert_eq!(rng.draws(), 0);
    }
}
