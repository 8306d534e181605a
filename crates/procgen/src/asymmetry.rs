//! Asymmetry pass: grows secondary branches off the hull.

use crate::classify::classify_faces;
use crate::config::{ShipConfig, Tuning};
use ship_core::{RandomStream, ShipResult};
use ship_mesh::{Extrusion, FaceId, FaceTag, Mesh, AREA_EPSILON};

/// Faces longer than this relative to their width never root a branch.
const MAX_ROOT_ASPECT: f32 = 4.0;
/// Exposed side faces are picked this many times more often than others.
const SIDE_WEIGHT: f32 = 3.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub root: FaceId,
    pub pieces: u32,
    pub piece_length: f32,
    /// Outermost face of the branch.
    pub tip: FaceId,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AsymmetryReport {
    pub planned: u32,
    pub branches: Vec<Branch>,
}

/// Faces a branch may grow from, with their selection weights.
fn candidates(mesh: &Mesh, tuning: &Tuning) -> ShipResult<Vec<(FaceId, f32)>> {
    let mut out = Vec::new();
    for info in classify_faces(mesh, tuning)? {
        let face = mesh.face(info.id)?;
        if face.has_tag(FaceTag::HullTip) || face.has_tag(FaceTag::Branch) {
            continue;
        }
        if info.area <= AREA_EPSILON * 10.0 || info.aspect > MAX_ROOT_ASPECT {
            continue;
        }
        let weight = if info.exposed && info.normal.y.abs() > 0.5 {
            SIDE_WEIGHT
        } else {
            1.0
        };
        out.push((info.id, weight));
    }
    Ok(out)
}

/// Grow the configured number of branches. Each branch is shorter than the
/// previous one by `branch_scale_decay` and every face it creates is tagged
/// `Branch`, which also keeps later branches from growing out of it.
pub fn grow_branches(mesh: &mut Mesh, config: &ShipConfig, rng: &mut RandomStream) -> ShipResult<AsymmetryReport> {
    let tuning = &config.tuning;
    let (min, max) = config.asymmetry_segment_range();
    let planned = rng.next_int(min, max)? as u32;
    let mut report = AsymmetryReport {
        planned,
        branches: Vec::with_capacity(planned as usize),
    };

    let mut decay = 1.0;
    for _ in 0..planned {
        let options = candidates(mesh, tuning)?;
        if options.is_empty() {
            log::debug!("asymmetry: no candidate faces left");
            break;
        }
        let root = *rng.choice(&options)?;
        let pieces = rng.next_int(1, 3)? as u32;
        let piece_length = rng.next_float(0.1, 0.4)? * tuning.max_step_distance * decay;

        let mut created = Vec::new();
        let mut face = root;
        for _ in 0..pieces {
            let out = mesh.extrude(face, Extrusion::along(piece_length))?;
            created.extend(out.sides.iter().copied());
            face = out.top;
            if rng.chance(0.75) {
                let shrink = 1.0 / rng.next_float(1.1, 1.5)?;
                mesh.scale(&[face], glam::Vec3::new(shrink, shrink, 1.0))?;
            }
        }
        created.push(face);
        mesh.tag(&created, FaceTag::Branch)?;

        report.branches.push(Branch {
            root,
            pieces,
            piece_length,
            tip: face,
        });
        decay *= tuning.branch_scale_decay;
    }

    log::debug!(
        "asymmetry: {} of {} branches grown, {} faces",
        report.branches.len(),
        planned,
        mesh.face_count()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hull::build_hull;
    use ship_core::Seed;

    fn hull(seed: u64, config: &ShipConfig) -> (Mesh, RandomStream) {
        let mut mesh = Mesh::new();
        let mut rng = RandomStream::new("geometry", Seed::from(seed).value());
        build_hull(&mut mesh, config, &mut rng).unwrap();
        (mesh, rng)
    }

    #[test]
    fn branches_are_tagged_and_closed() {
        let config = ShipConfig {
            num_asymmetry_segments: 4,
            min_asymmetry_segments: 4,
            ..Default::default()
        };
        for seed in 0..8 {
            let (mut mesh, mut rng) = hull(seed, &config);
            let report = grow_branches(&mut mesh, &config, &mut rng).unwrap();
            assert_eq!(report.branches.len(), 4);
            mesh.validate().unwrap();
            assert!(mesh.is_closed());
            for branch in &report.branches {
                assert!(!mesh.contains(branch.root));
                assert!(mesh.face(branch.tip).unwrap().has_tag(FaceTag::Branch));
            }
            let tagged = mesh.faces().filter(|(_, f)| f.has_tag(FaceTag::Branch)).count();
            let expected: u32 = report.branches.iter().map(|b| b.pieces * 4 + 1).sum();
            assert_eq!(tagged as u32, expected);
        }
    }

    #[test]
    fn branch_lengths_decay() {
        let config = ShipConfig {
            num_asymmetry_segments: 6,
            min_asymmetry_segments: 6,
            ..Default::default()
        };
        let (mut mesh, mut rng) = hull(5, &config);
        let report = grow_branches(&mut mesh, &config, &mut rng).unwrap();
        let decay = config.tuning.branch_scale_decay;
        for (k, branch) in report.branches.iter().enumerate() {
            let bound = 0.4 * config.tuning.max_step_distance * decay.powi(k as i32);
            assert!(branch.piece_length <= bound + 1e-6);
        }
    }

    #[test]
    fn hidden_side_faces_lose_their_bonus() {
        let mut mesh = Mesh::new();
        let hull = mesh.add_box(glam::Vec3::ONE).unwrap();
        let wall = mesh.add_box(glam::Vec3::ONE).unwrap();
        // A second box just off the left side hides that face
        mesh.translate(&wall, glam::Vec3::new(0.0, 1.3, 0.0)).unwrap();

        let weights = candidates(&mesh, &Tuning::default()).unwrap();
        let weight = |id: FaceId| weights.iter().find(|(face, _)| *face == id).unwrap().1;
        assert_eq!(weight(hull[2]), 1.0);
        assert_eq!(weight(wall[3]), 1.0);
        assert_eq!(weight(hull[3]), SIDE_WEIGHT);
        assert_eq!(weight(wall[2]), SIDE_WEIGHT);
        assert_eq!(weight(hull[4]), 1.0);
    }

    #[test]
    fn tips_and_branches_are_never_roots() {
        let config = ShipConfig::default();
        let (mut mesh, mut rng) = hull(21, &config);
        let report = grow_branches(&mut mesh, &config, &mut rng).unwrap();
        for (id, _) in candidates(&mesh, &config.tuning).unwrap() {
            let face = mesh.face(id).unwrap();
            assert!(!face.has_tag(FaceTag::HullTip));
            assert!(!face.has_tag(FaceTag::Branch));
        }
        assert!(report.branches.len() as u32 <= report.planned);
    }
}
