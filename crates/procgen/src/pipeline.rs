//! The generation pipeline: config in, finished spaceship out.

use crate::asymmetry::{grow_branches, AsymmetryReport};
use crate::classify::classify_faces;
use crate::config::ShipConfig;
use crate::detail::{add_details, DetailReport};
use crate::finishing::{finish, FinishReport};
use crate::hull::{build_hull, HullReport};
use crate::palette::draw_palette;
use ship_core::{RandomStreams, ShipError, ShipResult};
use ship_mesh::{Mesh, Palette};

/// What each stage did.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationStats {
    pub hull: HullReport,
    pub asymmetry: Option<AsymmetryReport>,
    pub details: Option<DetailReport>,
    pub finish: FinishReport,
    pub vertices: usize,
    pub faces: usize,
}

/// A generated ship: the mesh with resolved material slots, its palette and
/// the per-stage statistics.
#[derive(Debug, Clone)]
pub struct Spaceship {
    pub mesh: Mesh,
    pub palette: Palette,
    pub stats: GenerationStats,
}

fn check_stage(mesh: &Mesh, stage: &str) -> ShipResult<()> {
    mesh.validate().map_err(|err| match err {
        ShipError::InvalidTopology { details } => ShipError::topology(format!("after {}: {}", stage, details)),
        other => other,
    })
}

/// Generate one ship. Pure function of the config: the same config always
/// yields the same mesh and palette.
pub fn generate(config: &ShipConfig) -> ShipResult<Spaceship> {
    config.validate()?;
    let mut streams = RandomStreams::new(&config.geometry_seed, &config.material_seed);
    let mut mesh = Mesh::new();

    let hull = build_hull(&mut mesh, config, &mut streams.geometry)?;
    check_stage(&mesh, "hull")?;

    // A hull that never grew stays the bare seed box
    let grown = hull.planned_segments > 0;

    let asymmetry = if config.create_asymmetry && grown {
        let report = grow_branches(&mut mesh, config, &mut streams.geometry)?;
        check_stage(&mesh, "asymmetry")?;
        Some(report)
    } else {
        None
    };

    let details = if config.create_face_detail && grown {
        let infos = classify_faces(&mesh, &config.tuning)?;
        let report = add_details(&mut mesh, &infos, config, &mut streams.geometry, &mut streams.material)?;
        check_stage(&mesh, "detail")?;
        Some(report)
    } else {
        None
    };

    let finish = finish(&mut mesh, config, &mut streams.geometry)?;
    check_stage(&mesh, "finishing")?;

    let palette = draw_palette(&mut streams.material)?;

    let stats = GenerationStats {
        hull,
        asymmetry,
        details,
        finish,
        vertices: mesh.vertex_count(),
        faces: mesh.face_count(),
    };
    log::debug!(
        "generated ship {} / {}: {} vertices, {} faces",
        config.geometry_seed,
        config.material_seed,
        stats.vertices,
        stats.faces
    );
    for stream in [&streams.geometry, &streams.material] {
        log::trace!("{} stream: {} draws", stream.label(), stream.draws());
    }
    Ok(Spaceship { mesh, palette, stats })
}
