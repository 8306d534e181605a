//! shipgen - procedural spaceship generator
//!
//! Generates one or more ships and writes each as a Wavefront OBJ file with a
//! companion MTL file. With `--buffers` the triangulated vertex and index
//! buffers are written next to them as raw arrays in native byte order.
//!
//! ```bash
//! # One ship from a seed
//! shipgen --geometry-seed 1234 --output ships/
//!
//! # Ten random ships from a config file
//! shipgen --config ship.ron --random --count 10
//! ```

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use config::Overrides;
use procgen::{generate, ShipConfig};
use ship_core::Seed;
use ship_mesh::{write_mtl, write_obj, Mesh};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Procedural spaceship generator
#[derive(Parser, Debug)]
#[command(name = "shipgen")]
#[command(about = "Generate spaceship meshes as OBJ + MTL files")]
#[command(version)]
struct Args {
    /// RON config file; command-line flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Geometry seed (number or text)
    #[arg(short, long)]
    geometry_seed: Option<String>,

    /// Material seed (number or text)
    #[arg(short, long)]
    material_seed: Option<String>,

    /// Draw fresh seeds for every ship
    #[arg(long)]
    random: bool,

    /// Number of ships to generate
    #[arg(short = 'n', long, default_value_t = 1)]
    count: u32,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Largest number of hull segments
    #[arg(short, long)]
    segments: Option<u32>,

    /// Skip the asymmetry pass
    #[arg(long)]
    no_asymmetry: bool,

    /// Skip surface detail
    #[arg(long)]
    no_detail: bool,

    /// Bevel fraction (0 disables)
    #[arg(short, long)]
    bevel: Option<f32>,

    /// Also write raw vertex and index buffers
    #[arg(long)]
    buffers: bool,

    /// Write the effective config to this file and exit
    #[arg(long)]
    save_config: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            geometry_seed: self.geometry_seed.clone(),
            material_seed: self.material_seed.clone(),
            segments: self.segments,
            no_asymmetry: self.no_asymmetry,
            no_detail: self.no_detail,
            bevel: self.bevel,
        }
    }
}

/// Config of the `index`-th ship of a batch. Batches step both seeds so every
/// ship differs while the first one matches a single run.
fn ship_config(base: &ShipConfig, index: u32, random: bool) -> ShipConfig {
    let mut config = base.clone();
    if random {
        config.geometry_seed = Seed::from(rand::random::<u64>());
        config.material_seed = Seed::from(rand::random::<u64>());
    } else if index > 0 {
        let step = index as u64;
        config.geometry_seed = Seed::from(base.geometry_seed.value().wrapping_add(step));
        config.material_seed = Seed::from(base.material_seed.value().wrapping_add(step));
    }
    config
}

/// File name stem of a ship. Both seeds appear so ships that only differ in
/// paint never overwrite each other.
fn file_stem(config: &ShipConfig) -> String {
    format!("ship_{}_{}", config.geometry_seed.value(), config.material_seed.value())
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path).with_context(|| format!("creating {:?}", path))?))
}

/// Write the GPU-ready triangle buffers of a mesh.
fn write_buffers(dir: &Path, stem: &str, mesh: &Mesh) -> Result<()> {
    let export = mesh.to_export();
    for (suffix, bytes) in [("vertices", export.vertex_bytes()), ("indices", export.index_bytes())] {
        let path = dir.join(format!("{}.{}.bin", stem, suffix));
        let mut out = create(&path)?;
        out.write_all(bytes).with_context(|| format!("writing {:?}", path))?;
        out.flush()?;
    }
    log::debug!(
        "{}: {} vertices, {} triangles in buffers",
        stem,
        export.vertices.len(),
        export.triangle_count()
    );
    Ok(())
}

fn write_ship(dir: &Path, config: &ShipConfig, buffers: bool) -> Result<PathBuf> {
    let ship = generate(config).with_context(|| format!("generating ship {}", config.geometry_seed))?;

    let stem = file_stem(config);
    let obj_path = dir.join(format!("{}.obj", stem));
    let mtl_name = format!("{}.mtl", stem);

    let mut obj = create(&obj_path)?;
    write_obj(&ship.mesh, Some(&mtl_name), &mut obj).with_context(|| format!("writing {:?}", obj_path))?;
    obj.flush()?;

    let mtl_path = dir.join(&mtl_name);
    let mut mtl = create(&mtl_path)?;
    write_mtl(&ship.palette, &mut mtl).with_context(|| format!("writing {:?}", mtl_path))?;
    mtl.flush()?;

    if buffers {
        write_buffers(dir, &stem, &ship.mesh)?;
    }

    let stats = &ship.stats;
    log::info!(
        "ship {} / {}: {} hull segments, {} branches, {} details, {} vertices, {} faces -> {:?}",
        config.geometry_seed,
        config.material_seed,
        stats.hull.total_segments(),
        stats.asymmetry.as_ref().map_or(0, |report| report.branches.len()),
        stats.details.as_ref().map_or(0, |report| report.placements.len()),
        stats.vertices,
        stats.faces,
        obj_path
    );
    Ok(obj_path)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut base = match &args.config {
        Some(path) => config::load(path)?,
        None => ShipConfig::default(),
    };
    args.overrides().apply(&mut base);
    base.validate().context("invalid ship configuration")?;

    if let Some(path) = &args.save_config {
        config::save(&base, path)?;
        log::info!("Saved config to {:?}", path);
        return Ok(());
    }

    std::fs::create_dir_all(&args.output).with_context(|| format!("creating output directory {:?}", args.output))?;
    for index in 0..args.count {
        let config = ship_config(&base, index, args.random);
        write_ship(&args.output, &config, args.buffers)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ship_mesh::ExportVertex;

    #[test]
    fn flags_parse_into_overrides() {
        let args = Args::parse_from([
            "shipgen",
            "--geometry-seed",
            "nostromo",
            "--segments",
            "8",
            "--no-detail",
            "--bevel",
            "0.2",
            "-n",
            "3",
        ]);
        assert_eq!(args.count, 3);
        let mut config = ShipConfig::default();
        args.overrides().apply(&mut config);
        assert_eq!(config.geometry_seed, Seed::from("nostromo"));
        assert_eq!(config.num_hull_segments, 8);
        assert!(!config.create_face_detail);
        assert_eq!(config.bevel_width, 0.2);
    }

    #[test]
    fn batches_step_the_seeds() {
        let base = ShipConfig {
            geometry_seed: Seed::from(10),
            material_seed: Seed::from(20),
            ..Default::default()
        };
        assert_eq!(ship_config(&base, 0, false), base);
        let third = ship_config(&base, 2, false);
        assert_eq!(third.geometry_seed, Seed::from(12));
        assert_eq!(third.material_seed, Seed::from(22));
    }

    #[test]
    fn writes_obj_and_mtl() {
        let dir = std::env::temp_dir().join(format!("shipgen-out-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let config = ShipConfig {
            geometry_seed: Seed::from(31),
            material_seed: Seed::from(4),
            ..Default::default()
        };
        let obj_path = write_ship(&dir, &config, true).unwrap();
        assert_eq!(obj_path, dir.join("ship_31_4.obj"));
        let obj = std::fs::read_to_string(&obj_path).unwrap();
        assert!(obj.contains("mtllib ship_31_4.mtl"));
        assert!(obj.lines().any(|l| l.starts_with("f ")));
        let mtl = std::fs::read_to_string(dir.join("ship_31_4.mtl")).unwrap();
        assert_eq!(mtl.lines().filter(|l| l.starts_with("newmtl ")).count(), 5);

        let vertices = std::fs::read(dir.join("ship_31_4.vertices.bin")).unwrap();
        let indices = std::fs::read(dir.join("ship_31_4.indices.bin")).unwrap();
        assert_eq!(vertices.len() % std::mem::size_of::<ExportVertex>(), 0);
        assert_eq!(indices.len() % (3 * std::mem::size_of::<u32>()), 0);
        assert!(!indices.is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn material_seed_is_part_of_the_file_name() {
        let base = ShipConfig {
            geometry_seed: Seed::from(8),
            material_seed: Seed::from(1),
            ..Default::default()
        };
        let repainted = ShipConfig {
            material_seed: Seed::from(2),
            ..base.clone()
        };
        assert_ne!(file_stem(&base), file_stem(&repainted));
        assert_eq!(file_stem(&base), "ship_8_1");
    }
}
