//! Ship configuration files (RON) and command-line overrides.

use anyhow::{Context, Result};
use procgen::ShipConfig;
use std::path::Path;

/// Load a config from a RON file. Fields missing from the file keep their
/// defaults.
pub fn load(path: &Path) -> Result<ShipConfig> {
    let data = std::fs::read_to_string(path).with_context(|| format!("reading config {:?}", path))?;
    let config: ShipConfig = ron::from_str(&data).with_context(|| format!("parsing config {:?}", path))?;
    Ok(config)
}

/// Write a config as pretty RON.
pub fn save(config: &ShipConfig, path: &Path) -> Result<()> {
    let text = ron::ser::to_string_pretty(config, ron::ser::PrettyConfig::default()).context("serialising config")?;
    std::fs::write(path, text).with_context(|| format!("writing config {:?}", path))?;
    Ok(())
}

/// Values given on the command line. `None` keeps the file (or default) value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub geometry_seed: Option<String>,
    pub material_seed: Option<String>,
    pub segments: Option<u32>,
    pub no_asymmetry: bool,
    pub no_detail: bool,
    pub bevel: Option<f32>,
}

impl Overrides {
    pub fn apply(&self, config: &mut ShipConfig) {
        if let Some(seed) = &self.geometry_seed {
            config.geometry_seed = seed.as_str().into();
        }
        if let Some(seed) = &self.material_seed {
            config.material_seed = seed.as_str().into();
        }
        if let Some(segments) = self.segments {
            config.num_hull_segments = segments;
        }
        if self.no_asymmetry {
            config.create_asymmetry = false;
        }
        if self.no_detail {
            config.create_face_detail = false;
        }
        if let Some(bevel) = self.bevel {
            config.bevel_width = bevel;
        }
    }
}
