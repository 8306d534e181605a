//! Generation settings. Immutable for the duration of a run.

use serde::{Deserialize, Serialize};
use ship_core::{Seed, ShipError, ShipResult};

/// Upper bound for `num_hull_segments`.
pub const MAX_HULL_SEGMENTS: u32 = 32;
/// Upper bound for `num_asymmetry_segments`.
pub const MAX_ASYMMETRY_SEGMENTS: u32 = 16;
/// Upper bound for `bevel_width`.
pub const MAX_BEVEL_WIDTH: f32 = ship_mesh::MAX_BEVEL_FRACTION;

/// Everything one generation run depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipConfig {
    /// Seed of the geometry stream (shape and topology).
    #[serde(default)]
    pub geometry_seed: Seed,
    /// Seed of the material stream (material tags and palette only).
    #[serde(default)]
    pub material_seed: Seed,
    /// Largest number of hull segments.
    #[serde(default = "default_num_hull_segments")]
    pub num_hull_segments: u32,
    /// Smallest number of hull segments.
    #[serde(default = "default_min_hull_segments")]
    pub min_hull_segments: u32,
    #[serde(default = "default_true")]
    pub create_asymmetry: bool,
    /// Largest number of asymmetric branches.
    #[serde(default = "default_num_asymmetry_segments")]
    pub num_asymmetry_segments: u32,
    #[serde(default = "default_min_asymmetry_segments")]
    pub min_asymmetry_segments: u32,
    #[serde(default = "default_true")]
    pub create_face_detail: bool,
    /// Allow mirroring across the XZ plane (left/right).
    #[serde(default = "default_true")]
    pub allow_horizontal_symmetry: bool,
    /// Allow mirroring across the XY plane (top/bottom). Can split the ship into islands.
    #[serde(default)]
    pub allow_vertical_symmetry: bool,
    /// Bevel fraction of adjacent edge lengths; 0 disables the bevel.
    #[serde(default = "default_bevel_width")]
    pub bevel_width: f32,
    /// Move the finished ship so its surface centroid is at the origin.
    #[serde(default = "default_true")]
    pub recenter: bool,
    #[serde(default)]
    pub tuning: Tuning,
}

/// Constants that shape the style of a ship but not its validity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    /// Bias towards top and bottom: a face is vertical when `|n.z|` plus the
    /// sine of this angle reaches its largest horizontal normal component.
    #[serde(default = "default_dead_zone_degrees")]
    pub dead_zone_degrees: f32,
    /// Length factor applied per asymmetric branch.
    #[serde(default = "default_branch_scale_decay")]
    pub branch_scale_decay: f32,
    /// Longest hull segment.
    #[serde(default = "default_max_step_distance")]
    pub max_step_distance: f32,
    /// Length of the exposure ray cast from each face.
    #[serde(default = "default_exposure_probe_distance")]
    pub exposure_probe_distance: f32,
    /// Weld tolerance for mirroring.
    #[serde(default = "default_weld_epsilon")]
    pub weld_epsilon: f32,
    /// Smallest per-step scale factor for a growth tip.
    #[serde(default = "default_min_scale_fraction")]
    pub min_scale_fraction: f32,
    /// Growth tips retire below this accumulated scale.
    #[serde(default = "default_min_tip_scale")]
    pub min_tip_scale: f32,
    /// Growth tips never grow beyond this accumulated scale.
    #[serde(default = "default_max_tip_scale")]
    pub max_tip_scale: f32,
    #[serde(default = "default_roll_degrees")]
    pub roll_degrees: f32,
    #[serde(default = "default_tilt_degrees")]
    pub tilt_degrees: f32,
    /// Chance of each allowed mirror.
    #[serde(default = "default_symmetry_probability")]
    pub symmetry_probability: f32,
    /// Faces longer than this relative to their width get no detail.
    #[serde(default = "default_max_detail_aspect")]
    pub max_detail_aspect: f32,
}

fn default_true() -> bool {
    true
}
fn default_num_hull_segments() -> u32 {
    6
}
fn default_min_hull_segments() -> u32 {
    3
}
fn default_num_asymmetry_segments() -> u32 {
    5
}
fn default_min_asymmetry_segments() -> u32 {
    1
}
fn default_bevel_width() -> f32 {
    0.1
}
fn default_dead_zone_degrees() -> f32 {
    20.0
}
fn default_branch_scale_decay() -> f32 {
    0.8
}
fn default_max_step_distance() -> f32 {
    1.0
}
fn default_exposure_probe_distance() -> f32 {
    0.6
}
fn default_weld_epsilon() -> f32 {
    1e-4
}
fn default_min_scale_fraction() -> f32 {
    0.25
}
fn default_min_tip_scale() -> f32 {
    0.2
}
fn default_max_tip_scale() -> f32 {
    2.0
}
fn default_roll_degrees() -> f32 {
    5.0
}
fn default_tilt_degrees() -> f32 {
    5.0
}
fn default_symmetry_probability() -> f32 {
    0.5
}
fn default_max_detail_aspect() -> f32 {
    3.0
}

impl Default for ShipConfig {
    fn default() -> Self {
        Self {
            geometry_seed: Seed::default(),
            material_seed: Seed::default(),
            num_hull_segments: default_num_hull_segments(),
            min_hull_segments: default_min_hull_segments(),
            create_asymmetry: true,
            num_asymmetry_segments: default_num_asymmetry_segments(),
            min_asymmetry_segments: default_min_asymmetry_segments(),
            create_face_detail: true,
            allow_horizontal_symmetry: true,
            allow_vertical_symmetry: false,
            bevel_width: default_bevel_width(),
            recenter: true,
            tuning: Tuning::default(),
        }
    }
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            dead_zone_degrees: default_dead_zone_degrees(),
            branch_scale_decay: default_branch_scale_decay(),
            max_step_distance: default_max_step_distance(),
            exposure_probe_distance: default_exposure_probe_distance(),
            weld_epsilon: default_weld_epsilon(),
            min_scale_fraction: default_min_scale_fraction(),
            min_tip_scale: default_min_tip_scale(),
            max_tip_scale: default_max_tip_scale(),
            roll_degrees: default_roll_degrees(),
            tilt_degrees: default_tilt_degrees(),
            symmetry_probability: default_symmetry_probability(),
            max_detail_aspect: default_max_detail_aspect(),
        }
    }
}

fn check(field: &'static str, value: f64, min: f64, max: f64) -> ShipResult<()> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ShipError::out_of_bounds(field, value, min, max))
    }
}

impl ShipConfig {
    /// Reject values outside their supported range.
    pub fn validate(&self) -> ShipResult<()> {
        let segments = MAX_HULL_SEGMENTS as f64;
        let branches = MAX_ASYMMETRY_SEGMENTS as f64;
        check("num_hull_segments", self.num_hull_segments as f64, 0.0, segments)?;
        check("min_hull_segments", self.min_hull_segments as f64, 0.0, segments)?;
        check("num_asymmetry_segments", self.num_asymmetry_segments as f64, 0.0, branches)?;
        check("min_asymmetry_segments", self.min_asymmetry_segments as f64, 0.0, branches)?;
        if self.bevel_width != 0.0 {
            check("bevel_width", self.bevel_width as f64, 0.01, MAX_BEVEL_WIDTH as f64)?;
        }
        self.tuning.validate()
    }

    /// Segment range actually drawn from; `min` never exceeds `max`.
    pub fn hull_segment_range(&self) -> (i64, i64) {
        let max = self.num_hull_segments as i64;
        (max.min(self.min_hull_segments as i64), max)
    }

    pub fn asymmetry_segment_range(&self) -> (i64, i64) {
        let max = self.num_asymmetry_segments as i64;
        (max.min(self.min_asymmetry_segments as i64), max)
    }
}

impl Tuning {
    pub fn validate(&self) -> ShipResult<()> {
        check("tuning.dead_zone_degrees", self.dead_zone_degrees as f64, 0.0, 45.0)?;
        check("tuning.branch_scale_decay", self.branch_scale_decay as f64, 0.1, 1.0)?;
        check("tuning.max_step_distance", self.max_step_distance as f64, 0.05, 10.0)?;
        check("tuning.exposure_probe_distance", self.exposure_probe_distance as f64, 0.0, 10.0)?;
        check("tuning.weld_epsilon", self.weld_epsilon as f64, 1e-6, 1e-2)?;
        check("tuning.min_scale_fraction", self.min_scale_fraction as f64, 0.05, 1.0)?;
        check("tuning.min_tip_scale", self.min_tip_scale as f64, 0.01, 1.0)?;
        check("tuning.max_tip_scale", self.max_tip_scale as f64, 1.0, 4.0)?;
        check("tuning.roll_degrees", self.roll_degrees as f64, 0.0, 45.0)?;
        check("tuning.tilt_degrees", self.tilt_degrees as f64, 0.0, 45.0)?;
        check("tuning.symmetry_probability", self.symmetry_probability as f64, 0.0, 1.0)?;
        check("tuning.max_detail_aspect", self.max_detail_aspect as f64, 1.0, 10.0)?;
        Ok(())
    }
}
