//! Material slots handed to the rendering collaborator.

use crate::tags::{FaceTag, TagSet};
use serde::{Deserialize, Serialize};

/// Material slot indices understood by the downstream material setup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MaterialSlot {
    /// Plain hull plating
    #[default]
    Hull = 0,
    /// Hull with emissive windows (uses an external window-mask texture)
    HullLights = 1,
    /// Darkened hull plating
    HullDark = 2,
    /// Emissive engine burn
    ExhaustBurn = 3,
    /// Emissive landing-pad disc
    GlowDisc = 4,
}

/// Tag → slot resolution, highest priority first.
const PRIORITY: [(FaceTag, MaterialSlot); 6] = [
    (FaceTag::EngineGlow, MaterialSlot::ExhaustBurn),
    (FaceTag::GlowDisc, MaterialSlot::GlowDisc),
    (FaceTag::Emit, MaterialSlot::HullLights),
    (FaceTag::Cockpit, MaterialSlot::HullLights),
    (FaceTag::Turret, MaterialSlot::HullDark),
    (FaceTag::Dark, MaterialSlot::HullDark),
];

impl MaterialSlot {
    pub const ALL: [MaterialSlot; 5] = [
        MaterialSlot::Hull,
        MaterialSlot::HullLights,
        MaterialSlot::HullDark,
        MaterialSlot::ExhaustBurn,
        MaterialSlot::GlowDisc,
    ];

    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            MaterialSlot::Hull => "hull",
            MaterialSlot::HullLights => "hull_lights",
            MaterialSlot::HullDark => "hull_dark",
            MaterialSlot::ExhaustBurn => "exhaust_burn",
            MaterialSlot::GlowDisc => "glow_disc",
        }
    }

    pub fn is_emissive(self) -> bool {
        matches!(
            self,
            MaterialSlot::HullLights | MaterialSlot::ExhaustBurn | MaterialSlot::GlowDisc
        )
    }

    /// Resolve the slot for a tag set: `engine_glow > glow_disc > emit > cockpit > turret > dark > hull`.
    pub fn resolve(tags: TagSet) -> MaterialSlot {
        PRIORITY
            .iter()
            .find(|(tag, _)| tags.contains(*tag))
            .map(|(_, slot)| *slot)
            .unwrap_or(MaterialSlot::Hull)
    }
}

/// Colours for the material slots, drawn from the material stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    /// Base hull colour (linear RGB).
    pub hull: [f32; 3],
    /// Window light colour.
    pub windows: [f32; 3],
    /// Engine and landing-pad glow colour.
    pub glow: [f32; 3],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            hull: [0.25, 0.25, 0.27],
            windows: [1.0, 0.9, 0.7],
            glow: [0.4, 0.7, 1.0],
        }
    }
}

impl Palette {
    /// Diffuse colour of a slot.
    pub fn diffuse(&self, slot: MaterialSlot) -> [f32; 3] {
        match slot {
            MaterialSlot::Hull | MaterialSlot::HullLights => self.hull,
            MaterialSlot::HullDark => self.hull.map(|c| c * 0.3),
            MaterialSlot::ExhaustBurn | MaterialSlot::GlowDisc => self.glow,
        }
    }

    /// Emission colour of a slot (black for non-emissive slots).
    pub fn emission(&self, slot: MaterialSlot) -> [f32; 3] {
        match slot {
            MaterialSlot::HullLights => self.windows,
            MaterialSlot::ExhaustBurn | MaterialSlot::GlowDisc => self.glow,
            _ => [0.0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_order() {
        let all: TagSet = [FaceTag::Hull, FaceTag::Turret, FaceTag::Emit, FaceTag::EngineGlow]
            .into_iter()
            .collect();
        assert_eq!(MaterialSlot::resolve(all), MaterialSlot::ExhaustBurn);

        let lit_turret: TagSet = [FaceTag::Hull, FaceTag::Turret, FaceTag::Emit].into_iter().collect();
        assert_eq!(MaterialSlot::resolve(lit_turret), MaterialSlot::HullLights);

        let turret: TagSet = [FaceTag::Hull, FaceTag::Turret].into_iter().collect();
        assert_eq!(MaterialSlot::resolve(turret), MaterialSlot::HullDark);

        assert_eq!(MaterialSlot::resolve(TagSet::single(FaceTag::Hull)), MaterialSlot::Hull);
        assert_eq!(MaterialSlot::resolve(TagSet::EMPTY), MaterialSlot::Hull);
    }

    #[test]
    fn only_glowing_slots_emit() {
        let palette = Palette::default();
        assert_eq!(palette.emission(MaterialSlot::Hull), [0.0; 3]);
        assert_eq!(palette.emission(MaterialSlot::ExhaustBurn), palette.glow);
        assert!(MaterialSlot::GlowDisc.is_emissive());
        assert!(!MaterialSlot::HullDark.is_emissive());
    }
}
