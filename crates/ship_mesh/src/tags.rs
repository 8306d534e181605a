//! Face tags: group membership recorded by the generation stages.

use std::fmt;

/// Fixed set of face tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FaceTag {
    /// Part of the ship surface (every face starts with it).
    Hull,
    /// Final growth tip of the hull spine.
    HullTip,
    /// Grown by the asymmetry pass; such regions are never branched again.
    Branch,
    /// Engine housing.
    Engine,
    /// Emissive exhaust inside a nozzle.
    EngineGlow,
    /// Emissive window/light surface.
    Emit,
    Turret,
    Antenna,
    Cockpit,
    /// Raised grid plating.
    Plating,
    /// Darkened hull plating.
    Dark,
    /// Emissive landing-pad ring.
    GlowDisc,
    /// Excluded from bevelling.
    KeepSharp,
}

impl FaceTag {
    pub const ALL: [FaceTag; 13] = [
        FaceTag::Hull,
        FaceTag::HullTip,
        FaceTag::Branch,
        FaceTag::Engine,
        FaceTag::EngineGlow,
        FaceTag::Emit,
        FaceTag::Turret,
        FaceTag::Antenna,
        FaceTag::Cockpit,
        FaceTag::Plating,
        FaceTag::Dark,
        FaceTag::GlowDisc,
        FaceTag::KeepSharp,
    ];

    fn bit(self) -> u16 {
        1 << (self as u16)
    }

    pub fn name(self) -> &'static str {
        match self {
            FaceTag::Hull => "hull",
            FaceTag::HullTip => "hull_tip",
            FaceTag::Branch => "branch",
            FaceTag::Engine => "engine",
            FaceTag::EngineGlow => "engine_glow",
            FaceTag::Emit => "emit",
            FaceTag::Turret => "turret",
            FaceTag::Antenna => "antenna",
            FaceTag::Cockpit => "cockpit",
            FaceTag::Plating => "plating",
            FaceTag::Dark => "dark",
            FaceTag::GlowDisc => "glow_disc",
            FaceTag::KeepSharp => "keep_sharp",
        }
    }
}

impl fmt::Display for FaceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of [`FaceTag`]s stored as a bit mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TagSet(u16);

impl TagSet {
    pub const EMPTY: TagSet = TagSet(0);

    pub fn single(tag: FaceTag) -> Self {
        Self(tag.bit())
    }

    pub fn contains(&self, tag: FaceTag) -> bool {
        self.0 & tag.bit() != 0
    }

    pub fn insert(&mut self, tag: FaceTag) {
        self.0 |= tag.bit();
    }

    pub fn remove(&mut self, tag: FaceTag) {
        self.0 &= !tag.bit();
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Tags present in both sets.
    pub fn intersection(&self, other: TagSet) -> TagSet {
        TagSet(self.0 & other.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = FaceTag> + '_ {
        FaceTag::ALL.into_iter().filter(move |tag| self.contains(*tag))
    }
}

impl FromIterator<FaceTag> for TagSet {
    fn from_iter<I: IntoIterator<Item = FaceTag>>(iter: I) -> Self {
        let mut set = TagSet::EMPTY;
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_remove_contains() {
        let mut tags = TagSet::single(FaceTag::Hull);
        tags.insert(FaceTag::Emit);
        assert!(tags.contains(FaceTag::Hull));
        assert!(tags.contains(FaceTag::Emit));
        assert!(!tags.contains(FaceTag::Turret));
        tags.remove(FaceTag::Hull);
        assert!(!tags.contains(FaceTag::Hull));
        assert_eq!(tags.iter().collect::<Vec<_>>(), vec![FaceTag::Emit]);
    }

    #[test]
    fn intersection_keeps_common_tags() {
        let a: TagSet = [FaceTag::Hull, FaceTag::Dark, FaceTag::Engine].into_iter().collect();
        let b: TagSet = [FaceTag::Hull, FaceTag::Engine, FaceTag::KeepSharp].into_iter().collect();
        let common = a.intersection(b);
        assert_eq!(common.iter().collect::<Vec<_>>(), vec![FaceTag::Hull, FaceTag::Engine]);
        assert!(TagSet::EMPTY.intersection(a).is_empty());
    }
}
