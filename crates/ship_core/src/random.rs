//! Seeded random streams.
//!
//! Every stochastic decision of a generation run is drawn from one of two
//! streams: `geometry` (shape and topology) and `material` (tags that only
//! pick material slots, plus the colour palette). The streams never share
//! state, so re-rolling the material seed leaves the geometry untouched.

use crate::error::{ShipError, ShipResult};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::xxh3_64;

/// Offset mixed into the material seed so equal seeds do not yield the same sequence.
const MATERIAL_SALT: u64 = 0x6d61_7465_7269_616c;

/// A user-facing seed: either a number or any text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seed {
    Number(u64),
    Text(String),
}

impl Seed {
    /// Numeric value of the seed. Text holding a number maps to that number,
    /// any other text is hashed.
    pub fn value(&self) -> u64 {
        match self {
            Seed::Number(n) => *n,
            Seed::Text(text) => match text.trim().parse::<u64>() {
                Ok(n) => n,
                Err(_) => xxh3_64(text.as_bytes()),
            },
        }
    }
}

impl Default for Seed {
    fn default() -> Self {
        Seed::Number(0)
    }
}

impl From<u64> for Seed {
    fn from(n: u64) -> Self {
        Seed::Number(n)
    }
}

impl From<&str> for Seed {
    fn from(text: &str) -> Self {
        Seed::Text(text.to_string())
    }
}

impl From<String> for Seed {
    fn from(text: String) -> Self {
        Seed::Text(text)
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seed::Number(n) => write!(f, "{}", n),
            Seed::Text(text) => write!(f, "\"{}\"", text),
        }
    }
}

/// A reproducible sequence of floats, integers and weighted choices.
#[derive(Debug, Clone)]
pub struct RandomStream {
    label: &'static str,
    seed: u64,
    rng: StdRng,
    draws: u64,
}

impl RandomStream {
    pub fn new(label: &'static str, seed: u64) -> Self {
        Self {
            label,
            seed,
            rng: StdRng::seed_from_u64(seed),
            draws: 0,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Seed the stream was created from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of values drawn so far.
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Uniform float in `[0, 1)`.
    pub fn unit(&mut self) -> f32 {
        self.draws += 1;
        self.rng.gen::<f32>()
    }

    /// Uniform float in `[min, max]`.
    pub fn next_float(&mut self, min: f32, max: f32) -> ShipResult<f32> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(ShipError::range(min, max));
        }
        let t = self.unit();
        Ok(min + (max - min) * t)
    }

    /// Uniform integer in `[min, max]` (both inclusive).
    pub fn next_int(&mut self, min: i64, max: i64) -> ShipResult<i64> {
        if min > max {
            return Err(ShipError::InvalidRange {
                min: min as f64,
                max: max as f64,
            });
        }
        self.draws += 1;
        Ok(self.rng.gen_range(min..=max))
    }

    /// `true` with probability `p`.
    pub fn chance(&mut self, p: f32) -> bool {
        self.unit() < p
    }

    /// `1.0` or `-1.0` with equal probability.
    pub fn sign(&mut self) -> f32 {
        if self.chance(0.5) {
            1.0
        } else {
            -1.0
        }
    }

    /// Pick one entry of a weighted set. Weights need not sum to one.
    pub fn choice<'a, T>(&mut self, options: &'a [(T, f32)]) -> ShipResult<&'a T> {
        let mut total = 0.0;
        for (_, weight) in options {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(ShipError::range(0.0, *weight));
            }
            total += weight;
        }
        if options.is_empty() || total <= 0.0 {
            return Err(ShipError::range(0.0, total));
        }

        let mut target = self.unit() * total;
        for (item, weight) in options {
            if target < *weight {
                return Ok(item);
            }
            target -= weight;
        }
        // Rounding can leave `target` marginally above the last weight.
        options
            .iter()
            .rev()
            .find(|(_, weight)| *weight > 0.0)
            .map(|(item, _)| item)
            .ok_or_else(|| ShipError::range(0.0, total))
    }
}

/// The two independent streams of a generation run.
#[derive(Debug, Clone)]
pub struct RandomStreams {
    pub geometry: RandomStream,
    pub material: RandomStream,
}

impl RandomStreams {
    pub fn new(geometry_seed: &Seed, material_seed: &Seed) -> Self {
        Self {
            geometry: RandomStream::new("geometry", geometry_seed.value()),
            material: RandomStream::new("material", material_seed.value().wrapping_add(MATERIAL_SALT)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = RandomStream::new("a", 1234);
        let mut b = RandomStream::new("b", 1234);
        for _ in 0..32 {
            assert_eq!(a.next_float(-3.0, 7.0).unwrap(), b.next_float(-3.0, 7.0).unwrap());
            assert_eq!(a.next_int(0, 100).unwrap(), b.next_int(0, 100).unwrap());
        }
        assert_eq!(a.draws(), 64);
    }

    #[test]
    fn ranges_are_respected() {
        let mut rng = RandomStream::new("range", 7);
        for _ in 0..500 {
            let f = rng.next_float(0.75, 2.0).unwrap();
            assert!((0.75..=2.0).contains(&f));
            let i = rng.next_int(2, 4).unwrap();
            assert!((2..=4).contains(&i));
        }
        assert_eq!(rng.next_float(1.5, 1.5).unwrap(), 1.5);
        assert_eq!(rng.next_int(3, 3).unwrap(), 3);
    }

    #[test]
    fn inverted_bounds_fail_with_invalid_range() {
        let mut rng = RandomStream::new("bad", 1);
        assert!(matches!(rng.next_float(2.0, 1.0), Err(ShipError::InvalidRange { .. })));
        assert!(matches!(rng.next_int(5, 4), Err(ShipError::InvalidRange { .. })));
        assert!(matches!(rng.next_float(f32::NAN, 1.0), Err(ShipError::InvalidRange { .. })));
        let empty: [(u8, f32); 0] = [];
        assert!(rng.choice(&empty).is_err());
        assert!(rng.choice(&[(1u8, 0.0), (2u8, 0.0)]).is_err());
        assert!(rng.choice(&[(1u8, -1.0)]).is_err());
    }

    #[test]
    fn choice_never_picks_zero_weight() {
        let mut rng = RandomStream::new("choice", 99);
        let options = [("never", 0.0), ("always", 2.0), ("also never", 0.0)];
        for _ in 0..200 {
            assert_eq!(*rng.choice(&options).unwrap(), "always");
        }
    }

    #[test]
    fn streams_are_isolated() {
        let mut a = RandomStreams::new(&Seed::from(5), &Seed::from(10));
        let mut b = RandomStreams::new(&Seed::from(5), &Seed::from(10));
        // Drain the material stream of `b` only
        for _ in 0..100 {
            b.material.unit();
        }
        for _ in 0..50 {
            assert_eq!(a.geometry.unit(), b.geometry.unit());
        }
    }

    #[test]
    fn equal_seeds_do_not_correlate_streams() {
        let mut streams = RandomStreams::new(&Seed::from(42), &Seed::from(42));
        let geometry: Vec<f32> = (0..8).map(|_| streams.geometry.unit()).collect();
        let material: Vec<f32> = (0..8).map(|_| streams.material.unit()).collect();
        assert_ne!(geometry, material);
    }

    #[test]
    fn text_seeds() {
        assert_eq!(Seed::from("1234").value(), 1234);
        assert_eq!(Seed::from(" 77 ").value(), 77);
        assert_eq!(Seed::from("nostromo").value(), Seed::from("nostromo").value());
        assert_ne!(Seed::from("nostromo").value(), Seed::from("sulaco").value());
    }
}
