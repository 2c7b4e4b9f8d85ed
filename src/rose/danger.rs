//! Danger levels and the cell grid of a forecast rose.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Avalanche danger rating, ordered from `None` to `Extreme`.
///
/// `Unknown` sorts last and marks a sample that could not be matched to any
/// rating. It never has a numeric code.
pub enum DangerLevel {
    None,
    Low,
    Moderate,
    Considerable,
    High,
    Extreme,
    Unknown,
}

#[derive(Debug, Error, PartialEq)]
pub enum DangerParseError {
    #[error("danger code {0} is outside 0..=5")]
    CodeOutOfRange(i64),
    #[error("unrecognised danger level `{0}`")]
    Unrecognised(String),
}

impl DangerLevel {
    /// The six real ratings, in order.
    pub const RATED: [DangerLevel; 6] = [
        DangerLevel::None,
        DangerLevel::Low,
        DangerLevel::Moderate,
        DangerLevel::Considerable,
        DangerLevel::High,
        DangerLevel::Extreme,
    ];

    pub fn from_code(code: i64) -> Result<Self, DangerParseError> {
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::RATED.get(i).copied())
            .ok_or(DangerParseError::CodeOutOfRange(code))
    }

    pub fn code(&self) -> Option<u8> {
        Self::RATED.iter().position(|l| l == self).map(|i| i as u8)
    }

    pub fn name(&self) -> &'static str {
        match self {
            DangerLevel::None => "none",
            DangerLevel::Low => "low",
            DangerLevel::Moderate => "moderate",
            DangerLevel::Considerable => "considerable",
            DangerLevel::High => "high",
            DangerLevel::Extreme => "extreme",
            DangerLevel::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DangerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DangerLevel {
    type Err = DangerParseError;

    /// Accepts a level name in any case, or a numeric code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<i64>() {
            return Self::from_code(code);
        }

        let lower = s.to_lowercase();
        Self::RATED
            .iter()
            .chain(std::iter::once(&DangerLevel::Unknown))
            .find(|l| l.name() == lower)
            .copied()
            .ok_or_else(|| DangerParseError::Unrecognised(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Elevation tier of a rose. `Bottom` is the outer ring.
pub enum Tier {
    Bottom,
    Middle,
    Top,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Bottom, Tier::Middle, Tier::Top];

    pub fn name(&self) -> &'static str {
        match self {
            Tier::Bottom => "bottom",
            Tier::Middle => "middle",
            Tier::Top => "top",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
/// Compass octant, clockwise from north.
pub enum Direction {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::N,
        Direction::NE,
        Direction::E,
        Direction::SE,
        Direction::S,
        Direction::SW,
        Direction::W,
        Direction::NW,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Direction::N => "N",
            Direction::NE => "NE",
            Direction::E => "E",
            Direction::SE => "SE",
            Direction::S => "S",
            Direction::SW => "SW",
            Direction::W => "W",
            Direction::NW => "NW",
        }
    }

    /// Compass bearing of the octant centre in degrees.
    pub fn bearing(&self) -> f64 {
        Self::ALL.iter().position(|d| d == self).unwrap_or(0) as f64 * 45.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Rendering layer of the rose artwork, in decoding priority order.
pub enum Layer {
    Fill,
    LightShadow,
    DarkShadow,
}

impl Layer {
    pub const PRIORITY: [Layer; 3] = [Layer::Fill, Layer::LightShadow, Layer::DarkShadow];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell {
    pub tier: Tier,
    pub direction: Direction,
}

impl Cell {
    pub fn new(tier: Tier, direction: Direction) -> Self {
        Cell { tier, direction }
    }

    /// All 24 cells, tier-major.
    pub fn all() -> impl Iterator<Item = Cell> {
        Tier::ALL
            .into_iter()
            .flat_map(|t| Direction::ALL.into_iter().map(move |d| Cell::new(t, d)))
    }

    /// Column label used in datasets, e.g. `bottom_NE`.
    pub fn label(&self) -> String {
        format!("{}_{}", self.tier.name(), self.direction.name())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tier.name(), self.direction.name())
    }
}

// -- Tests -------------------------------------------------------------------
