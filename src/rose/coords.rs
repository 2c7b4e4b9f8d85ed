//! Pixel locations of every rose cell, per rendering layer.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
};

use serde::{Deserialize, Serialize};

use super::{Cell, Direction, FixtureError, Layer, Tier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
/// Image-space position. Row is the vertical axis, counted from the top.
pub struct PixelCoord {
    pub row: u32,
    pub col: u32,
}

impl PixelCoord {
    pub fn new(row: u32, col: u32) -> Self {
        PixelCoord { row, col }
    }
}

impl From<[u32; 2]> for PixelCoord {
    fn from([row, col]: [u32; 2]) -> Self {
        PixelCoord { row, col }
    }
}

impl From<PixelCoord> for [u32; 2] {
    fn from(c: PixelCoord) -> Self {
        [c.row, c.col]
    }
}

type RawMap = BTreeMap<Tier, BTreeMap<Layer, BTreeMap<Direction, Vec<PixelCoord>>>>;

#[derive(Debug, Clone, Default, PartialEq)]
/// Where to sample (decoding) or seed a flood fill (generation) for each
/// tier, layer and direction.
///
/// Built once from a fixture and read-only afterwards. Not every cell has
/// shadow artwork, so most lookups on shadow layers miss.
pub struct RoseCoordinateMap {
    entries: BTreeMap<(Tier, Layer, Direction), Vec<PixelCoord>>,
}

impl RoseCoordinateMap {
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = ((Tier, Layer, Direction), Vec<PixelCoord>)>,
    {
        RoseCoordinateMap {
            entries: entries
                .into_iter()
                .filter(|(_, coords)| !coords.is_empty())
                .collect(),
        }
    }

    /// JSON shape: `{"bottom": {"fill": {"N": [[row, col], ...]}}}`.
    pub fn from_json(json: &str) -> Result<Self, FixtureError> {
        let raw: RawMap = serde_json::from_str(json)?;
        let entries = raw.into_iter().flat_map(|(tier, layers)| {
            layers.into_iter().flat_map(move |(layer, directions)| {
                directions
                    .into_iter()
                    .map(move |(direction, coords)| ((tier, layer, direction), coords))
            })
        });

        Ok(Self::from_entries(entries))
    }

    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, FixtureError> {
        let mut raw = RawMap::new();
        for ((tier, layer, direction), coords) in &self.entries {
            raw.entry(*tier)
                .or_default()
                .entry(*layer)
                .or_default()
                .insert(*direction, coords.clone());
        }

        Ok(serde_json::to_string_pretty(&raw)?)
    }

    pub fn coords(&self, tier: Tier, layer: Layer, direction: Direction) -> Option<&[PixelCoord]> {
        self.entries
            .get(&(tier, layer, direction))
            .map(|v| v.as_slice())
    }

    /// Cells with at least one layer present.
    pub fn cells(&self) -> BTreeSet<Cell> {
        self.entries
            .keys()
            .map(|(tier, _, direction)| Cell::new(*tier, *direction))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// -- Tests -------------------------------------------------------------------
