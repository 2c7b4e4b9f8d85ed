//! Reads the danger level of every cell out of a rose image.

use std::collections::{BTreeMap, BTreeSet};

use image::RgbaImage;

use super::{Cell, ColorSample, ColorTable, DangerLevel, Layer, PixelCoord, RoseCoordinateMap};

#[derive(Debug, Clone, Default, PartialEq)]
/// Result of decoding one rose.
///
/// Cells the coordinate map does not cover appear in neither set. Cells that
/// were sampled but matched no colour within the threshold are `unmatched`.
pub struct RoseReading {
    pub levels: BTreeMap<Cell, DangerLevel>,
    pub unmatched: BTreeSet<Cell>,
}

impl RoseReading {
    /// Value for a dataset column: `Unknown` for unmatched, `None` for no data.
    pub fn column_value(&self, cell: Cell) -> Option<DangerLevel> {
        match self.levels.get(&cell) {
            Some(level) => Some(*level),
            None if self.unmatched.contains(&cell) => Some(DangerLevel::Unknown),
            None => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty() && self.unmatched.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct RoseDecoder {
    map: RoseCoordinateMap,
    table: ColorTable,
    max_distance: Option<f64>,
    sample_radius: u32,
}

impl RoseDecoder {
    pub fn new(map: RoseCoordinateMap, table: ColorTable) -> Self {
        RoseDecoder {
            map,
            table,
            max_distance: None,
            sample_radius: 0,
        }
    }

    /// Samples further than `max_distance` from every table colour do not match.
    pub fn with_max_distance(mut self, max_distance: Option<f64>) -> Self {
        self.max_distance = max_distance;
        self
    }

    /// Sample the per-channel median of a `(2r + 1)²` window instead of one pixel.
    pub fn with_sample_radius(mut self, radius: u32) -> Self {
        self.sample_radius = radius;
        self
    }

    pub fn map(&self) -> &RoseCoordinateMap {
        &self.map
    }

    pub fn decode(&self, image: &RgbaImage) -> RoseReading {
        let mut reading = RoseReading::default();

        'cells: for cell in self.map.cells() {
            let mut sampled = false;

            for layer in Layer::PRIORITY {
                let Some(coords) = self.map.coords(cell.tier, layer, cell.direction) else {
                    continue;
                };

                for coord in coords {
                    let Some(sample) = self.sample(image, *coord) else {
                        continue;
                    };
                    sampled = true;

                    let (level, distance) = self.table.nearest(sample);
                    if self.max_distance.map_or(true, |max| distance <= max) {
                        reading.levels.insert(cell, level);
                        continue 'cells;
                    }
                }
            }

            if sampled {
                reading.unmatched.insert(cell);
            }
        }

        reading
    }

    fn sample(&self, image: &RgbaImage, coord: PixelCoord) -> Option<ColorSample> {
        let (width, height) = image.dimensions();
        if coord.row >= height || coord.col >= width {
            return None;
        }

        let r = self.sample_radius;
        if r == 0 {
            return Some(ColorSample::from(*image.get_pixel(coord.col, coord.row)));
        }

        let rows = coord.row.saturating_sub(r)..=(coord.row + r).min(height - 1);
        let cols = coord.col.saturating_sub(r)..=(coord.col + r).min(width - 1);
        let mut channels: [Vec<u8>; 3] = Default::default();
        for row in rows {
            for col in cols.clone() {
                let px = image.get_pixel(col, row);
                for (i, channel) in channels.iter_mut().enumerate() {
                    channel.push(px.0[i]);
                }
            }
        }

        let median = |values: &mut Vec<u8>| {
            values.sort_unstable();
            values[values.len() / 2]
        };
        let [r, g, b] = &mut channels;

        Some(ColorSample::opaque(median(r), median(g), median(b)))
    }
}

// -- Tests -------------------------------------------------------------------
