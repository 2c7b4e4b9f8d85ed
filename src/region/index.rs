//! Forecast regions and the spatial index used to place stations in them.

use std::{
    collections::{HashMap, HashSet},
    path::Path,
};

use serde::{Deserialize, Serialize};

use super::{
    geometry::{self, BoundingBox, LatLon, KM_PER_DEGREE_LAT},
    RegionError,
};

const DEFAULT_REGIONS: &str = include_str!("../../static_data/regions.json");
const MAX_BANDS: usize = 3;
// Grid bucket edge in degrees
const CELL_DEG: f64 = 0.5;
const MAX_TOLERANCE_KM: f64 = 500.0;
const MAX_TOLERANCE_DEG: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
/// Closed elevation interval in feet.
pub struct ElevationBand {
    pub min: f64,
    pub max: f64,
}

impl From<[f64; 2]> for ElevationBand {
    fn from([min, max]: [f64; 2]) -> Self {
        ElevationBand { min, max }
    }
}

impl From<ElevationBand> for [f64; 2] {
    fn from(b: ElevationBand) -> Self {
        [b.min, b.max]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub boundary: Vec<LatLon>,
    #[serde(default)]
    pub bands: Vec<ElevationBand>,
}

impl Region {
    /// Elevation tier 1..=3 for `elevation_ft`, or 0 when the region has no bands.
    ///
    /// Upper bounds are inclusive; anything above the last band stays in it.
    pub fn tier(&self, elevation_ft: f64) -> u8 {
        if self.bands.is_empty() {
            return 0;
        }
        let index = self
            .bands
            .iter()
            .position(|band| elevation_ft <= band.max)
            .unwrap_or(self.bands.len() - 1);

        index as u8 + 1
    }

    fn validate(&mut self) -> Result<(), RegionError> {
        if self.boundary.len() > 1 && self.boundary.first() == self.boundary.last() {
            self.boundary.pop();
        }

        let name = || self.name.clone();
        if self.boundary.iter().any(|p| !p.is_finite()) {
            return Err(RegionError::NonFinite { region: name() });
        }
        if self.boundary.len() < 3 {
            return Err(RegionError::TooFewVertices {
                region: name(),
                count: self.boundary.len(),
            });
        }
        if let Some((first, second)) = geometry::self_intersection(&self.boundary) {
            return Err(RegionError::SelfIntersecting {
                region: name(),
                first,
                second,
            });
        }
        if geometry::signed_area(&self.boundary).abs() <= f64::EPSILON {
            return Err(RegionError::ZeroArea { region: name() });
        }

        let bad_bands = |reason: String| RegionError::BadBands {
            region: self.name.clone(),
            reason,
        };
        if self.bands.len() > MAX_BANDS {
            return Err(bad_bands(format!("{} bands, at most {}", self.bands.len(), MAX_BANDS)));
        }
        for band in &self.bands {
            if !(band.min <= band.max) {
                return Err(bad_bands(format!("[{}, {}] is empty", band.min, band.max)));
            }
        }
        for pair in self.bands.windows(2) {
            let gap = pair[1].min - pair[0].max;
            if gap <= 0.0 || gap > 1.0 {
                return Err(bad_bands(format!(
                    "[{}, {}] does not follow [{}, {}]",
                    pair[1].min, pair[1].max, pair[0].min, pair[0].max
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// How far outside a polygon a point may lie and still belong to it.
pub enum BoundaryTolerance {
    Kilometres(f64),
    /// Raw degree distance in the (lon, lat) plane. Longitude degrees shrink
    /// with latitude, so this is anisotropic.
    Degrees(f64),
}

impl Default for BoundaryTolerance {
    fn default() -> Self {
        BoundaryTolerance::Kilometres(40.0)
    }
}

impl BoundaryTolerance {
    fn validate(&self) -> Result<(), RegionError> {
        let (value, max) = match *self {
            BoundaryTolerance::Kilometres(km) => (km, MAX_TOLERANCE_KM),
            BoundaryTolerance::Degrees(d) => (d, MAX_TOLERANCE_DEG),
        };
        if !value.is_finite() || value < 0.0 || value > max {
            return Err(RegionError::BadTolerance(*self, max));
        }

        Ok(())
    }

    fn margins_deg(&self, bbox: &BoundingBox) -> (f64, f64) {
        match *self {
            BoundaryTolerance::Degrees(d) => (d, d),
            BoundaryTolerance::Kilometres(km) => {
                let lat = km / KM_PER_DEGREE_LAT;
                let widest = (bbox.max.lat.abs().max(bbox.min.lat.abs()) + lat).min(89.0);
                let lon = km / (KM_PER_DEGREE_LAT * widest.to_radians().cos());
                (lat, lon.min(180.0))
            }
        }
    }

    fn admits(&self, ring: &[LatLon], p: LatLon) -> bool {
        match *self {
            BoundaryTolerance::Degrees(d) => geometry::boundary_distance_deg(ring, p) <= d,
            BoundaryTolerance::Kilometres(km) => geometry::boundary_distance_km(ring, p) <= km,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionMatch<'a> {
    pub region: &'a Region,
    /// False when the point was admitted by the boundary tolerance.
    pub interior: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub region: String,
    pub elevation_level: u8,
    pub interior: bool,
}

#[derive(Debug, Deserialize)]
struct RegionFile {
    regions: Vec<Region>,
}

#[derive(Debug, Clone)]
/// Immutable index over validated region polygons.
pub struct RegionIndex {
    regions: Vec<Region>,
    bounds: Vec<BoundingBox>,
    grid: HashMap<(i64, i64), Vec<usize>>,
    tolerance: BoundaryTolerance,
}

fn grid_cell(p: LatLon) -> (i64, i64) {
    ((p.lon / CELL_DEG).floor() as i64, (p.lat / CELL_DEG).floor() as i64)
}

impl RegionIndex {
    pub fn new(regions: Vec<Region>, tolerance: BoundaryTolerance) -> Result<Self, RegionError> {
        tolerance.validate()?;
        let mut regions = regions;
        let mut seen = HashSet::new();
        for region in regions.iter_mut() {
            region.validate()?;
            if !seen.insert(region.name.clone()) {
                return Err(RegionError::DuplicateName(region.name.clone()));
            }
        }

        let mut bounds = Vec::with_capacity(regions.len());
        let mut grid: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
        for (i, region) in regions.iter().enumerate() {
            let bbox = BoundingBox::around(&region.boundary).ok_or(RegionError::TooFewVertices {
                region: region.name.clone(),
                count: 0,
            })?;
            let (lat_margin, lon_margin) = tolerance.margins_deg(&bbox);
            let bbox = bbox.expand(lat_margin, lon_margin);

            let (x0, y0) = grid_cell(bbox.min);
            let (x1, y1) = grid_cell(bbox.max);
            for x in x0..=x1 {
                for y in y0..=y1 {
                    grid.entry((x, y)).or_default().push(i);
                }
            }
            bounds.push(bbox);
        }

        Ok(RegionIndex {
            regions,
            bounds,
            grid,
            tolerance,
        })
    }

    pub fn from_json(json: &str, tolerance: BoundaryTolerance) -> Result<Self, RegionError> {
        let file: RegionFile = serde_json::from_str(json)?;
        Self::new(file.regions, tolerance)
    }

    pub fn load(path: &Path, tolerance: BoundaryTolerance) -> Result<Self, RegionError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json, tolerance)
    }

    /// The nine Utah Avalanche Center forecast regions.
    pub fn bundled(tolerance: BoundaryTolerance) -> Result<Self, RegionError> {
        Self::from_json(DEFAULT_REGIONS, tolerance)
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Every region containing `point` or within tolerance of its boundary,
    /// in declaration order.
    pub fn regions_for(&self, point: LatLon) -> Vec<RegionMatch<'_>> {
        let Some(candidates) = self.grid.get(&grid_cell(point)) else {
            return Vec::new();
        };

        candidates
            .iter()
            .filter(|&&i| self.bounds[i].contains(point))
            .filter_map(|&i| {
                let region = &self.regions[i];
                if geometry::contains(&region.boundary, point) {
                    Some(RegionMatch {
                        region,
                        interior: true,
                    })
                } else if self.tolerance.admits(&region.boundary, point) {
                    Some(RegionMatch {
                        region,
                        interior: false,
                    })
                } else {
                    None
                }
            })
            .collect()
    }

    /// Region and elevation tier for every region that admits `point`.
    pub fn assign(&self, point: LatLon, elevation_ft: f64) -> Vec<Placement> {
        self.regions_for(point)
            .into_iter()
            .map(|m| Placement {
                region: m.region.name.clone(),
                elevation_level: m.region.tier(elevation_ft),
                interior: m.interior,
            })
            .collect()
    }
}

// -- Tests -------------------------------------------------------------------
