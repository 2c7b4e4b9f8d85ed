//! Forecast region polygons and station placement.

pub mod geometry;
pub mod index;
pub mod roster;

use thiserror::Error;

pub use geometry::LatLon;
pub use index::{BoundaryTolerance, ElevationBand, Placement, Region, RegionIndex, RegionMatch};
pub use roster::{assign_stations, RegionRoster, Roster, RosterEntry, Sited};

#[derive(Debug, Error)]
pub enum RegionError {
    #[error("region `{region}` has {count} vertices, at least 3 are needed")]
    TooFewVertices { region: String, count: usize },
    #[error("region `{region}` has zero area")]
    ZeroArea { region: String },
    #[error("region `{region}` crosses itself at edges {first} and {second}")]
    SelfIntersecting {
        region: String,
        first: usize,
        second: usize,
    },
    #[error("region `{region}` has a non-finite coordinate")]
    NonFinite { region: String },
    #[error("region `{region}` has invalid elevation bands: {reason}")]
    BadBands { region: String, reason: String },
    #[error("boundary tolerance {0:?} must be finite, non-negative and at most {1}")]
    BadTolerance(BoundaryTolerance, f64),
    #[error("region `{0}` is declared twice")]
    DuplicateName(String),
    #[error("could not read regions: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid region file: {0}")]
    Json(#[from] serde_json::Error),
}
