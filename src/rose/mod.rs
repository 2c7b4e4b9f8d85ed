//! Forecast rose images: colour table, cell geometry, decoding and painting.

pub mod color;
pub mod coords;
pub mod danger;
pub mod decode;
pub mod generate;
pub mod template;

use thiserror::Error;

pub use color::{classify, ColorSample, ColorSpace, ColorTable};
pub use coords::{PixelCoord, RoseCoordinateMap};
pub use danger::{Cell, DangerLevel, DangerParseError, Direction, Layer, Tier};
pub use decode::{RoseDecoder, RoseReading};
pub use generate::{DangerInput, GenerateError, GridInput, RoseGenerator};
pub use template::TemplateGeometry;

#[derive(Debug, Error)]
/// Problems loading a colour table or coordinate map.
pub enum FixtureError {
    #[error("could not read fixture: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid fixture: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no fill colour for danger level `{0}`")]
    MissingFill(DangerLevel),
    #[error("`unknown` cannot be given a colour")]
    UnknownHasColor,
    #[error("`{0}` is not a #RRGGBB colour")]
    BadHex(String),
    #[error("bad colour table key: {0}")]
    BadLevel(#[from] DangerParseError),
    #[error("danger level `{level}` is listed twice on the {layer:?} layer")]
    DuplicateLevel { layer: Layer, level: DangerLevel },
}
