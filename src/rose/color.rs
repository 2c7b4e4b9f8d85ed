//! Danger colour table and nearest-colour classification.

use std::{collections::BTreeMap, fmt, path::Path};

use palette::{FromColor, Hsv, Srgb};
use serde::{Deserialize, Serialize};

use super::{DangerLevel, FixtureError, Layer};

const DEFAULT_COLORS: &str = include_str!("../../static_data/colors.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// An RGB colour plus an opacity used only when painting.
pub struct ColorSample {
    pub rgb: [u8; 3],
    pub alpha: u8,
}

impl ColorSample {
    pub fn opaque(r: u8, g: u8, b: u8) -> Self {
        ColorSample {
            rgb: [r, g, b],
            alpha: u8::MAX,
        }
    }

    pub fn with_alpha(self, alpha: u8) -> Self {
        ColorSample { alpha, ..self }
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

        Some(ColorSample::opaque(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_rgba(self) -> image::Rgba<u8> {
        let [r, g, b] = self.rgb;
        image::Rgba([r, g, b, self.alpha])
    }
}

impl From<image::Rgba<u8>> for ColorSample {
    fn from(px: image::Rgba<u8>) -> Self {
        let [r, g, b, alpha] = px.0;
        ColorSample { rgb: [r, g, b], alpha }
    }
}

impl fmt::Display for ColorSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.rgb;
        write!(f, "#{:02X}{:02X}{:02X}", r, g, b)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Space in which colour distances are measured.
///
/// HSV components are scaled to 0..255 and hue distance wraps around.
pub enum ColorSpace {
    Rgb,
    #[default]
    Hsv,
}

const HUE_PERIOD: f64 = 255.0;

impl ColorSpace {
    fn project(&self, sample: ColorSample) -> [f64; 3] {
        let [r, g, b] = sample.rgb;
        match self {
            ColorSpace::Rgb => [r as f64, g as f64, b as f64],
            ColorSpace::Hsv => {
                let hsv: Hsv = Hsv::from_color(Srgb::new(r, g, b).into_format::<f32>());
                [
                    hsv.hue.into_positive_degrees() as f64 / 360.0 * HUE_PERIOD,
                    hsv.saturation as f64 * 255.0,
                    hsv.value as f64 * 255.0,
                ]
            }
        }
    }

    fn distance(&self, a: &[f64; 3], b: &[f64; 3]) -> f64 {
        let mut d0 = (a[0] - b[0]).abs();
        if *self == ColorSpace::Hsv {
            d0 = d0.min(HUE_PERIOD - d0);
        }
        let d1 = a[1] - b[1];
        let d2 = a[2] - b[2];

        (d0 * d0 + d1 * d1 + d2 * d2).sqrt()
    }
}

#[derive(Debug, Deserialize)]
struct RawColorTable {
    #[serde(default)]
    space: ColorSpace,
    // Keys are level names or numeric codes
    fill: BTreeMap<String, String>,
    #[serde(default)]
    light_shadow: BTreeMap<String, String>,
    #[serde(default)]
    dark_shadow: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
/// Colours registered for each danger level on each rendering layer.
///
/// Every rated level has a fill colour. Shadow colours are optional.
pub struct ColorTable {
    space: ColorSpace,
    colors: BTreeMap<(Layer, DangerLevel), ColorSample>,
    // (level, layer, projected colour) in tie-break order
    projected: Vec<(DangerLevel, Layer, [f64; 3])>,
}

impl ColorTable {
    pub fn new(
        space: ColorSpace,
        colors: BTreeMap<(Layer, DangerLevel), ColorSample>,
    ) -> Result<Self, FixtureError> {
        for level in DangerLevel::RATED {
            if !colors.contains_key(&(Layer::Fill, level)) {
                return Err(FixtureError::MissingFill(level));
            }
        }
        if colors.keys().any(|(_, level)| *level == DangerLevel::Unknown) {
            return Err(FixtureError::UnknownHasColor);
        }

        let mut projected = Vec::with_capacity(colors.len());
        for level in DangerLevel::RATED {
            for layer in Layer::PRIORITY {
                if let Some(sample) = colors.get(&(layer, level)) {
                    projected.push((level, layer, space.project(*sample)));
                }
            }
        }

        Ok(ColorTable {
            space,
            colors,
            projected,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, FixtureError> {
        let raw: RawColorTable = serde_json::from_str(json)?;
        let mut colors = BTreeMap::new();

        for (layer, entries) in [
            (Layer::Fill, raw.fill),
            (Layer::LightShadow, raw.light_shadow),
            (Layer::DarkShadow, raw.dark_shadow),
        ] {
            for (key, hex) in entries {
                let level: DangerLevel = key.parse()?;
                let sample =
                    ColorSample::from_hex(&hex).ok_or_else(|| FixtureError::BadHex(hex.clone()))?;
                if colors.insert((layer, level), sample).is_some() {
                    return Err(FixtureError::DuplicateLevel { layer, level });
                }
            }
        }

        Self::new(raw.space, colors)
    }

    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// The Utah Avalanche Center palette bundled with the crate.
    pub fn bundled() -> Result<Self, FixtureError> {
        Self::from_json(DEFAULT_COLORS)
    }

    pub fn space(&self) -> ColorSpace {
        self.space
    }

    pub fn lookup(&self, layer: Layer, level: DangerLevel) -> Option<ColorSample> {
        self.colors.get(&(layer, level)).copied()
    }

    /// Nearest registered level and its distance, over every layer.
    pub fn nearest(&self, sample: ColorSample) -> (DangerLevel, f64) {
        let point = self.space.project(sample);
        let mut best = (DangerLevel::None, f64::INFINITY);

        for (level, _, color) in &self.projected {
            let distance = self.space.distance(&point, color);
            if distance < best.1 {
                best = (*level, distance);
            }
        }

        best
    }
}

/// Nearest danger level to `sample`. Always resolves to a rated level.
pub fn classify(sample: ColorSample, table: &ColorTable) -> DangerLevel {
    table.nearest(sample).0
}

// -- Tests -------------------------------------------------------------------
