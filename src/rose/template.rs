//! A synthetic blank rose and the coordinate map that matches it.
//!
//! Three concentric rings (top is the inner disk) cut into eight wedges by
//! black strokes. Every cell is a closed white region, so the template is
//! safe to flood fill.

use image::{Rgba, RgbaImage};

use super::{Direction, Layer, PixelCoord, RoseCoordinateMap, Tier};

const STROKE_HALF_WIDTH: f64 = 1.0;
const OUTLINE: Rgba<u8> = Rgba([0, 0, 0, 255]);
const BLANK: Rgba<u8> = Rgba([255, 255, 255, 255]);
const OUTSIDE: Rgba<u8> = Rgba([255, 255, 255, 0]);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateGeometry {
    pub size: u32,
    /// Outer radius of the top, middle and bottom rings, in pixels.
    pub radii: [f64; 3],
}

impl TemplateGeometry {
    pub fn for_size(size: u32) -> Self {
        let s = size as f64;
        TemplateGeometry {
            size,
            radii: [s * 0.16, s * 0.31, s * 0.46],
        }
    }

    fn centre(&self) -> f64 {
        (self.size as f64 - 1.0) / 2.0
    }

    pub fn render(&self) -> RgbaImage {
        let c = self.centre();
        let outer = self.radii[2];
        let boundaries: Vec<(f64, f64)> = (0..8)
            .map(|k| (22.5 + 45.0 * k as f64).to_radians())
            .map(|a| (a.sin(), a.cos()))
            .collect();

        RgbaImage::from_fn(self.size, self.size, |x, y| {
            // East and north positive
            let dx = x as f64 - c;
            let dy = c - y as f64;
            let r = dx.hypot(dy);

            if self
                .radii
                .iter()
                .any(|radius| (r - radius).abs() <= STROKE_HALF_WIDTH)
            {
                return OUTLINE;
            }
            if r > outer {
                return OUTSIDE;
            }
            let on_boundary = boundaries.iter().any(|(ux, uy)| {
                dx * ux + dy * uy >= 0.0 && (dx * uy - dy * ux).abs() <= STROKE_HALF_WIDTH
            });
            if on_boundary {
                OUTLINE
            } else {
                BLANK
            }
        })
    }

    /// One fill seed per cell, mid-ring on the direction's bearing.
    pub fn coordinate_map(&self) -> RoseCoordinateMap {
        let c = self.centre();
        let [top, middle, bottom] = self.radii;
        let mid_radius = |tier: Tier| match tier {
            Tier::Top => top / 2.0,
            Tier::Middle => (top + middle) / 2.0,
            Tier::Bottom => (middle + bottom) / 2.0,
        };

        RoseCoordinateMap::from_entries(Tier::ALL.into_iter().flat_map(|tier| {
            Direction::ALL.into_iter().map(move |direction| {
                let bearing = direction.bearing().to_radians();
                let r = mid_radius(tier);
                let col = (c + r * bearing.sin()).round() as u32;
                let row = (c - r * bearing.cos()).round() as u32;
                ((tier, Layer::Fill, direction), vec![PixelCoord::new(row, col)])
            })
        }))
    }
}

impl Default for TemplateGeometry {
    fn default() -> Self {
        Self::for_size(400)
    }
}

// -- Tests -------------------------------------------------------------------
