//! Paints danger levels into a blank rose template.

use std::collections::{BTreeMap, VecDeque};

use image::{Rgba, RgbaImage};
use serde::Deserialize;
use thiserror::Error;

use super::{
    Cell, ColorSample, ColorTable, DangerLevel, DangerParseError, Direction, Layer, PixelCoord,
    RoseCoordinateMap, Tier,
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
/// A danger level as written in a generator input: a name or a numeric code.
pub enum DangerInput {
    Code(i64),
    Name(String),
}

impl DangerInput {
    pub fn resolve(&self) -> Result<DangerLevel, DangerParseError> {
        match self {
            DangerInput::Code(code) => DangerLevel::from_code(*code),
            DangerInput::Name(name) => name.parse(),
        }
    }
}

impl From<DangerLevel> for DangerInput {
    fn from(level: DangerLevel) -> Self {
        DangerInput::Name(level.name().to_string())
    }
}

/// Generator input: tier -> direction -> level. Missing cells are left blank.
pub type GridInput = BTreeMap<Tier, BTreeMap<Direction, DangerInput>>;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("cell {cell}: {source}")]
    Level {
        cell: Cell,
        #[source]
        source: DangerParseError,
    },
    #[error("cell {cell}: `{level}` has no fill colour")]
    NoFill { cell: Cell, level: DangerLevel },
    #[error("cell {cell}, {layer:?} layer: seed {seed:?} is outside the image")]
    SeedOutOfBounds {
        cell: Cell,
        layer: Layer,
        seed: PixelCoord,
    },
    #[error("cell {cell}, {layer:?} layer: seed {seed:?} lies on an outline stroke")]
    SeedOnOutline {
        cell: Cell,
        layer: Layer,
        seed: PixelCoord,
    },
    #[error("cell {cell}, {layer:?} layer: region at seed {seed:?} is not closed")]
    Unbounded {
        cell: Cell,
        layer: Layer,
        seed: PixelCoord,
    },
}

#[derive(Debug, Clone)]
pub struct RoseGenerator {
    map: RoseCoordinateMap,
    table: ColorTable,
    alpha: u8,
    outline: ColorSample,
}

impl RoseGenerator {
    pub fn new(map: RoseCoordinateMap, table: ColorTable) -> Self {
        RoseGenerator {
            map,
            table,
            alpha: u8::MAX,
            outline: ColorSample::opaque(0, 0, 0),
        }
    }

    /// Opacity of painted regions. Outline strokes are never repainted.
    pub fn with_alpha(mut self, alpha: u8) -> Self {
        self.alpha = alpha;
        self
    }

    /// Fills every requested cell on a copy of `base`.
    ///
    /// Paint order is tier, then direction, then layer. Where regions
    /// overlap the later fill wins.
    pub fn generate(&self, base: &RgbaImage, input: &GridInput) -> Result<RgbaImage, GenerateError> {
        let mut image = base.clone();

        for tier in Tier::ALL {
            let Some(directions) = input.get(&tier) else {
                continue;
            };
            for direction in Direction::ALL {
                let Some(value) = directions.get(&direction) else {
                    continue;
                };
                let cell = Cell::new(tier, direction);
                let level = value
                    .resolve()
                    .map_err(|source| GenerateError::Level { cell, source })?;
                if self.table.lookup(Layer::Fill, level).is_none() {
                    return Err(GenerateError::NoFill { cell, level });
                }

                for layer in Layer::PRIORITY {
                    let (Some(seeds), Some(color)) = (
                        self.map.coords(tier, layer, direction),
                        self.table.lookup(layer, level),
                    ) else {
                        continue;
                    };
                    let paint = color.with_alpha(self.alpha).to_rgba();

                    for seed in seeds {
                        self.fill(base, &mut image, *seed, paint)
                            .map_err(|fault| fault.into_error(cell, layer, *seed))?;
                    }
                }
            }
        }

        Ok(image)
    }

    /// Regions are traced on the untouched `base` so earlier paint never
    /// changes connectivity or reads as an outline stroke.
    fn fill(
        &self,
        base: &RgbaImage,
        image: &mut RgbaImage,
        seed: PixelCoord,
        paint: Rgba<u8>,
    ) -> Result<(), FillFault> {
        let (width, height) = base.dimensions();
        if seed.row >= height || seed.col >= width {
            return Err(FillFault::OutOfBounds);
        }
        let target = *base.get_pixel(seed.col, seed.row);
        if ColorSample::from(target).rgb == self.outline.rgb {
            return Err(FillFault::OnOutline);
        }

        let region = flood_region(base, seed).ok_or(FillFault::Unbounded)?;
        for (col, row) in region {
            image.put_pixel(col, row, paint);
        }

        Ok(())
    }
}

enum FillFault {
    OutOfBounds,
    OnOutline,
    Unbounded,
}

impl FillFault {
    fn into_error(self, cell: Cell, layer: Layer, seed: PixelCoord) -> GenerateError {
        match self {
            FillFault::OutOfBounds => GenerateError::SeedOutOfBounds { cell, layer, seed },
            FillFault::OnOutline => GenerateError::SeedOnOutline { cell, layer, seed },
            FillFault::Unbounded => GenerateError::Unbounded { cell, layer, seed },
        }
    }
}

/// Pixels 4-connected to `seed` with exactly the seed's colour, as (x, y).
///
/// Returns `None` when the region reaches the image edge, which means the
/// template has no closed outline around the seed.
fn flood_region(image: &RgbaImage, seed: PixelCoord) -> Option<Vec<(u32, u32)>> {
    let (width, height) = image.dimensions();
    let target = *image.get_pixel(seed.col, seed.row);
    let mut visited = vec![false; width as usize * height as usize];
    let mut queue = VecDeque::from([(seed.col, seed.row)]);
    let mut region = Vec::new();
    visited[(seed.row * width + seed.col) as usize] = true;

    while let Some((x, y)) = queue.pop_front() {
        if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
            return None;
        }
        region.push((x, y));

        for (nx, ny) in [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)] {
            let idx = (ny * width + nx) as usize;
            if !visited[idx] && *image.get_pixel(nx, ny) == target {
                visited[idx] = true;
                queue.push_back((nx, ny));
            }
        }
    }

    Some(region)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::rose::ColorSpace;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    // 12x7 image: a black frame split by a vertical stroke at x = 6 into two
    // closed boxes, left interior x 1..=5, right interior x 7..=10.
    fn two_boxes() -> RgbaImage {
        let mut image = RgbaImage::from_pixel(12, 7, WHITE);
        for x in 0..12 {
            image.put_pixel(x, 0, BLACK);
            image.put_pixel(x, 6, BLACK);
        }
        for y in 0..7 {
            for x in [0, 6, 11] {
                image.put_pixel(x, y, BLACK);
            }
        }
        image
    }

    fn table() -> ColorTable {
        ColorTable::bundled().unwrap()
    }

    fn input(entries: &[(Tier, Direction, &str)]) -> GridInput {
        let mut grid = GridInput::new();
        for (tier, direction, value) in entries {
            grid.entry(*tier)
                .or_default()
                .insert(*direction, DangerInput::Name(value.to_string()));
        }
        grid
    }

    #[test]
    fn should_fill_only_the_seeded_box() {
        let map = RoseCoordinateMap::from_entries([(
            (Tier::Bottom, Layer::Fill, Direction::N),
            vec![PixelCoord::new(3, 2)],
        )]);
        let generator = RoseGenerator::new(map, table());

        let image = generator
            .generate(&two_boxes(), &input(&[(Tier::Bottom, Direction::N, "high")]))
            .unwrap();

        let high = table().lookup(Layer::Fill, DangerLevel::High).unwrap().to_rgba();
        assert_eq!(*image.get_pixel(1, 1), high);
        assert_eq!(*image.get_pixel(5, 5), high);
        assert_eq!(*image.get_pixel(6, 3), BLACK);
        assert_eq!(*image.get_pixel(8, 3), WHITE);
    }

    #[test]
    fn should_accept_numeric_strings_and_codes() {
        let map = RoseCoordinateMap::from_entries([
            (
                (Tier::Top, Layer::Fill, Direction::E),
                vec![PixelCoord::new(3, 2)],
            ),
            (
                (Tier::Top, Layer::Fill, Direction::W),
                vec![PixelCoord::new(3, 8)],
            ),
        ]);
        let mut grid = input(&[(Tier::Top, Direction::E, "2")]);
        grid.get_mut(&Tier::Top)
            .unwrap()
            .insert(Direction::W, DangerInput::Code(5));

        let image = RoseGenerator::new(map, table())
            .generate(&two_boxes(), &grid)
            .unwrap();

        let t = table();
        assert_eq!(
            *image.get_pixel(2, 3),
            t.lookup(Layer::Fill, DangerLevel::Moderate).unwrap().to_rgba()
        );
        assert_eq!(
            *image.get_pixel(8, 3),
            t.lookup(Layer::Fill, DangerLevel::Extreme).unwrap().to_rgba()
        );
    }

    #[test]
    fn should_reject_out_of_range_code() {
        let map = RoseCoordinateMap::from_entries([(
            (Tier::Top, Layer::Fill, Direction::E),
            vec![PixelCoord::new(3, 2)],
        )]);
        let result = RoseGenerator::new(map, table())
            .generate(&two_boxes(), &input(&[(Tier::Top, Direction::E, "7")]));

        assert!(matches!(
            result,
            Err(GenerateError::Level {
                source: DangerParseError::CodeOutOfRange(7),
                ..
            })
        ));
    }

    #[test]
    fn should_reject_unknown_level() {
        let map = RoseCoordinateMap::from_entries([(
            (Tier::Top, Layer::Fill, Direction::E),
            vec![PixelCoord::new(3, 2)],
        )]);
        let result = RoseGenerator::new(map, table())
            .generate(&two_boxes(), &input(&[(Tier::Top, Direction::E, "unknown")]));

        assert!(matches!(result, Err(GenerateError::NoFill { .. })));
    }

    #[test]
    fn should_refuse_unbounded_fill() {
        let mut open = two_boxes();
        open.put_pixel(11, 3, WHITE);
        let map = RoseCoordinateMap::from_entries([(
            (Tier::Middle, Layer::Fill, Direction::S),
            vec![PixelCoord::new(3, 8)],
        )]);

        let result = RoseGenerator::new(map, table())
            .generate(&open, &input(&[(Tier::Middle, Direction::S, "low")]));

        assert!(matches!(result, Err(GenerateError::Unbounded { .. })));
    }

    #[test]
    fn should_refuse_seed_on_outline_or_outside() {
        let on_line = RoseCoordinateMap::from_entries([(
            (Tier::Middle, Layer::Fill, Direction::S),
            vec![PixelCoord::new(3, 6)],
        )]);
        let outside = RoseCoordinateMap::from_entries([(
            (Tier::Middle, Layer::Fill, Direction::S),
            vec![PixelCoord::new(30, 6)],
        )]);
        let grid = input(&[(Tier::Middle, Direction::S, "low")]);

        assert!(matches!(
            RoseGenerator::new(on_line, table()).generate(&two_boxes(), &grid),
            Err(GenerateError::SeedOnOutline { .. })
        ));
        assert!(matches!(
            RoseGenerator::new(outside, table()).generate(&two_boxes(), &grid),
            Err(GenerateError::SeedOutOfBounds { .. })
        ));
    }

    #[test]
    fn should_let_later_layers_overwrite() {
        // Fill and dark shadow seeded into the same box: dark shadow paints last
        let map = RoseCoordinateMap::from_entries([
            (
                (Tier::Bottom, Layer::Fill, Direction::N),
                vec![PixelCoord::new(3, 2)],
            ),
            (
                (Tier::Bottom, Layer::DarkShadow, Direction::N),
                vec![PixelCoord::new(2, 3)],
            ),
        ]);
        let image = RoseGenerator::new(map, table())
            .generate(&two_boxes(), &input(&[(Tier::Bottom, Direction::N, "low")]))
            .unwrap();

        // The dark shadow seed sits in the already-filled region and recolours it
        let dark = table()
            .lookup(Layer::DarkShadow, DangerLevel::Low)
            .unwrap()
            .to_rgba();
        assert_eq!(*image.get_pixel(3, 2), dark);
        assert_eq!(*image.get_pixel(1, 1), dark);
    }

    #[test]
    fn should_repaint_over_black_shadow() {
        let map = RoseCoordinateMap::from_entries([
            (
                (Tier::Bottom, Layer::DarkShadow, Direction::N),
                vec![PixelCoord::new(3, 2)],
            ),
            (
                (Tier::Bottom, Layer::Fill, Direction::NE),
                vec![PixelCoord::new(2, 3)],
            ),
        ]);
        let mut colors = BTreeMap::new();
        for level in DangerLevel::RATED {
            let fill = table().lookup(Layer::Fill, level).unwrap();
            colors.insert((Layer::Fill, level), fill);
        }
        colors.insert(
            (Layer::DarkShadow, DangerLevel::Extreme),
            ColorSample::opaque(0, 0, 0),
        );
        let table = ColorTable::new(ColorSpace::Hsv, colors).unwrap();
        let mut grid = input(&[(Tier::Bottom, Direction::N, "extreme")]);
        grid.get_mut(&Tier::Bottom)
            .unwrap()
            .insert(Direction::NE, DangerInput::Name("low".to_string()));

        let image = RoseGenerator::new(map, table.clone())
            .generate(&two_boxes(), &grid)
            .unwrap();

        let low = table.lookup(Layer::Fill, DangerLevel::Low).unwrap().to_rgba();
        assert_eq!(*image.get_pixel(1, 1), low);
        assert_eq!(*image.get_pixel(6, 3), BLACK);
        assert_eq!(*image.get_pixel(8, 3), WHITE);
    }

    #[test]
    fn should_apply_alpha_to_fills_only() {
        let map = RoseCoordinateMap::from_entries([(
            (Tier::Bottom, Layer::Fill, Direction::N),
            vec![PixelCoord::new(3, 2)],
        )]);
        let image = RoseGenerator::new(map, table())
            .with_alpha(128)
            .generate(&two_boxes(), &input(&[(Tier::Bottom, Direction::N, "low")]))
            .unwrap();

        assert_eq!(image.get_pixel(2, 3).0[3], 128);
        assert_eq!(*image.get_pixel(0, 0), BLACK);
    }

    #[test]
    fn should_deserialise_mixed_input() {
        let json = r#"{"bottom": {"N": "none", "NE": 3}, "top": {"SW": "4"}}"#;
        let grid: GridInput = serde_json::from_str(json).unwrap();

        assert_eq!(
            grid[&Tier::Bottom][&Direction::NE].resolve().unwrap(),
            DangerLevel::Considerable
        );
        assert_eq!(
            grid[&Tier::Top][&Direction::SW].resolve().unwrap(),
            DangerLevel::High
        );
    }
}
