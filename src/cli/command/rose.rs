//! Local rose tools: decode an image, paint a rose, write the template.

use std::{fmt::Write, fs, path::Path};

use anyhow::{anyhow, bail, Result};

use super::write_text_atomically;
use crate::{
    config::Settings,
    rose::{
        classify, Cell, ColorSample, Direction, GridInput, PixelCoord, RoseGenerator,
        RoseReading, TemplateGeometry, Tier,
    },
};

pub const TEMPLATE_IMAGE: &str = "rose-template.png";
pub const TEMPLATE_COORDINATES: &str = "rose-coordinates.json";
const MIN_TEMPLATE_SIZE: u32 = 64;

pub fn read(settings: &Settings, image_path: &Path, pixel: Option<PixelCoord>) -> Result<String> {
    let image = image::open(image_path)?.to_rgba8();

    if let Some(p) = pixel {
        let (width, height) = image.dimensions();
        if p.row >= height || p.col >= width {
            bail!("pixel ({}, {}) is outside the {}x{} image", p.row, p.col, width, height);
        }
        let sample = ColorSample::from(*image.get_pixel(p.col, p.row));
        let table = settings.color_table()?;
        let (_, distance) = table.nearest(sample);

        return Ok(format!(
            "{} at ({}, {}) is {} (distance {:.1})",
            sample,
            p.row,
            p.col,
            classify(sample, &table),
            distance
        ));
    }

    let reading = settings.decoder()?.decode(&image);
    Ok(format_reading(&reading))
}

/// Grid of levels with the top tier first; `-` marks a cell with no data.
fn format_reading(reading: &RoseReading) -> String {
    let mut out = format!("{:<8}", "");
    for direction in Direction::ALL {
        let _ = write!(out, "{:<14}", direction.name());
    }

    for tier in Tier::ALL.into_iter().rev() {
        let _ = write!(out, "\n{:<8}", tier.name());
        for direction in Direction::ALL {
            let cell = Cell::new(tier, direction);
            let value = reading
                .column_value(cell)
                .map(|level| level.name())
                .unwrap_or("-");
            let _ = write!(out, "{:<14}", value);
        }
    }

    out.lines().map(str::trim_end).collect::<Vec<_>>().join("\n")
}

pub fn generate(
    settings: &Settings,
    input: &Path,
    template: Option<&Path>,
    output: &Path,
    alpha: u8,
) -> Result<String> {
    let grid: GridInput = serde_json::from_str(&fs::read_to_string(input)?)?;
    let base = match template {
        Some(path) => image::open(path)?.to_rgba8(),
        None => TemplateGeometry::default().render(),
    };

    let generator = RoseGenerator::new(settings.coordinate_map()?, settings.color_table()?)
        .with_alpha(alpha);
    let image = generator.generate(&base, &grid)?;
    image.save(output)?;

    Ok(output.to_string_lossy().to_string())
}

pub fn template(output_dir: &Path, size: u32) -> Result<String> {
    if size < MIN_TEMPLATE_SIZE {
        bail!("template size must be at least {} pixels", MIN_TEMPLATE_SIZE);
    }
    fs::create_dir_all(output_dir)?;

    let geometry = TemplateGeometry::for_size(size);
    let image_path = output_dir.join(TEMPLATE_IMAGE);
    geometry.render().save(&image_path)?;

    let json = geometry
        .coordinate_map()
        .to_json()
        .map_err(|e| anyhow!(e))?;
    write_text_atomically(&output_dir.join(TEMPLATE_COORDINATES), &json)?;

    Ok(image_path.to_string_lossy().to_string())
}

// -- Tests -------------------------------------------------------------------
