//! Region lookup for a single point.

use anyhow::Result;

use crate::{config::Settings, region::LatLon};

pub fn locate(settings: &Settings, lat: f64, lon: f64, elevation: Option<f64>) -> Result<String> {
    let index = settings.region_index()?;
    let point = LatLon::new(lat, lon);

    let lines: Vec<String> = index
        .regions_for(point)
        .into_iter()
        .map(|m| {
            let mut line = m.region.name.clone();
            if let Some(elevation) = elevation {
                match m.region.tier(elevation) {
                    0 => line.push_str(", unbanded"),
                    tier => line.push_str(&format!(", tier {}", tier)),
                }
            }
            if !m.interior {
                line.push_str(", near boundary");
            }
            line
        })
        .collect();

    if lines.is_empty() {
        return Ok(format!("({}, {}) is not in any region", lat, lon));
    }

    Ok(lines.join("\n"))
}

// -- Tests -------------------------------------------------------------------
