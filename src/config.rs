//! Runtime settings, read from a TOML file with every field optional.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    download::Fetcher,
    region::{BoundaryTolerance, RegionIndex},
    rose::{ColorTable, RoseCoordinateMap, RoseDecoder, TemplateGeometry},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directory datasets are written to.
    pub out_dir: PathBuf,
    /// Two letter state code for the station query.
    pub state: String,
    pub max_workers: usize,
    pub timeout_secs: u64,
    /// Days fetched on a first SNOTEL run.
    pub lookback_days: u64,
    pub tolerance: BoundaryTolerance,
    /// Colour distance beyond which a rose sample is `unknown`.
    pub max_color_distance: Option<f64>,
    pub sample_radius: u32,
    pub regions: Option<PathBuf>,
    pub colors: Option<PathBuf>,
    pub coordinates: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            out_dir: dirs::home_dir()
                .map(|home| home.join("snowrose"))
                .unwrap_or_else(|| PathBuf::from("snowrose")),
            state: "UT".to_string(),
            max_workers: 12,
            timeout_secs: 60,
            lookback_days: 30,
            tolerance: BoundaryTolerance::default(),
            max_color_distance: None,
            sample_radius: 0,
            regions: None,
            colors: None,
            coordinates: None,
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("snowrose").join("config.toml"))
}

impl Settings {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reads `path` if given, else the default config file when it exists,
    /// else the built in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path().filter(|p| p.exists()) {
                Some(p) => p,
                None => return Ok(Settings::default()),
            },
        };

        debug!(path = %path.display(), "reading settings");
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("could not read config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn output_path(&self, file_name: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("could not create {}", self.out_dir.display()))?;

        Ok(self.out_dir.join(file_name))
    }

    pub fn fetcher(&self) -> Result<Fetcher> {
        Fetcher::new(Duration::from_secs(self.timeout_secs))
    }

    pub fn region_index(&self) -> Result<RegionIndex> {
        let index = match &self.regions {
            Some(path) => RegionIndex::load(path, self.tolerance),
            None => RegionIndex::bundled(self.tolerance),
        };

        index.map_err(|e| anyhow!(e))
    }

    pub fn color_table(&self) -> Result<ColorTable> {
        let table = match &self.colors {
            Some(path) => ColorTable::load(path),
            None => ColorTable::bundled(),
        };

        table.map_err(|e| anyhow!(e))
    }

    pub fn coordinate_map(&self) -> Result<RoseCoordinateMap> {
        match &self.coordinates {
            Some(path) => RoseCoordinateMap::load(path).map_err(|e| anyhow!(e)),
            None => Ok(TemplateGeometry::default().coordinate_map()),
        }
    }

    pub fn decoder(&self) -> Result<RoseDecoder> {
        Ok(RoseDecoder::new(self.coordinate_map()?, self.color_table()?)
            .with_max_distance(self.max_color_distance)
            .with_sample_radius(self.sample_radius))
    }
}

// -- Tests -------------------------------------------------------------------
