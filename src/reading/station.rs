use serde::{Deserialize, Serialize};

use crate::region::{LatLon, Sited};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// SNOTEL station metadata as returned by the AWDB `stations` endpoint.
pub struct Station {
    pub station_id: String,
    pub state_code: String,
    pub network_code: String,
    pub name: String,
    #[serde(default)]
    pub county_name: Option<String>,
    /// Feet above sea level.
    #[serde(default)]
    pub elevation: f64,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub begin_date: Option<String>,
}

impl Station {
    /// AWDB identifier, e.g. `1098:UT:SNTL`.
    pub fn triplet(&self) -> String {
        format!("{}:{}:{}", self.station_id, self.state_code, self.network_code)
    }
}

impl Sited for Station {
    fn site_id(&self) -> String {
        self.triplet()
    }

    fn position(&self) -> LatLon {
        LatLon::new(self.latitude, self.longitude)
    }

    fn elevation_ft(&self) -> f64 {
        self.elevation
    }
}

// -- Tests -------------------------------------------------------------------
