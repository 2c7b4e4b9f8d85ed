use std::collections::BTreeMap;

use serde::Serialize;

use super::{LatLon, Placement, RegionIndex};

/// Anything with a fixed position that can be placed in a region.
pub trait Sited {
    fn site_id(&self) -> String;
    fn position(&self) -> LatLon;
    fn elevation_ft(&self) -> f64;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterEntry<S> {
    #[serde(flatten)]
    pub station: S,
    pub elevation_level: u8,
    pub interior: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionRoster<S> {
    pub region: String,
    pub stations: Vec<RosterEntry<S>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Roster<S> {
    /// Every placement keyed by station id. Stations outside all regions map
    /// to an empty list.
    pub by_station: BTreeMap<String, Vec<Placement>>,
    pub by_region: Vec<RegionRoster<S>>,
}

impl<S> Roster<S> {
    pub fn unplaced(&self) -> impl Iterator<Item = &str> {
        self.by_station
            .iter()
            .filter(|(_, placements)| placements.is_empty())
            .map(|(id, _)| id.as_str())
    }
}

pub fn assign_stations<S: Sited + Clone>(index: &RegionIndex, stations: &[S]) -> Roster<S> {
    let mut by_station = BTreeMap::new();
    let mut by_region: Vec<RegionRoster<S>> = index
        .regions()
        .iter()
        .map(|r| RegionRoster {
            region: r.name.clone(),
            stations: Vec::new(),
        })
        .collect();

    for station in stations {
        let placements = index.assign(station.position(), station.elevation_ft());
        for placement in &placements {
            if let Some(roster) = by_region.iter_mut().find(|r| r.region == placement.region) {
                roster.stations.push(RosterEntry {
                    station: station.clone(),
                    elevation_level: placement.elevation_level,
                    interior: placement.interior,
                });
            }
        }
        by_station.insert(station.site_id(), placements);
    }

    for roster in &mut by_region {
        roster.stations.sort_by_key(|entry| entry.station.site_id());
    }

    Roster {
        by_station,
        by_region,
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::region::BoundaryTolerance;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Site {
        id: String,
        lat: f64,
        lon: f64,
        elevation: f64,
    }

    impl Sited for Site {
        fn site_id(&self) -> String {
            self.id.clone()
        }
        fn position(&self) -> LatLon {
            LatLon::new(self.lat, self.lon)
        }
        fn elevation_ft(&self) -> f64 {
            self.elevation
        }
    }

    fn site(id: &str, lat: f64, lon: f64, elevation: f64) -> Site {
        Site {
            id: id.to_string(),
            lat,
            lon,
            elevation,
        }
    }

    #[test]
    fn should_list_every_region_in_order() {
        let index = RegionIndex::bundled(BoundaryTolerance::default()).unwrap();
        let roster = assign_stations(
            &index,
            &[
                site("1098", 41.6, -111.5, 7500.0),
                site("0332", 41.9, -111.6, 9000.0),
                site("9999", 30.0, -100.0, 5000.0),
            ],
        );

        let names: Vec<&str> = roster.by_region.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(
            names,
            vec!["Logan", "Ogden", "Salt Lake", "Uintas", "Provo", "Skyline", "Moab", "Abajos", "Southwest"]
        );

        let logan = &roster.by_region[0];
        let ids: Vec<&str> = logan.stations.iter().map(|e| e.station.id.as_str()).collect();
        assert_eq!(ids, vec!["0332", "1098"]);
        assert_eq!(logan.stations[0].elevation_level, 3);
        assert_eq!(logan.stations[1].elevation_level, 2);
        assert!(roster.by_region[8].stations.is_empty());

        assert_eq!(roster.unplaced().collect::<Vec<_>>(), vec!["9999"]);
        assert_eq!(roster.by_station["1098"].len(), 1);
    }

    #[test]
    fn should_flatten_station_into_roster_json() {
        let index = RegionIndex::bundled(BoundaryTolerance::default()).unwrap();
        let roster = assign_stations(&index, &[site("1098", 41.6, -111.5, 7500.0)]);
        let json = serde_json::to_value(&roster.by_region[0]).unwrap();

        assert_eq!(json["region"], "Logan");
        assert_eq!(json["stations"][0]["id"], "1098");
        assert_eq!(json["stations"][0]["elevation_level"], 2);
        assert_eq!(json["stations"][0]["interior"], true);
    }
}
