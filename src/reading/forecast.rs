use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::Reading;
use crate::rose::{Cell, DangerLevel, RoseReading};

#[derive(Debug, Clone, PartialEq)]
/// One row of the forecast archive listing.
pub struct ForecastListing {
    pub date: NaiveDate,
    /// Forecast area text as shown in the archive.
    pub area: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq)]
/// A decoded forecast rose for one region and day.
///
/// `cells` holds every cell the rose gave a value for, `Unknown` included.
/// Cells missing from the map are absent.
pub struct ForecastRecord {
    pub date: NaiveDate,
    pub region: String,
    pub link: String,
    pub cells: BTreeMap<Cell, DangerLevel>,
}

impl ForecastRecord {
    pub fn new(listing: &ForecastListing, region: &str, reading: &RoseReading) -> Self {
        let cells = Cell::all()
            .filter_map(|cell| reading.column_value(cell).map(|level| (cell, level)))
            .collect();

        ForecastRecord {
            date: listing.date,
            region: region.to_string(),
            link: listing.link.clone(),
            cells,
        }
    }

    /// Highest rated level on the rose, if any cell was read.
    pub fn peak(&self) -> Option<DangerLevel> {
        self.cells
            .values()
            .filter(|l| l.code().is_some())
            .max()
            .copied()
    }
}

impl Reading for ForecastRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn key(&self) -> (String, String) {
        (self.region.clone(), String::new())
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::rose::{Direction, Tier};

    #[test]
    fn should_keep_unknown_and_drop_missing() {
        let listing = ForecastListing {
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            area: "Logan".to_string(),
            link: "https://utahavalanchecenter.org/forecast/logan/2024-02-01".to_string(),
        };
        let mut reading = RoseReading::default();
        reading
            .levels
            .insert(Cell::new(Tier::Bottom, Direction::N), DangerLevel::High);
        reading
            .levels
            .insert(Cell::new(Tier::Top, Direction::E), DangerLevel::Low);
        reading.unmatched.insert(Cell::new(Tier::Middle, Direction::S));

        let record = ForecastRecord::new(&listing, "Logan", &reading);

        assert_eq!(record.cells.len(), 3);
        assert_eq!(
            record.cells[&Cell::new(Tier::Middle, Direction::S)],
            DangerLevel::Unknown
        );
        assert_eq!(record.peak(), Some(DangerLevel::High));
        assert_eq!(record.key(), ("Logan".to_string(), String::new()));
    }
}
