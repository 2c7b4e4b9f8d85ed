//! Parses the Utah Avalanche Center forecast archive and forecast pages.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::warn;

use crate::reading::ForecastListing;

pub const BASE_URL: &str = "https://utahavalanchecenter.org";

static ROW: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr>").unwrap());
static CELL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<td\b[^>]*>(.*?)</td>").unwrap());
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<a\b[^>]*\bhref\s*=\s*"([^"]+)""#).unwrap());
static IMG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<img\b[^>]*>").unwrap());
static CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bclass\s*=\s*"([^"]*)""#).unwrap());
static SRC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(?i)\bsrc\s*=\s*"([^"]+)""#).unwrap());
static EMPTY_VIEW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<div\b[^>]*\bclass\s*=\s*"[^"]*\bview-empty\b"#).unwrap());

const DATE_FORMATS: [&str; 6] = [
    "%A, %B %d, %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%m/%d/%Y",
    "%Y-%m-%d",
    "%a, %m/%d/%Y",
];

#[derive(Debug, Clone, PartialEq)]
pub enum ArchivePage {
    /// The archive has run out of pages.
    Empty,
    Rows(Vec<ForecastListing>),
}

pub fn archive_page_url(page: u32) -> String {
    format!("{}/archives/forecasts?page={}", BASE_URL, page)
}

pub fn absolute_url(link: &str) -> String {
    if link.starts_with("http://") || link.starts_with("https://") {
        link.to_string()
    } else if link.starts_with("//") {
        format!("https:{}", link)
    } else if link.starts_with('/') {
        format!("{}{}", BASE_URL, link)
    } else {
        format!("{}/{}", BASE_URL, link)
    }
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&#039;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn text(html: &str) -> String {
    let stripped = TAG.replace_all(html, " ");
    decode_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses an archive date, ignoring any trailing ` - HH:MM` time.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.split(" - ").next().unwrap_or(s).trim();
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
}

pub fn parse_archive_page(html: &str) -> ArchivePage {
    if EMPTY_VIEW.is_match(html) {
        return ArchivePage::Empty;
    }

    let rows = ROW
        .captures_iter(html)
        .filter_map(|row| {
            let cells: Vec<&str> = CELL
                .captures_iter(&row[1])
                .filter_map(|c| c.get(1).map(|m| m.as_str()))
                .collect();
            // Header rows use <th>
            if cells.len() < 2 {
                return None;
            }

            let date_text = text(cells[0]);
            let Some(date) = parse_date(&date_text) else {
                warn!(date = %date_text, "skipping archive row with unreadable date");
                return None;
            };
            let Some(href) = HREF.captures(cells[1]) else {
                warn!(date = %date, "skipping archive row without a link");
                return None;
            };

            Some(ForecastListing {
                date,
                area: text(cells[1]),
                link: absolute_url(&decode_entities(&href[1])),
            })
        })
        .collect();

    ArchivePage::Rows(rows)
}

/// Keeps listings dated on or after `latest`. Regions post at different
/// times, so rows on `latest` itself may still be missing from the store.
/// The flag is true once an older row was seen, meaning later pages need
/// not be fetched.
pub fn since(
    listings: Vec<ForecastListing>,
    latest: Option<NaiveDate>,
) -> (Vec<ForecastListing>, bool) {
    let Some(latest) = latest else {
        return (listings, false);
    };
    let reached = listings.iter().any(|l| l.date < latest);
    let kept = listings.into_iter().filter(|l| l.date >= latest).collect();

    (kept, reached)
}

/// Region named in a forecast area string, preferring the longest match.
pub fn match_region<'a>(area: &str, regions: &'a [String]) -> Option<&'a str> {
    let area = area.to_lowercase();
    regions
        .iter()
        .filter(|name| area.contains(&name.to_lowercase()))
        .max_by_key(|name| name.len())
        .map(String::as_str)
}

/// Source of the rose image on a forecast page.
pub fn rose_image_link(html: &str) -> Option<String> {
    IMG.find_iter(html)
        .map(|m| m.as_str())
        .find(|tag| {
            CLASS
                .captures(tag)
                .is_some_and(|c| c[1].split_whitespace().any(|class| class == "compass-width"))
        })
        .and_then(|tag| SRC.captures(tag))
        .map(|c| absolute_url(&decode_entities(&c[1])))
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const ARCHIVE: &str = r#"
<div class="view-content">
<table class="views-table cols-2">
  <thead>
    <tr><th>Date Issued</th><th>Forecast</th></tr>
  </thead>
  <tbody>
    <tr class="odd views-row-first">
      <td class="views-field views-field-field-issued">Thursday, February 1, 2024</td>
      <td class="views-field views-field-title">
        Forecast: <a href="/forecast/logan/2/1/2024">Logan</a> Avalanche Forecast
      </td>
    </tr>
    <tr class="even">
      <td class="views-field">01/31/2024</td>
      <td class="views-field"><a href="https://utahavalanchecenter.org/forecast/salt-lake/1/31/2024?a=1&amp;b=2">Salt Lake Avalanche Forecast</a></td>
    </tr>
    <tr class="odd">
      <td class="views-field">sometime</td>
      <td class="views-field"><a href="/forecast/provo">Provo</a></td>
    </tr>
  </tbody>
</table>
</div>"#;

    #[test]
    fn should_parse_archive_rows() {
        let ArchivePage::Rows(rows) = parse_archive_page(ARCHIVE) else {
            panic!("expected rows");
        };

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(rows[0].area, "Forecast: Logan Avalanche Forecast");
        assert_eq!(rows[0].link, "https://utahavalanchecenter.org/forecast/logan/2/1/2024");
        assert_eq!(rows[1].date, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        assert_eq!(
            rows[1].link,
            "https://utahavalanchecenter.org/forecast/salt-lake/1/31/2024?a=1&b=2"
        );
    }

    #[test]
    fn should_detect_empty_view() {
        let html = r#"<div class="view view-archives"><div class="view-empty"><p>No results</p></div></div>"#;
        assert_eq!(parse_archive_page(html), ArchivePage::Empty);
        assert_eq!(parse_archive_page("<table></table>"), ArchivePage::Rows(vec![]));
    }

    #[test]
    fn should_stop_before_latest_date() {
        let ArchivePage::Rows(rows) = parse_archive_page(ARCHIVE) else {
            panic!("expected rows");
        };

        let (kept, reached) = since(rows.clone(), NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].area, "Forecast: Logan Avalanche Forecast");
        assert!(reached);

        // Rows on the latest stored day are kept and paging continues
        let (kept, reached) = since(rows.clone(), NaiveDate::from_ymd_opt(2024, 1, 31));
        assert_eq!(kept.len(), 2);
        assert!(!reached);

        let (all, reached) = since(rows, None);
        assert_eq!(all.len(), 2);
        assert!(!reached);
    }

    #[test]
    fn should_parse_date_variants() {
        let expected = NaiveDate::from_ymd_opt(2023, 12, 5);
        assert_eq!(parse_date("Tuesday, December 5, 2023"), expected);
        assert_eq!(parse_date("December 5, 2023"), expected);
        assert_eq!(parse_date("12/05/2023 - 07:30"), expected);
        assert_eq!(parse_date("2023-12-05"), expected);
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn should_match_longest_region_name() {
        let regions = vec!["Salt Lake".to_string(), "Logan".to_string(), "Lake".to_string()];

        assert_eq!(match_region("Salt Lake Avalanche Forecast", &regions), Some("Salt Lake"));
        assert_eq!(match_region("forecast: LOGAN", &regions), Some("Logan"));
        assert_eq!(match_region("Moab", &regions), None);
    }

    #[test]
    fn should_find_rose_image() {
        let html = r#"
            <img src="/sites/logo.png" class="logo">
            <img class="full-width compass-width sm-pb3" alt="rose"
                 src="/sites/default/files/forecast/202402/20240201-logan-rose.png">
        "#;

        assert_eq!(
            rose_image_link(html).as_deref(),
            Some("https://utahavalanchecenter.org/sites/default/files/forecast/202402/20240201-logan-rose.png")
        );
        assert_eq!(rose_image_link(r#"<img class="compass" src="/x.png">"#), None);
    }

    #[test]
    fn should_make_links_absolute() {
        assert_eq!(absolute_url("//cdn.example.org/a.png"), "https://cdn.example.org/a.png");
        assert_eq!(absolute_url("forecast/logan"), "https://utahavalanchecenter.org/forecast/logan");
        assert_eq!(archive_page_url(3), "https://utahavalanchecenter.org/archives/forecasts?page=3");
    }
}
