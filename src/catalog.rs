use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;
use time::Date;
use time::format_description::{self, BorrowedFormatItem};
use tracing::{debug, info, warn};

use crate::color::ColorSpec;
use crate::error::LoadError;
use crate::models::{Catalog, Show, ShowTime, Tour, Year};

/// Well-known location of the tour document, relative to the working directory or site root
pub const DEFAULT_SOURCE: &str = "data/live.json";

/// Where the tour document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    File(PathBuf),
    Http(String),
}

impl CatalogSource {
    pub fn parse(s: &str) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            CatalogSource::Http(s.to_string())
        } else {
            CatalogSource::File(PathBuf::from(s))
        }
    }
}

impl Default for CatalogSource {
    fn default() -> Self {
        CatalogSource::File(PathBuf::from(DEFAULT_SOURCE))
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSource::File(path) => write!(f, "{}", path.display()),
            CatalogSource::Http(url) => f.write_str(url),
        }
    }
}

#[derive(Deserialize)]
struct RawTour {
    #[serde(rename = "liveName", alias = "name")]
    name: String,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    years: Vec<RawYear>,
}

#[derive(Deserialize)]
struct RawYear {
    year: i32,
    #[serde(default)]
    shows: Vec<RawShow>,
}

#[derive(Deserialize)]
struct RawShow {
    date: String,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    prefecture: String,
    #[serde(default)]
    venue: String,
}

/// Fetch and parse the tour document
pub async fn load(source: &CatalogSource) -> Result<Catalog, LoadError> {
    info!("Loading tour catalog from {}", source);
    let body = match source {
        CatalogSource::File(path) => {
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| LoadError::Io {
                    path: path.clone(),
                    source,
                })?
        }
        CatalogSource::Http(url) => {
            let url = url.clone();
            let task_url = url.clone();
            tokio::task::spawn_blocking(move || fetch(&task_url))
                .await
                .map_err(|e| LoadError::Transport {
                    url,
                    message: e.to_string(),
                })??
        }
    };
    let catalog = parse(&body)?;
    info!(
        "Loaded {} tours with {} shows",
        catalog.tours.len(),
        catalog.show_count()
    );
    Ok(catalog)
}

fn fetch(url: &str) -> Result<String, LoadError> {
    debug!("GET {}", url);
    let response = ureq::get(url).call().map_err(|e| match e {
        ureq::Error::Status(status, _) => LoadError::Status {
            url: url.to_string(),
            status,
        },
        ureq::Error::Transport(t) => LoadError::Transport {
            url: url.to_string(),
            message: t.to_string(),
        },
    })?;
    response.into_string().map_err(|e| LoadError::Transport {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// Parse the JSON document and run the minimal shape checks
pub fn parse(json: &str) -> Result<Catalog, LoadError> {
    let raw: Vec<RawTour> = serde_json::from_str(json)?;
    let date_format = format_description::parse("[year]-[month]-[day]")
        .map_err(|e| LoadError::Shape(format!("date format: {}", e)))?;

    let mut names = HashSet::new();
    let mut tours = Vec::with_capacity(raw.len());
    for raw_tour in raw {
        let name = raw_tour.name.trim().to_string();
        if name.is_empty() {
            return Err(LoadError::Shape("tour with empty name".to_string()));
        }
        if !names.insert(name.clone()) {
            return Err(LoadError::Shape(format!("duplicate tour {:?}", name)));
        }

        let color = raw_tour.color.as_deref().and_then(|c| match c.parse::<ColorSpec>() {
            Ok(spec) => Some(spec),
            Err(e) => {
                warn!("Ignoring color of tour {:?}: {}", name, e);
                None
            }
        });

        let mut seen_years = HashSet::new();
        let mut years = Vec::with_capacity(raw_tour.years.len());
        for raw_year in raw_tour.years {
            if !seen_years.insert(raw_year.year) {
                return Err(LoadError::Shape(format!(
                    "tour {:?} lists year {} twice",
                    name, raw_year.year
                )));
            }
            let shows = raw_year
                .shows
                .into_iter()
                .map(|s| convert_show(s, &date_format))
                .collect::<Result<Vec<_>, _>>()?;
            years.push(Year {
                year: raw_year.year,
                shows,
            });
        }

        tours.push(Tour { name, color, years });
    }

    Ok(Catalog::new(tours))
}

fn convert_show(raw: RawShow, date_format: &[BorrowedFormatItem<'_>]) -> Result<Show, LoadError> {
    Ok(Show {
        date: parse_date(&raw.date, date_format)?,
        time: parse_time(raw.time.as_deref())?,
        prefecture: raw.prefecture.trim().to_string(),
        venue: raw.venue.trim().to_string(),
    })
}

/// Accepts `2024-02-10`, `2024/02/10` and `2024.02.10`
fn parse_date(s: &str, date_format: &[BorrowedFormatItem<'_>]) -> Result<Date, LoadError> {
    let normalized: String = s
        .trim()
        .chars()
        .map(|c| if c == '/' || c == '.' { '-' } else { c })
        .collect();
    Date::parse(&normalized, date_format)
        .map_err(|e| LoadError::Shape(format!("invalid date {:?}: {}", s, e)))
}

fn parse_time(s: Option<&str>) -> Result<Option<ShowTime>, LoadError> {
    match s.map(str::trim) {
        None | Some("") => Ok(None),
        Some(t) if t.eq_ignore_ascii_case("am") || t == "昼" => Ok(Some(ShowTime::Am)),
        Some(t) if t.eq_ignore_ascii_case("pm") || t == "夜" => Ok(Some(ShowTime::Pm)),
        Some(t) => Err(LoadError::Shape(format!("unknown show time {:?}", t))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_kind_follows_scheme() {
        assert_eq!(
            CatalogSource::parse("https://example.org/data/live.json"),
            CatalogSource::Http("https://example.org/data/live.json".to_string())
        );
        assert_eq!(
            CatalogSource::parse(DEFAULT_SOURCE),
            CatalogSource::File(PathBuf::from("data/live.json"))
        );
    }

    #[test]
    fn time_tokens() {
        assert_eq!(parse_time(None).unwrap(), None);
        assert_eq!(parse_time(Some("")).unwrap(), None);
        assert_eq!(parse_time(Some("AM")).unwrap(), Some(ShowTime::Am));
        assert_eq!(parse_time(Some("夜")).unwrap(), Some(ShowTime::Pm));
        assert!(parse_time(Some("noon")).is_err());
    }
}
