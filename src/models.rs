use std::fmt;
use std::str::FromStr;

use time::Date;

use crate::color::ColorSpec;

/// Performance slot of a show on days with more than one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowTime {
    Am,
    Pm,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Show {
    pub date: Date,
    pub time: Option<ShowTime>,
    pub prefecture: String,
    pub venue: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Year {
    pub year: i32,
    pub shows: Vec<Show>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tour {
    pub name: String,
    pub color: Option<ColorSpec>,
    pub years: Vec<Year>,
}

impl Tour {
    pub fn show_count(&self) -> usize {
        self.years.iter().map(|y| y.shows.len()).sum()
    }

    pub fn year(&self, year: i32) -> Option<&Year> {
        self.years.iter().find(|y| y.year == year)
    }

    /// Every show of this tour with its identity, in catalog order
    pub fn show_ids(&self) -> impl Iterator<Item = (ShowId, &Show)> + '_ {
        self.years.iter().flat_map(move |y| {
            y.shows
                .iter()
                .enumerate()
                .map(move |(index, show)| (ShowId::new(&self.name, y.year, index), show))
        })
    }
}

/// Read-only tour tree loaded once per session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub tours: Vec<Tour>,
}

impl Catalog {
    pub fn new(tours: Vec<Tour>) -> Self {
        Self { tours }
    }

    pub fn is_empty(&self) -> bool {
        self.tours.is_empty()
    }

    pub fn tour(&self, name: &str) -> Option<&Tour> {
        self.tours.iter().find(|t| t.name == name)
    }

    pub fn show(&self, id: &ShowId) -> Option<&Show> {
        self.tour(&id.tour)?.year(id.year)?.shows.get(id.index)
    }

    pub fn show_count(&self) -> usize {
        self.tours.iter().map(Tour::show_count).sum()
    }
}

/// Identity of a show: dates are not unique, so the position inside its year is part of the key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShowId {
    pub tour: String,
    pub year: i32,
    pub index: usize,
}

impl ShowId {
    pub fn new(tour: impl Into<String>, year: i32, index: usize) -> Self {
        Self {
            tour: tour.into(),
            year,
            index,
        }
    }
}

impl fmt::Display for ShowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.tour, self.year, self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseShowIdError(pub String);

impl fmt::Display for ParseShowIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected TOUR/YEAR/INDEX, got {:?}", self.0)
    }
}

impl std::error::Error for ParseShowIdError {}

impl FromStr for ShowId {
    type Err = ParseShowIdError;

    // Tour names may contain '/', so split from the right.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseShowIdError(s.to_string());
        let mut parts = s.rsplitn(3, '/');
        let index = parts.next().and_then(|p| p.parse().ok()).ok_or_else(err)?;
        let year = parts.next().and_then(|p| p.parse().ok()).ok_or_else(err)?;
        let tour = parts.next().filter(|t| !t.is_empty()).ok_or_else(err)?;
        Ok(ShowId::new(tour, year, index))
    }
}

/// One entry of the selected set, as handed to the export step
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedShow {
    pub tour: String,
    pub year: i32,
    pub show: Show,
}

/// Aggregate checkbox state of a tour or year, always derived from its shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Checked,
    Unchecked,
    Indeterminate,
}

impl CheckState {
    pub fn from_counts(selected: usize, total: usize) -> Self {
        if selected == 0 {
            CheckState::Unchecked
        } else if selected == total {
            CheckState::Checked
        } else {
            CheckState::Indeterminate
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            CheckState::Checked => "[x]",
            CheckState::Unchecked => "[ ]",
            CheckState::Indeterminate => "[-]",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_id_parses_tour_names_with_slashes() {
        let id: ShowId = "A/B Tour/2024/3".parse().unwrap();
        assert_eq!(id, ShowId::new("A/B Tour", 2024, 3));
        assert_eq!(id.to_string(), "A/B Tour/2024/3");
    }

    #[test]
    fn show_id_rejects_missing_parts() {
        assert!("2024/3".parse::<ShowId>().is_err());
        assert!("Tour/twenty/3".parse::<ShowId>().is_err());
    }

    #[test]
    fn empty_group_counts_as_unchecked() {
        assert_eq!(CheckState::from_counts(0, 0), CheckState::Unchecked);
        assert_eq!(CheckState::from_counts(2, 2), CheckState::Checked);
        assert_eq!(CheckState::from_counts(1, 2), CheckState::Indeterminate);
    }
}
