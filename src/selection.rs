use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::export::palette::BackgroundOption;
use crate::models::{Catalog, CheckState, SelectedShow, ShowId};

/// What happens to an open tour section when its header checkbox is cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollapsePolicy {
    #[default]
    KeepOpen,
    Collapse,
}

/// Per-show selection flags plus the section and background state the export gate needs.
///
/// Tour and year states are never stored; `tour_state` and `year_state` recount the
/// show flags every time they are asked.
#[derive(Debug, Clone)]
pub struct SelectionTree {
    catalog: Arc<Catalog>,
    selected: HashMap<ShowId, bool>,
    expanded: HashMap<String, bool>,
    collapse_policy: CollapsePolicy,
    background: Option<BackgroundOption>,
}

impl SelectionTree {
    pub fn new(catalog: Arc<Catalog>, collapse_policy: CollapsePolicy) -> Self {
        let selected = catalog
            .tours
            .iter()
            .flat_map(|t| t.show_ids().map(|(id, _)| (id, false)))
            .collect();
        let expanded = catalog
            .tours
            .iter()
            .map(|t| (t.name.clone(), false))
            .collect();
        Self {
            catalog,
            selected,
            expanded,
            collapse_policy,
            background: None,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn collapse_policy(&self) -> CollapsePolicy {
        self.collapse_policy
    }

    pub fn is_selected(&self, id: &ShowId) -> bool {
        self.selected.get(id).copied().unwrap_or(false)
    }

    pub fn toggle_show(&mut self, id: &ShowId, value: bool) {
        match self.selected.get_mut(id) {
            Some(flag) => {
                debug!("show {} -> {}", id, value);
                *flag = value;
            }
            None => warn!("Ignoring toggle of unknown show {}", id),
        }
    }

    /// Overwrite every show of the tour with `value`, whatever the previous mix was
    pub fn toggle_tour(&mut self, tour: &str, value: bool) {
        let Some(t) = self.catalog.tour(tour) else {
            warn!("Ignoring toggle of unknown tour {:?}", tour);
            return;
        };
        for (id, _) in t.show_ids() {
            self.selected.insert(id, value);
        }
        debug!("tour {:?} -> {}", tour, value);

        if value {
            self.set_expanded(tour, true);
        } else if self.collapse_policy == CollapsePolicy::Collapse {
            self.set_expanded(tour, false);
        }
    }

    pub fn toggle_year(&mut self, tour: &str, year: i32, value: bool) {
        let Some(y) = self.catalog.tour(tour).and_then(|t| t.year(year)) else {
            warn!("Ignoring toggle of unknown year {} in {:?}", year, tour);
            return;
        };
        for index in 0..y.shows.len() {
            self.selected.insert(ShowId::new(tour, year, index), value);
        }
        debug!("year {} of {:?} -> {}", year, tour, value);
    }

    pub fn tour_state(&self, tour: &str) -> CheckState {
        let Some(t) = self.catalog.tour(tour) else {
            return CheckState::Unchecked;
        };
        let selected = t.show_ids().filter(|(id, _)| self.is_selected(id)).count();
        CheckState::from_counts(selected, t.show_count())
    }

    pub fn year_state(&self, tour: &str, year: i32) -> CheckState {
        let Some(y) = self.catalog.tour(tour).and_then(|t| t.year(year)) else {
            return CheckState::Unchecked;
        };
        let selected = (0..y.shows.len())
            .filter(|&index| self.is_selected(&ShowId::new(tour, year, index)))
            .count();
        CheckState::from_counts(selected, y.shows.len())
    }

    pub fn is_expanded(&self, tour: &str) -> bool {
        self.expanded.get(tour).copied().unwrap_or(false)
    }

    pub fn set_expanded(&mut self, tour: &str, open: bool) {
        if let Some(flag) = self.expanded.get_mut(tour) {
            *flag = open;
        }
    }

    /// Selected shows in catalog order: tour, then year, then position in year.
    /// Export grouping relies on this ordering.
    pub fn selected_shows(&self) -> Vec<SelectedShow> {
        self.catalog
            .tours
            .iter()
            .flat_map(|t| t.show_ids())
            .filter(|(id, _)| self.is_selected(id))
            .map(|(id, show)| SelectedShow {
                tour: id.tour,
                year: id.year,
                show: show.clone(),
            })
            .collect()
    }

    pub fn selected_count(&self) -> usize {
        self.selected.values().filter(|v| **v).count()
    }

    pub fn background(&self) -> Option<&BackgroundOption> {
        self.background.as_ref()
    }

    pub fn set_background(&mut self, background: Option<BackgroundOption>) {
        debug!(
            "background -> {:?}",
            background.as_ref().map(|b| b.id.as_str())
        );
        self.background = background;
    }

    pub fn is_export_eligible(&self) -> bool {
        self.selected_count() > 0 && self.background.is_some()
    }
}
