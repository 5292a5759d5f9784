use std::{collections::BTreeSet, fmt};

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    config::{EmptySelectionPolicy, WeekdayLocale},
    enrich::{Calendar, EnrichedTable},
    error::{PipelineError, PipelineResult},
};

const WEEKDAYS_EN: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];
const WEEKDAYS_ID: [&str; 7] = ["Senin", "Selasa", "Rabu", "Kamis", "Jumat", "Sabtu", "Minggu"];

pub fn weekday_name(weekday: u32, locale: WeekdayLocale) -> &'static str {
    let names = match locale {
        WeekdayLocale::En => &WEEKDAYS_EN,
        WeekdayLocale::Id => &WEEKDAYS_ID,
    };
    names.get(weekday as usize).copied().unwrap_or("?")
}

/// Accepts full or three-letter names in either locale, or 0 (Monday) to 6.
pub fn parse_weekday(value: &str) -> PipelineResult<u32> {
    let trimmed = value.trim();
    if let Ok(number) = trimmed.parse::<u32>() {
        if number < 7 {
            return Ok(number);
        }
    } else {
        let lowered = trimmed.to_lowercase();
        for names in [&WEEKDAYS_EN, &WEEKDAYS_ID] {
            for (idx, name) in names.iter().enumerate() {
                let name = name.to_lowercase();
                if lowered == name || (lowered.len() == 3 && name.starts_with(&lowered)) {
                    return Ok(idx as u32);
                }
            }
        }
    }
    Err(PipelineError::InvalidFilter(format!(
        "unknown weekday '{trimmed}'"
    )))
}

/// A multi-select constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Selection<T: Ord> {
    /// No selection was made; everything passes.
    Unrestricted,
    /// Only these values pass. May be empty.
    Only(BTreeSet<T>),
}

impl<T: Ord> Default for Selection<T> {
    fn default() -> Self {
        Selection::Unrestricted
    }
}

impl<T: Ord> Selection<T> {
    pub fn from_values(values: Option<Vec<T>>) -> Self {
        match values {
            None => Selection::Unrestricted,
            Some(values) => Selection::Only(values.into_iter().collect()),
        }
    }

    pub fn is_explicitly_empty(&self) -> bool {
        matches!(self, Selection::Only(set) if set.is_empty())
    }

    fn admits(&self, value: &T, policy: EmptySelectionPolicy) -> bool {
        match self {
            Selection::Unrestricted => true,
            Selection::Only(set) if set.is_empty() => {
                policy == EmptySelectionPolicy::NoConstraint
            }
            Selection::Only(set) => set.contains(value),
        }
    }
}

/// Soft condition: filtering is valid but there is nothing to aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SelectionWarning {
    EmptySelection { constraint: &'static str },
    NoMatchingRows,
}

impl fmt::Display for SelectionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionWarning::EmptySelection { constraint } => {
                write!(f, "No {constraint} selected; nothing to show")
            }
            SelectionWarning::NoMatchingRows => {
                f.write_str("No purchases match the current filters")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilterSpec {
    /// Inclusive on the purchase's calendar date.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub years: Selection<i32>,
    /// Monday = 0.
    pub weekdays: Selection<u32>,
    /// Inclusive, 0 to 23.
    pub hours: Option<(u32, u32)>,
    pub empty_selection: EmptySelectionPolicy,
}

impl FilterSpec {
    pub fn validate(&self) -> PipelineResult<()> {
        if let Some((start, end)) = self.date_range
            && start > end
        {
            return Err(PipelineError::InvalidFilter(format!(
                "start date {start} is after end date {end}"
            )));
        }
        if let Some((min, max)) = self.hours {
            if max > 23 {
                return Err(PipelineError::InvalidFilter(format!(
                    "hour {max} is outside 0-23"
                )));
            }
            if min > max {
                return Err(PipelineError::InvalidFilter(format!(
                    "hour range {min}-{max} is inverted"
                )));
            }
        }
        if let Selection::Only(days) = &self.weekdays
            && let Some(day) = days.iter().find(|d| **d > 6)
        {
            return Err(PipelineError::InvalidFilter(format!(
                "weekday {day} is outside 0-6"
            )));
        }
        Ok(())
    }

    /// The empty selection that blocks aggregation under `SelectNone`, if any.
    pub fn empty_selection_warning(&self) -> Option<SelectionWarning> {
        if self.empty_selection != EmptySelectionPolicy::SelectNone {
            return None;
        }
        if self.years.is_explicitly_empty() {
            Some(SelectionWarning::EmptySelection { constraint: "years" })
        } else if self.weekdays.is_explicitly_empty() {
            Some(SelectionWarning::EmptySelection {
                constraint: "weekdays",
            })
        } else {
            None
        }
    }

    pub fn matches(&self, calendar: &Calendar) -> bool {
        if let Some((start, end)) = self.date_range {
            let date = calendar.date();
            if date < start || date > end {
                return false;
            }
        }
        if !self.years.admits(&calendar.year(), self.empty_selection) {
            return false;
        }
        if !self.weekdays.admits(&calendar.weekday(), self.empty_selection) {
            return false;
        }
        if let Some((min, max)) = self.hours
            && !(min..=max).contains(&calendar.hour())
        {
            return false;
        }
        true
    }
}

/// Row indices of an [`EnrichedTable`] that passed a [`FilterSpec`].
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    base: &'a EnrichedTable,
    rows: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    pub fn all(base: &'a EnrichedTable) -> Self {
        Self {
            base,
            rows: (0..base.len()).collect(),
        }
    }

    pub fn base(&self) -> &'a EnrichedTable {
        self.base
    }

    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn apply<'a>(base: &'a EnrichedTable, spec: &FilterSpec) -> PipelineResult<FilteredView<'a>> {
    spec.validate()?;
    let rows = base
        .calendars()
        .iter()
        .enumerate()
        .filter(|(_, cal)| spec.matches(cal))
        .map(|(idx, _)| idx)
        .collect();
    Ok(FilteredView { base, rows })
}
