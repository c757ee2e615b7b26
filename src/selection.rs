//! Selection Resolver
//!
//! Two inputs feed the current country: the last map click and the dropdown.
//! A non-empty click always wins.

use crate::loader::PredictionTable;
use itertools::Itertools;
use serde::Serialize;

/// Country chosen for this render cycle.
pub fn resolve(map_click: Option<&str>, dropdown_value: &str) -> String {
    match map_click {
        Some(country) if !country.is_empty() => country.to_string(),
        _ => dropdown_value.to_string(),
    }
}

/// Dropdown contents: every predicted country, sorted and deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CountryOptions {
    countries: Vec<String>,
}

impl CountryOptions {
    pub fn from_table(table: &PredictionTable) -> Self {
        Self::from_names(table.records().iter().map(|r| r.country.as_str()))
    }

    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let countries = names
            .into_iter()
            .map(str::to_string)
            .sorted()
            .dedup()
            .collect();
        Self { countries }
    }

    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    /// Index the dropdown starts on: the clicked country when it is an
    /// option, otherwise the first one.
    pub fn default_index(&self, map_click: Option<&str>) -> usize {
        map_click
            .and_then(|clicked| self.countries.binary_search_by(|c| c.as_str().cmp(clicked)).ok())
            .unwrap_or(0)
    }

    pub fn default_value(&self, map_click: Option<&str>) -> Option<&str> {
        self.countries
            .get(self.default_index(map_click))
            .map(String::as_str)
    }
}

/// Raw inputs of one render cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Selection {
    pub map_click: Option<String>,
    pub dropdown: Option<String>,
}

impl Selection {
    pub fn new(map_click: Option<String>, dropdown: Option<String>) -> Self {
        Self {
            map_click: map_click.filter(|c| !c.trim().is_empty()),
            dropdown: dropdown.filter(|c| !c.trim().is_empty()),
        }
    }

    /// Resolve against the dropdown options. An unsubmitted dropdown takes
    /// its default value. `None` only when there are no options and no click.
    pub fn current(&self, options: &CountryOptions) -> Option<String> {
        let click = self.map_click.as_deref();
        let dropdown = match self.dropdown.as_deref() {
            Some(value) => value,
            None => options.default_value(click).unwrap_or(""),
        };
        let country = resolve(click, dropdown);
        if country.is_empty() {
            None
        } else {
            Some(country)
        }
    }

    /// Value the dropdown shows after this cycle.
    pub fn dropdown_index(&self, options: &CountryOptions) -> usize {
        match (self.map_click.as_deref(), self.dropdown.as_deref()) {
            (Some(click), _) => options.default_index(Some(click)),
            (None, Some(value)) => options.default_index(Some(value)),
            (None, None) => 0,
        }
    }
}
