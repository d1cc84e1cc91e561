//! City / county / zip search shared by the results table and both exports.

use crate::data::Dataset;
use crate::types::Facility;
use serde::{Deserialize, Serialize};

/// Column headers of the search tool, in display order.
pub const DISPLAY_COLUMNS: [&str; 15] = [
    "Facility Name",
    "Type",
    "Category",
    "Address",
    "City",
    "ZIP Code",
    "County",
    "Strategic Value?",
    "Systemic Impact?",
    "Economic Impact Score",
    "Physical Impact Score",
    "Physical Impact Radius (mi)",
    "Zip Codes Affected",
    "Population Affected",
    "Description",
];

/// Shown in exports but not in the on-screen table.
pub const TABLE_EXCLUDED_COLUMN: &str = "Zip Codes Affected";

/// Substring filters; `None` and `""` both mean "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchFilter {
    pub city: Option<String>,
    pub county: Option<String>,
    pub zip: Option<String>,
}

impl SearchFilter {
    pub fn new(city: Option<String>, county: Option<String>, zip: Option<String>) -> Self {
        Self { city, county, zip }
    }

    pub fn is_empty(&self) -> bool {
        [&self.city, &self.county, &self.zip]
            .iter()
            .all(|f| needle(f).is_none())
    }

    pub fn matches(&self, facility: &Facility) -> bool {
        contains(&facility.city, &self.city)
            && contains(&facility.county, &self.county)
            && contains(&facility.zip, &self.zip)
    }

    /// Matching rows in dataset order.
    pub fn apply<'a>(&self, dataset: &'a Dataset) -> Vec<&'a Facility> {
        dataset
            .facilities()
            .iter()
            .filter(|f| self.matches(f))
            .collect()
    }
}

fn needle(filter: &Option<String>) -> Option<&str> {
    filter.as_deref().filter(|s| !s.is_empty())
}

// Missing cells compare as "", so they only survive an absent filter.
fn contains(value: &Option<String>, filter: &Option<String>) -> bool {
    match needle(filter) {
        None => true,
        Some(needle) => value
            .as_deref()
            .unwrap_or_default()
            .to_lowercase()
            .contains(&needle.to_lowercase()),
    }
}

/// A single cell of the search output.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    fn text(value: &Option<String>) -> Self {
        value.clone().map_or(Cell::Empty, Cell::Text)
    }

    fn number(value: Option<f64>) -> Self {
        value.map_or(Cell::Empty, Cell::Number)
    }

    fn flag(value: Option<bool>) -> Self {
        value.map_or(Cell::Empty, |v| Cell::Number(if v { 1.0 } else { 0.0 }))
    }

    fn label(value: Option<&'static str>) -> Self {
        value.map_or(Cell::Empty, |l| Cell::Text(l.to_string()))
    }

    pub fn display(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
            Cell::Empty => String::new(),
        }
    }
}

/// A facility as one row of `DISPLAY_COLUMNS`. Scores are shown by label,
/// Yes/No flags as 1/0; out-of-range scores and missing values are empty.
pub fn display_record(facility: &Facility) -> [Cell; 15] {
    [
        Cell::Text(facility.name.clone()),
        Cell::Text(facility.facility_type.clone()),
        Cell::Text(facility.category.clone()),
        Cell::text(&facility.address),
        Cell::text(&facility.city),
        Cell::text(&facility.zip),
        Cell::text(&facility.county),
        Cell::flag(facility.strategic_value),
        Cell::flag(facility.systemic_impact),
        Cell::label(facility.economic_level().map(|l| l.label())),
        Cell::label(facility.physical_level().map(|l| l.label())),
        Cell::number(facility.impact_radius_mi),
        Cell::text(&facility.zips_affected),
        Cell::number(facility.population_affected),
        Cell::text(&facility.description),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

pub fn table(rows: &[&Facility]) -> TableView {
    let keep: Vec<bool> = DISPLAY_COLUMNS
        .iter()
        .map(|c| *c != TABLE_EXCLUDED_COLUMN)
        .collect();

    let columns = DISPLAY_COLUMNS
        .iter()
        .zip(&keep)
        .filter(|(_, keep)| **keep)
        .map(|(c, _)| *c)
        .collect();

    let rows = rows
        .iter()
        .map(|f| {
            display_record(f)
                .iter()
                .zip(&keep)
                .filter(|(_, keep)| **keep)
                .map(|(cell, _)| cell.display())
                .collect()
        })
        .collect();

    TableView { columns, rows }
}
