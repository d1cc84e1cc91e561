//! Category keys, their display labels and their ordered type lists.
//!
//! The position of a type in its category's list is the curve index the map
//! emits for that type's trace. Reordering a list changes how every hover
//! event is decoded.

use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Emergency,
    Finance,
    Electricity,
    Energy,
    Chemical,
    Dam,
}

/// Result of a lenient key lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub category: Category,
    /// The key was not recognised and `Category::DEFAULT` was served instead.
    pub fell_back: bool,
}

impl Category {
    /// Selector order.
    pub const ALL: [Category; 6] = [
        Category::Emergency,
        Category::Finance,
        Category::Electricity,
        Category::Energy,
        Category::Chemical,
        Category::Dam,
    ];

    /// Served for unrecognised keys.
    pub const DEFAULT: Category = Category::Energy;

    /// Selected when the page first loads.
    pub const INITIAL: Category = Category::Electricity;

    pub fn key(self) -> &'static str {
        match self {
            Category::Emergency => "emergency",
            Category::Finance => "finance",
            Category::Electricity => "electricity",
            Category::Energy => "energy",
            Category::Chemical => "chemical",
            Category::Dam => "dam",
        }
    }

    /// Value of the CATEGORY column for rows in this category.
    pub fn label(self) -> &'static str {
        match self {
            Category::Emergency => "Emergency Services",
            Category::Finance => "Financial Services",
            Category::Electricity => "Electricity Generation",
            Category::Energy => "Energy Production",
            Category::Chemical => "Chemical Production",
            Category::Dam => "Dams",
        }
    }

    /// Text shown next to the selector option.
    pub fn option_label(self) -> &'static str {
        match self {
            Category::Electricity => "Power Grid",
            Category::Dam => "High Risk Dams",
            other => other.label(),
        }
    }

    pub fn type_labels(self) -> &'static [&'static str] {
        match self {
            Category::Emergency => &[
                "State Emergency Operations Center",
                "Local Emergency Operations Center",
                "FEMA Regional Office",
            ],
            Category::Finance => &[
                "Federal Reserve Branch",
                "Government Finance Facility",
                "Large Mutual Fund",
            ],
            Category::Electricity => &["Powerplant", "Substation", "Nuclear Reactor"],
            Category::Energy => &[
                "DOE Petroleum Reserve",
                "LNG Import/Export Terminal",
                "Natural Gas Pipeline Compressor Station",
                "Natural Gas Import/Export Terminal",
                "Natural Gas Market Hub",
                "Natural Gas Processing Plant",
                "Oil Port",
                "Oil Refinery",
                "Nuclear Reactor",
            ],
            // "Petroelum" is spelled the way the dataset spells it.
            Category::Chemical => &[
                "Chemicals",
                "Hazardous Waste",
                "Other",
                "Petroelum",
                "Electric Utilities",
            ],
            Category::Dam => &["Dam"],
        }
    }

    /// Decodes a curve index back to its type label.
    pub fn type_at(self, curve: usize) -> Option<&'static str> {
        self.type_labels().get(curve).copied()
    }

    pub fn type_index(self, facility_type: &str) -> Option<usize> {
        self.type_labels().iter().position(|t| *t == facility_type)
    }

    /// Strict lookup: `None` for anything but the six known keys.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }

    /// Lenient lookup used by the map and inspector: unknown keys are served
    /// `Category::DEFAULT`, and the substitution is reported and logged.
    pub fn resolve(key: &str) -> Resolution {
        match Self::from_key(key) {
            Some(category) => Resolution {
                category,
                fell_back: false,
            },
            None => {
                warn!(
                    key,
                    fallback = Self::DEFAULT.key(),
                    "Unrecognised category key, serving default category"
                );
                Resolution {
                    category: Self::DEFAULT,
                    fell_back: true,
                }
            }
        }
    }

    /// `resolve` for an optional request parameter; an absent key selects
    /// `Category::INITIAL`.
    pub fn resolve_param(key: Option<&str>) -> Resolution {
        match key {
            Some(key) => Self::resolve(key),
            None => Resolution {
                category: Self::INITIAL,
                fell_back: false,
            },
        }
    }
}
