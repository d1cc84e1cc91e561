use crate::category::Category;
use crate::data::Dataset;
use crate::map::group_by_type;
use crate::types::{EconomicImpact, Facility};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A hovered point as the map reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct HoverHit {
    pub curve: usize,
    pub point: usize,
}

/// Two-bar risk profile, always drawn on the same 0-4 axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskChart {
    pub labels: [&'static str; 2],
    pub values: [f64; 2],
    pub y_title: &'static str,
    pub y_range: [f64; 2],
}

impl RiskChart {
    fn new(economic: f64, physical: f64) -> Self {
        Self {
            labels: ["Economic Impact", "Physical Impact"],
            values: [economic, physical],
            y_title: "Risk Estimate",
            y_range: [0.0, f64::from(EconomicImpact::MAX)],
        }
    }

    pub fn empty() -> Self {
        Self::new(0.0, 0.0)
    }

    fn for_facility(facility: &Facility) -> Self {
        let economic = facility.economic_level().map_or(0, |l| l.score());
        let physical = facility.physical_level().map_or(0, |l| l.score());
        Self::new(f64::from(economic), f64::from(physical))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inspection {
    pub name: Option<String>,
    pub description: String,
    pub chart: RiskChart,
}

impl Inspection {
    pub fn empty() -> Self {
        Self {
            name: None,
            description: String::new(),
            chart: RiskChart::empty(),
        }
    }
}

/// Facility under a hovered point, or `None` when the hit does not land on
/// a point of the rendered scene.
pub fn resolve_hit<'a>(
    dataset: &'a Dataset,
    category: Category,
    hit: HoverHit,
) -> Option<&'a Facility> {
    // Decode through the type list first so an unknown curve never matches
    // a trailing unlisted-type group.
    category.type_at(hit.curve)?;
    let groups = group_by_type(dataset, category);
    groups.get(hit.curve)?.rows.get(hit.point).copied()
}

pub fn inspect(dataset: &Dataset, category: Category, hit: Option<HoverHit>) -> Inspection {
    let Some(hit) = hit else {
        return Inspection::empty();
    };

    match resolve_hit(dataset, category, hit) {
        Some(facility) => Inspection {
            name: Some(facility.name.clone()),
            description: facility.description.clone().unwrap_or_default(),
            chart: RiskChart::for_facility(facility),
        },
        None => {
            debug!(?category, ?hit, "Hover hit does not match a facility");
            Inspection::empty()
        }
    }
}
