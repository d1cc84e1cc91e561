use serde::Serialize;

/// One row of the infrastructure dataset.
///
/// Cells that were empty (or unparseable, for numeric columns) are `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Facility {
    pub name: String,
    pub facility_type: String,
    pub category: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub zip: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub strategic_value: Option<bool>,
    pub systemic_impact: Option<bool>,
    pub economic_impact: Option<u8>,
    pub physical_impact: Option<u8>,
    pub impact_radius_mi: Option<f64>,
    pub zips_affected: Option<String>,
    pub population_affected: Option<f64>,
    pub description: Option<String>,
    pub raw_impact: Option<f64>,
}

impl Facility {
    pub fn position(&self) -> Option<LatLon> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(LatLon { lat, lon }),
            _ => None,
        }
    }

    pub fn economic_level(&self) -> Option<EconomicImpact> {
        self.economic_impact.and_then(EconomicImpact::from_score)
    }

    pub fn physical_level(&self) -> Option<PhysicalImpact> {
        self.physical_impact.and_then(PhysicalImpact::from_score)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

/// Economic consequence of a facility failure, scored 0-4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EconomicImpact {
    NoImpact,
    Local,
    Regional,
    National,
    Global,
}

impl EconomicImpact {
    pub const MAX: u8 = 4;

    pub fn from_score(score: u8) -> Option<Self> {
        match score {
            0 => Some(Self::NoImpact),
            1 => Some(Self::Local),
            2 => Some(Self::Regional),
            3 => Some(Self::National),
            4 => Some(Self::Global),
            _ => None,
        }
    }

    pub fn score(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NoImpact => "No Impact",
            Self::Local => "Local Impact",
            Self::Regional => "Regional Impact",
            Self::National => "National Impact",
            Self::Global => "Global Impact",
        }
    }
}

/// Physical consequence of a facility failure, scored 0-3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicalImpact {
    NoImpact,
    Minor,
    Substantial,
    SubstantialPersistent,
}

impl PhysicalImpact {
    pub fn from_score(score: u8) -> Option<Self> {
        match score {
            0 => Some(Self::NoImpact),
            1 => Some(Self::Minor),
            2 => Some(Self::Substantial),
            3 => Some(Self::SubstantialPersistent),
            _ => None,
        }
    }

    pub fn score(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NoImpact => "No Impact",
            Self::Minor => "Minor Impact",
            Self::Substantial => "Substantial Impact",
            Self::SubstantialPersistent => "Substantial and Persistent Impact",
        }
    }
}
