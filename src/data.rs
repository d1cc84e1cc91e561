use crate::config::AppConfig;
use crate::types::Facility;
use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// The facilities of the loaded CSV, in file order. Never mutated after load;
/// every view handed out is a filtered borrow.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    facilities: Vec<Facility>,
}

impl Dataset {
    pub fn new(facilities: Vec<Facility>) -> Self {
        Self { facilities }
    }

    pub fn facilities(&self) -> &[Facility] {
        &self.facilities
    }

    pub fn len(&self) -> usize {
        self.facilities.len()
    }

    /// Rows whose CATEGORY equals `label`, in dataset order.
    pub fn in_category<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a Facility> + 'a {
        self.facilities.iter().filter(move |f| f.category == label)
    }
}

pub fn load_data(config: &AppConfig) -> Result<Dataset> {
    let dataset = load_csv(&config.input.data_csv)?;
    info!(
        rows = dataset.len(),
        path = ?config.input.data_csv,
        "Loaded infrastructure dataset"
    );
    Ok(dataset)
}

pub fn load_csv(path: &Path) -> Result<Dataset> {
    let file =
        File::open(path).with_context(|| format!("Failed to open CSV file: {:?}", path))?;
    load_from_reader(file).with_context(|| format!("Failed to load CSV file: {:?}", path))
}

pub fn load_from_reader<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = ReaderBuilder::new().from_reader(reader);
    let headers = rdr.headers()?.clone();
    let columns = Columns::locate(&headers)?;

    let mut facilities = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read CSV record {}", line + 1))?;
        facilities.push(columns.facility(&record));
    }

    debug!(rows = facilities.len(), "Parsed CSV records");
    Ok(Dataset::new(facilities))
}

/// Header positions of the required columns.
struct Columns {
    name: usize,
    facility_type: usize,
    category: usize,
    address: usize,
    city: usize,
    zip: usize,
    county: usize,
    latitude: usize,
    longitude: usize,
    strategic_value: usize,
    systemic_impact: usize,
    economic_impact: usize,
    physical_impact: usize,
    impact_radius: usize,
    zips_affected: usize,
    population_affected: usize,
    description: usize,
    raw_impact: usize,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<Self> {
        // A UTF-8 BOM sticks to the first header name.
        let names: Vec<&str> = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}'))
            .collect();
        let find = |column: &str| {
            names
                .iter()
                .position(|h| *h == column)
                .ok_or_else(|| anyhow!("Required column '{}' not found in CSV", column))
        };

        Ok(Self {
            name: find("NAME")?,
            facility_type: find("TYPE")?,
            category: find("CATEGORY")?,
            address: find("ADDRESS")?,
            city: find("CITY")?,
            zip: find("ZIP")?,
            county: find("COUNTY")?,
            latitude: find("LATITUDE")?,
            longitude: find("LONGITUDE")?,
            strategic_value: find("STRATEGIC VALUE")?,
            systemic_impact: find("SYSTEMIC IMPACT")?,
            economic_impact: find("ECONOMIC IMPACT")?,
            physical_impact: find("PHYSICAL IMPACT")?,
            impact_radius: find("PHYSICAL IMPACT RADIUS (mi)")?,
            zips_affected: find("ZIPS AFFECTED")?,
            population_affected: find("POPULATION AFFECTED")?,
            description: find("desc")?,
            raw_impact: find("RAW_IMPACT")?,
        })
    }

    fn facility(&self, record: &StringRecord) -> Facility {
        Facility {
            name: text(record, self.name).unwrap_or_default(),
            facility_type: text(record, self.facility_type).unwrap_or_default(),
            category: text(record, self.category).unwrap_or_default(),
            address: text(record, self.address),
            city: text(record, self.city),
            county: text(record, self.county),
            zip: text(record, self.zip),
            latitude: number(record, self.latitude),
            longitude: number(record, self.longitude),
            strategic_value: flag(record, self.strategic_value),
            systemic_impact: flag(record, self.systemic_impact),
            economic_impact: score(record, self.economic_impact),
            physical_impact: score(record, self.physical_impact),
            impact_radius_mi: number(record, self.impact_radius),
            zips_affected: text(record, self.zips_affected),
            population_affected: number(record, self.population_affected),
            description: text(record, self.description),
            raw_impact: number(record, self.raw_impact),
        }
    }
}

fn text(record: &StringRecord, idx: usize) -> Option<String> {
    record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn number(record: &StringRecord, idx: usize) -> Option<f64> {
    record
        .get(idx)
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

// Scores may have been written as floats ("3.0") by whatever produced the file.
fn score(record: &StringRecord, idx: usize) -> Option<u8> {
    number(record, idx)
        .filter(|v| v.fract() == 0.0 && (0.0..=f64::from(u8::MAX)).contains(v))
        .map(|v| v as u8)
}

fn flag(record: &StringRecord, idx: usize) -> Option<bool> {
    match record.get(idx)?.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Some(true),
        "no" | "n" | "false" | "0" => Some(false),
        _ => None,
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{sample_dataset, SAMPLE_CSV};
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_preserves_row_order() {
        let dataset = sample_dataset();
        assert_eq!(dataset.len(), 10);
        assert_eq!(dataset.facilities()[0].name, "Comanche Peak Nuclear Power Plant");
        assert_eq!(dataset.facilities()[9].name, "Odd Score Substation");
    }

    #[test]
    fn test_parses_typed_fields() {
        let dataset = sample_dataset();
        let plant = &dataset.facilities()[0];

        assert_eq!(plant.facility_type, "Nuclear Reactor");
        assert_eq!(plant.category, "Electricity Generation");
        assert_eq!(plant.zip.as_deref(), Some("76043"));
        assert_eq!(plant.latitude, Some(32.298));
        assert_eq!(plant.strategic_value, Some(true));
        assert_eq!(plant.economic_impact, Some(3));
        assert_eq!(plant.population_affected, Some(85000.0));
        assert_eq!(plant.raw_impact, Some(9.5));

        let quoted = &dataset.facilities()[2];
        assert_eq!(
            quoted.description.as_deref(),
            Some("Coal, gas and carbon capture units.")
        );
    }

    #[test]
    fn test_missing_and_malformed_cells_load_as_none() {
        let dataset = sample_dataset();

        let dam = &dataset.facilities()[7];
        assert_eq!(dam.city, None);
        assert_eq!(dam.address, None);
        assert_eq!(dam.economic_impact, None);
        assert_eq!(dam.physical_impact, Some(3));

        let odd = &dataset.facilities()[9];
        assert_eq!(odd.latitude, None);
        assert_eq!(odd.economic_impact, Some(9));
        assert_eq!(odd.physical_impact, None);
        assert_eq!(odd.raw_impact, None);
    }

    #[test]
    fn test_missing_required_column_fails_naming_it() {
        let csv = SAMPLE_CSV.replacen("RAW_IMPACT", "RAW IMPACT", 1);
        let err = load_from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("'RAW_IMPACT'"), "{}", err);
    }

    #[test]
    fn test_column_names_are_case_sensitive() {
        let csv = SAMPLE_CSV.replacen(",desc,", ",DESC,", 1);
        assert!(load_from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_byte_order_mark_is_ignored() {
        let csv = format!("\u{feff}{}", SAMPLE_CSV);
        let dataset = load_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(dataset.facilities()[0].name, "Comanche Peak Nuclear Power Plant");
    }

    #[test]
    fn test_in_category_filters_by_exact_label() {
        let dataset = sample_dataset();
        let names: Vec<&str> = dataset
            .in_category("Electricity Generation")
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "Comanche Peak Nuclear Power Plant",
                "Austin Energy Substation 1",
                "W A Parish Generating Station",
                "Houston Substation North",
                "Odd Score Substation",
            ]
        );
        assert_eq!(dataset.in_category("electricity generation").count(), 0);
    }

    #[test]
    fn test_load_csv_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE_CSV.as_bytes()).unwrap();

        let dataset = load_csv(file.path()).unwrap();
        assert_eq!(dataset.len(), 10);
    }

    #[test]
    fn test_load_csv_missing_file_is_an_error() {
        let err = load_csv(Path::new("no/such/infra.csv")).unwrap_err();
        assert!(err.to_string().contains("Failed to open CSV file"));
    }
}
