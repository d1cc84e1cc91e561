use crate::category::Category;
use crate::config::MapConfig;
use crate::data::Dataset;
use crate::geocode::Geocoder;
use crate::types::{Facility, LatLon};
use serde::Serialize;
use tracing::{info, warn};

/// Marker size given to the row with the largest raw impact in view.
pub const SIZE_MAX: f64 = 20.0;

const HIGHLIGHT_COLOR: &str = "red";
const HIGHLIGHT_SIZE: f64 = 10.0;

/// Rows of one type within a category.
#[derive(Debug)]
pub struct TypeGroup<'a> {
    pub facility_type: &'a str,
    pub rows: Vec<&'a Facility>,
}

/// Splits a category's rows into per-type groups.
///
/// Groups follow the category's type list, so group `i` is always type
/// `category.type_at(i)`, even when it is empty. Types the list does not
/// know are appended after it, in order of first appearance. Within a group
/// rows keep dataset order, including rows without coordinates: they take a
/// point index even though nothing is drawn for them. The map draws these
/// groups and the inspector indexes into them, so both always agree on what
/// `(curve, point)` means.
pub fn group_by_type<'a>(dataset: &'a Dataset, category: Category) -> Vec<TypeGroup<'a>> {
    let mut groups: Vec<TypeGroup<'a>> = category
        .type_labels()
        .iter()
        .copied()
        .map(|t| TypeGroup {
            facility_type: t,
            rows: Vec::new(),
        })
        .collect();

    let listed = groups.len();
    for facility in dataset.in_category(category.label()) {
        let unlisted = || {
            groups[listed..]
                .iter()
                .position(|g| g.facility_type == facility.facility_type)
                .map(|i| listed + i)
        };
        let idx = match category.type_index(&facility.facility_type).or_else(unlisted) {
            Some(idx) => idx,
            None => {
                groups.push(TypeGroup {
                    facility_type: &facility.facility_type,
                    rows: Vec::new(),
                });
                groups.len() - 1
            }
        };
        groups[idx].rows.push(facility);
    }

    groups
}

/// One marker. `lat`/`lon` are null for rows without coordinates; the point
/// keeps its slot in the trace so point indices match the inspector's.
#[derive(Debug, Clone, Serialize)]
pub struct MapPoint {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub size: f64,
    pub raw_impact: Option<f64>,
    pub name: String,
    pub city: Option<String>,
    pub facility_type: String,
    pub hover_text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    pub curve: usize,
    pub facility_type: String,
    pub points: Vec<MapPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Highlight {
    pub position: LatLon,
    pub label: String,
    pub color: &'static str,
    pub size: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapScene {
    pub category: Category,
    pub category_label: &'static str,
    /// The requested key was unknown and `category` is the default.
    pub category_fallback: bool,
    pub traces: Vec<Trace>,
    pub highlight: Option<Highlight>,
    pub center: LatLon,
    pub zoom: f64,
}

pub fn build_traces(dataset: &Dataset, category: Category) -> Vec<Trace> {
    let groups = group_by_type(dataset, category);

    let max_raw = groups
        .iter()
        .flat_map(|g| g.rows.iter())
        .filter_map(|f| f.raw_impact)
        .fold(0.0_f64, f64::max);

    groups
        .into_iter()
        .enumerate()
        .map(|(curve, group)| Trace {
            curve,
            facility_type: group.facility_type.to_string(),
            points: group
                .rows
                .into_iter()
                .map(|f| map_point(f, max_raw))
                .collect(),
        })
        .collect()
}

fn map_point(facility: &Facility, max_raw: f64) -> MapPoint {
    let position = facility.position();
    let size = match facility.raw_impact {
        Some(raw) if raw > 0.0 && max_raw > 0.0 => raw / max_raw * SIZE_MAX,
        _ => 0.0,
    };
    let hover_text = format!(
        "<b>{}</b><br>{}<br>{}, TX",
        facility.name,
        facility.facility_type,
        facility.city.as_deref().unwrap_or_default()
    );

    MapPoint {
        lat: position.map(|p| p.lat),
        lon: position.map(|p| p.lon),
        size,
        raw_impact: facility.raw_impact,
        name: facility.name.clone(),
        city: facility.city.clone(),
        facility_type: facility.facility_type.clone(),
        hover_text,
    }
}

/// Map centre and zoom, plus the address marker when the lookup succeeded.
///
/// Any geocoding failure lands on the default view without a marker; it is
/// logged, never returned. A blank address is not looked up; any other
/// address is geocoded and labelled exactly as given.
pub async fn locate(
    geocoder: &dyn Geocoder,
    address: Option<&str>,
    config: &MapConfig,
) -> (LatLon, f64, Option<Highlight>) {
    let default_center = LatLon {
        lat: config.default_lat,
        lon: config.default_lon,
    };

    let address = match address {
        Some(a) if !a.trim().is_empty() => a,
        _ => return (default_center, config.default_zoom, None),
    };

    match geocoder.geocode(address).await {
        Ok(position) => {
            info!(address, lat = position.lat, lon = position.lon, "Centred map on address");
            let highlight = Highlight {
                position,
                label: address.to_string(),
                color: HIGHLIGHT_COLOR,
                size: HIGHLIGHT_SIZE,
            };
            (position, config.focus_zoom, Some(highlight))
        }
        Err(e) => {
            warn!(address, error = %e, "Geocoding failed, using default view");
            (default_center, config.default_zoom, None)
        }
    }
}

/// Builds the scene for `category`. `recenter_on` is the address when the
/// user pressed "center"; `None` keeps the default view.
pub async fn render_scene(
    dataset: &Dataset,
    category: Category,
    recenter_on: Option<&str>,
    geocoder: &dyn Geocoder,
    config: &MapConfig,
) -> MapScene {
    let traces = build_traces(dataset, category);
    let (center, zoom, highlight) = locate(geocoder, recenter_on, config).await;

    MapScene {
        category,
        category_label: category.label(),
        category_fallback: false,
        traces,
        highlight,
        center,
        zoom,
    }
}


#[cfg(test)]
mod tests {
    use super::stubs::StubGeocoder;
    use super::*;
    use crate::data::fixtures::sample_dataset;

    #[test]
    fn test_groups_follow_type_list_order() {
        let dataset = sample_dataset();
        let groups = group_by_type(&dataset, Category::Electricity);

        let types: Vec<&str> = groups.iter().map(|g| g.facility_type).collect();
        assert_eq!(types, vec!["Powerplant", "Substation", "Nuclear Reactor"]);

        let substations: Vec<&str> = groups[1].rows.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            substations,
            vec!["Austin Energy Substation 1", "Houston Substation North"]
        );
    }

    #[test]
    fn test_empty_types_keep_their_curve() {
        let dataset = sample_dataset();
        let groups = group_by_type(&dataset, Category::Energy);

        assert_eq!(groups.len(), 9);
        assert_eq!(groups[0].rows.len(), 1);
        assert!(groups[1..8].iter().all(|g| g.rows.is_empty()));
        assert_eq!(groups[8].rows[0].name, "South Texas Project");
    }

    #[test]
    fn test_unlisted_types_trail_the_list() {
        let mut facilities = sample_dataset().facilities().to_vec();
        facilities.push(Facility {
            name: "Mystery Site".to_string(),
            facility_type: "Battery Storage".to_string(),
            category: "Electricity Generation".to_string(),
            latitude: Some(30.0),
            longitude: Some(-97.0),
            ..Facility::default()
        });
        let dataset = Dataset::new(facilities);

        let groups = group_by_type(&dataset, Category::Electricity);
        assert_eq!(groups.len(), 4);
        assert_eq!(groups[3].facility_type, "Battery Storage");
    }

    #[test]
    fn test_every_row_is_found_through_its_type_index() {
        let dataset = sample_dataset();
        for category in Category::ALL {
            let groups = group_by_type(&dataset, category);
            for facility in dataset.in_category(category.label()) {
                let idx = category.type_index(&facility.facility_type).unwrap();
                assert!(groups[idx].rows.iter().any(|f| std::ptr::eq(*f, facility)));
            }
        }
    }

    #[test]
    fn test_traces_scale_size_by_raw_impact() {
        let dataset = sample_dataset();
        let traces = build_traces(&dataset, Category::Electricity);

        assert_eq!(traces.len(), 3);
        assert_eq!(traces[1].curve, 1);
        assert_eq!(traces[1].facility_type, "Substation");

        // Comanche Peak has the largest raw impact (9.5) in this category.
        let reactor = &traces[2].points[0];
        assert!((reactor.size - SIZE_MAX).abs() < 1e-9);
        let substation = &traces[1].points[0];
        assert!((substation.size - 2.0 / 9.5 * SIZE_MAX).abs() < 1e-9);
        assert_eq!(
            substation.hover_text,
            "<b>Austin Energy Substation 1</b><br>Substation<br>Austin, TX"
        );
    }

    #[test]
    fn test_rows_without_coordinates_keep_their_point_index() {
        let dataset = sample_dataset();
        let in_category = dataset.in_category(Category::Electricity.label()).count();
        let traces = build_traces(&dataset, Category::Electricity);
        let points: usize = traces.iter().map(|t| t.points.len()).sum();
        assert_eq!(points, in_category);
        assert_eq!(points, 5);

        let substations: Vec<&str> = traces[1].points.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            substations,
            vec![
                "Austin Energy Substation 1",
                "Houston Substation North",
                "Odd Score Substation"
            ]
        );
        let unplaced = &traces[1].points[2];
        assert_eq!(unplaced.lat, None);
        assert_eq!(unplaced.lon, None);
        assert_eq!(unplaced.size, 0.0);
        assert_eq!(traces[1].points[0].lat, Some(30.26));
    }

    #[tokio::test]
    async fn test_scene_without_recenter_uses_default_view() {
        let dataset = sample_dataset();
        let geocoder = StubGeocoder::found(30.0, -97.0);
        let config = MapConfig::default();

        let scene = render_scene(&dataset, Category::Dam, None, &geocoder, &config).await;

        assert_eq!(scene.category_label, "Dams");
        assert_eq!(scene.center, LatLon { lat: 31.38, lon: -100.47 });
        assert_eq!(scene.zoom, 5.25);
        assert!(scene.highlight.is_none());
        assert_eq!(geocoder.calls(), 0);
    }

    #[tokio::test]
    async fn test_blank_address_does_not_geocode() {
        let geocoder = StubGeocoder::found(30.0, -97.0);
        let (center, zoom, highlight) =
            locate(&geocoder, Some("   "), &MapConfig::default()).await;

        assert_eq!(center, LatLon { lat: 31.38, lon: -100.47 });
        assert_eq!(zoom, 5.25);
        assert!(highlight.is_none());
        assert_eq!(geocoder.calls(), 0);
    }

    #[tokio::test]
    async fn test_geocode_success_centres_and_marks_address() {
        let dataset = sample_dataset();
        let geocoder = StubGeocoder::found(30.0, -97.0);
        let config = MapConfig::default();

        let scene = render_scene(
            &dataset,
            Category::Electricity,
            Some("1100 Congress Ave, Austin"),
            &geocoder,
            &config,
        )
        .await;

        assert_eq!(scene.center, LatLon { lat: 30.0, lon: -97.0 });
        assert_eq!(scene.zoom, 12.0);
        let highlight = scene.highlight.expect("highlight marker");
        assert_eq!(highlight.position, LatLon { lat: 30.0, lon: -97.0 });
        assert_eq!(highlight.label, "1100 Congress Ave, Austin");
        assert_eq!(highlight.color, "red");
        assert_eq!(geocoder.calls(), 1);
    }

    #[tokio::test]
    async fn test_geocode_failure_falls_back_silently() {
        let dataset = sample_dataset();
        let geocoder = StubGeocoder::failing();
        let config = MapConfig::default();

        let scene = render_scene(
            &dataset,
            Category::Electricity,
            Some("nowhere in particular"),
            &geocoder,
            &config,
        )
        .await;

        assert_eq!(scene.center, LatLon { lat: 31.38, lon: -100.47 });
        assert_eq!(scene.zoom, 5.25);
        assert!(scene.highlight.is_none());
        assert_eq!(scene.traces.len(), 3);
    }

    #[tokio::test]
    async fn test_highlight_keeps_the_address_as_typed() {
        let geocoder = StubGeocoder::found(30.0, -97.0);
        let (_, zoom, highlight) =
            locate(&geocoder, Some("  1100 Congress Ave  "), &MapConfig::default()).await;

        assert_eq!(zoom, 12.0);
        assert_eq!(highlight.unwrap().label, "  1100 Congress Ave  ");
        assert_eq!(geocoder.calls(), 1);
    }
}
