use registry_dashboard::chart::ChartSpec;
use registry_dashboard::config::AppConfig;
use registry_dashboard::pages::{Dashboard, Page, WidgetQuery};
use registry_dashboard::view::Section;
use std::path::PathBuf;

fn sample_config() -> AppConfig {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let mut config = AppConfig::load_from_file(&root.join("config.toml")).unwrap();
    config.input.data_csv = root.join(&config.input.data_csv);
    config.input.landing_image = root.join(&config.input.landing_image);
    config
}

#[test]
fn sample_registry_drops_the_row_without_coordinates() {
    let dashboard = Dashboard::from_config(&sample_config());
    let dataset = dashboard.dataset().unwrap();

    assert_eq!(dataset.len(), 9);
    assert!(dataset.records().iter().all(|r| r.name != "Southie Supply"));
    assert_eq!(dataset.zip_bounds(), Some((2113, 2215)));
}

#[test]
fn every_page_renders_with_default_widgets() {
    let dashboard = Dashboard::from_config(&sample_config());

    for page in Page::ALL {
        let view = dashboard.render(page, &WidgetQuery::default()).unwrap();
        assert_eq!(view.page, page);
        assert!(!view.sections.is_empty());
        assert!(!view.has_no_data(), "{} unexpectedly empty", page);
    }
}

#[test]
fn unknown_status_shows_no_data_instead_of_failing() {
    let dashboard = Dashboard::from_config(&sample_config());
    let query = WidgetQuery {
        status: Some("Revoked".into()),
        ..Default::default()
    };

    let view = dashboard.render(Page::DataOverview, &query).unwrap();
    assert!(view.sections.contains(&Section::NoData {
        message: "No records match the selected license status.".into()
    }));
}

#[test]
fn analysis_pie_sums_to_the_dataset() {
    let dashboard = Dashboard::from_config(&sample_config());
    let view = dashboard.render(Page::Analysis, &WidgetQuery::default()).unwrap();

    let pie = view
        .sections
        .iter()
        .find_map(|s| match s {
            Section::Chart(ChartSpec::Pie(pie)) => Some(pie),
            _ => None,
        })
        .expect("analysis page has a pie chart");

    let total: usize = pie.slices.iter().map(|s| s.value).sum();
    assert_eq!(total, 9);
    // largest slice is 4, so only a slice below 0.4 could explode
    assert!(pie.slices.iter().all(|s| !s.explode));
}

#[test]
fn page_view_serializes_for_the_frontend() {
    let dashboard = Dashboard::from_config(&sample_config());
    let view = dashboard.render(Page::Visualizations, &WidgetQuery::default()).unwrap();
    let json = serde_json::to_value(&view).unwrap();

    assert_eq!(json["page"], "Visualizations");
    assert_eq!(json["controls"][2]["widget"], "slider");
    let map = &json["sections"][2];
    assert_eq!(map["type"], "chart");
    assert_eq!(map["kind"], "scatter");
    assert_eq!(map["layer"]["radius"], 100);
}
