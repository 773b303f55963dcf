//! Page controllers: read widget values, filter, aggregate, build charts.

use crate::aggregate::{count_by_category, pivot};
use crate::chart::{self, ChartSpec, Labels, ViewState, MAX_PITCH, MAX_ZOOM};
use crate::config::{AppConfig, MapConfig};
use crate::data::DataLoader;
use crate::error::{LoadError, PageError};
use crate::filter::{filter_by_categories, filter_by_status, filter_by_zip_range, FilterCriteria, StatusFilter, ALL_STATUSES};
use crate::types::{Dataset, Field, Record};
use crate::view::{Control, PageView, Section, TableView};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Page {
    Home,
    #[serde(rename = "Data Overview")]
    DataOverview,
    Visualizations,
    Analysis,
    Citations,
}

impl Page {
    /// Navigation order.
    pub const ALL: [Page; 5] = [
        Page::Home,
        Page::DataOverview,
        Page::Visualizations,
        Page::Analysis,
        Page::Citations,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::DataOverview => "Data Overview",
            Page::Visualizations => "Visualizations",
            Page::Analysis => "Analysis",
            Page::Citations => "Citations",
        }
    }

    pub fn slug(self) -> String {
        self.name().to_lowercase().replace(' ', "-")
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Page {
    type Err = PageError;

    /// Accepts "Data Overview", "data-overview" or "data_overview".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace([' ', '_'], "-");
        Page::ALL
            .into_iter()
            .find(|p| p.slug() == wanted)
            .ok_or_else(|| PageError::UnknownPage(s.to_string()))
    }
}

/// Raw widget values as they arrive from a query string or the command line.
/// Anything left out falls back to the widget's default.
#[derive(Debug, Clone, Default, Deserialize, clap::Args)]
pub struct WidgetQuery {
    /// License status, or "All"
    #[arg(long)]
    pub status: Option<String>,
    // Numbers are taken as wide integers and brought into range in `resolve`,
    // so an out-of-range value never rejects the request.
    #[arg(long, allow_negative_numbers = true)]
    pub zip_min: Option<i64>,
    #[arg(long, allow_negative_numbers = true)]
    pub zip_max: Option<i64>,
    /// Comma-separated license categories; an empty value selects none
    #[arg(long)]
    pub categories: Option<String>,
    #[arg(long, allow_negative_numbers = true)]
    pub lat: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    pub lon: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    pub zoom: Option<i64>,
    #[arg(long, allow_negative_numbers = true)]
    pub pitch: Option<i64>,
}

/// Widget values for one render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetState {
    pub criteria: FilterCriteria,
    pub view: ViewState,
}

impl WidgetQuery {
    pub fn resolve(&self, dataset: &Dataset, map: &MapConfig) -> WidgetState {
        let status = self
            .status
            .as_deref()
            .map(StatusFilter::parse)
            .unwrap_or(StatusFilter::All);

        let zip_range = dataset
            .zip_bounds()
            .map(|(lo, hi)| {
                (
                    self.zip_min.map_or(lo, saturate_zip),
                    self.zip_max.map_or(hi, saturate_zip),
                )
            });

        let known = dataset.categories();
        let categories: HashSet<String> = match &self.categories {
            Some(raw) => parse_categories(raw, &known),
            None => known.into_iter().collect(),
        };

        let view = ViewState::new(
            self.lat.unwrap_or(map.latitude),
            self.lon.unwrap_or(map.longitude),
            self.zoom.map_or(map.zoom, |z| clamp_slider(z, MAX_ZOOM)),
            self.pitch.map_or(map.pitch, |p| clamp_slider(p, MAX_PITCH)),
        );

        WidgetState {
            criteria: FilterCriteria {
                status,
                zip_range,
                categories,
            },
            view,
        }
    }
}

/// Splits a comma-separated selection. Adjacent pieces are joined back
/// together, longest first, when they spell a known category that itself
/// contains a comma.
fn parse_categories(raw: &str, known: &[String]) -> HashSet<String> {
    let pieces: Vec<&str> = raw.split(',').collect();
    let mut selected = HashSet::new();
    let mut start = 0;

    while start < pieces.len() {
        let joined = (start + 1..=pieces.len())
            .rev()
            .map(|end| (end, pieces[start..end].join(",")))
            .find(|(end, name)| *end > start + 1 && known.iter().any(|k| k == name.trim()));

        let (end, name) = joined.unwrap_or_else(|| (start + 1, pieces[start].to_string()));
        let name = name.trim();
        if !name.is_empty() {
            selected.insert(name.to_string());
        }
        start = end;
    }

    selected
}

fn saturate_zip(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

fn clamp_slider(value: i64, max: u8) -> u8 {
    // clamped into 0..=max, which always fits a u8
    value.clamp(0, i64::from(max)) as u8
}

/// Landing page picture. Dimensions are read once, at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct LandingImage {
    pub src: String,
    pub caption: String,
    pub dimensions: Option<(u32, u32)>,
}

impl LandingImage {
    pub fn load(path: &Path, caption: &str) -> Self {
        let dimensions = match image::image_dimensions(path) {
            Ok(dims) => Some(dims),
            Err(e) => {
                warn!(path = ?path, error = %e, "Landing image unavailable");
                None
            }
        };
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            src: format!("/assets/{}", file_name),
            caption: caption.to_string(),
            dimensions,
        }
    }
}

/// Everything a render pass needs: the cached registry plus static settings.
pub struct Dashboard {
    loader: DataLoader,
    map: MapConfig,
    landing: LandingImage,
}

impl Dashboard {
    pub fn new(loader: DataLoader, map: MapConfig, landing: LandingImage) -> Self {
        Self { loader, map, landing }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            DataLoader::from_config(&config.input),
            config.map.clone(),
            LandingImage::load(&config.input.landing_image, &config.input.landing_caption),
        )
    }

    pub fn dataset(&self) -> Result<Arc<Dataset>, LoadError> {
        self.loader.load()
    }

    pub fn render(&self, page: Page, query: &WidgetQuery) -> Result<PageView, LoadError> {
        let dataset = self.loader.load()?;
        let widgets = query.resolve(&dataset, &self.map);
        debug!(page = %page, "Rendering page");

        Ok(match page {
            Page::Home => home_page(&self.landing),
            Page::DataOverview => data_overview(&dataset, &widgets),
            Page::Visualizations => visualizations(&dataset, &widgets, &self.map.style),
            Page::Analysis => analysis(&dataset),
            Page::Citations => citations(),
        })
    }
}

pub fn home_page(landing: &LandingImage) -> PageView {
    let mut view = PageView::new(Page::Home, "Welcome to the Cannabis Registry Dashboard!");
    view.text("Navigate through the application using the sidebar to explore different data insights.");
    view.push(Section::Image {
        src: landing.src.clone(),
        caption: landing.caption.clone(),
        width: landing.dimensions.map(|d| d.0),
        height: landing.dimensions.map(|d| d.1),
    });
    view
}

pub fn data_overview(dataset: &Dataset, widgets: &WidgetState) -> PageView {
    let mut view = PageView::new(Page::DataOverview, "Cannabis Registry Data Overview");
    let records = dataset.view();
    let criteria = &widgets.criteria;
    let statuses = dataset.statuses();
    let categories = dataset.categories();

    let mut status_options = vec![ALL_STATUSES.to_string()];
    status_options.extend(statuses);
    view.controls.push(Control::Select {
        id: "status".into(),
        label: "Choose a License Status".into(),
        options: status_options,
        selected: criteria.status.label().to_string(),
    });
    if let (Some((min, max)), Some(selected)) = (dataset.zip_bounds(), criteria.zip_range) {
        view.controls.push(Control::RangeSlider {
            id: "zip_range".into(),
            label: "Select a ZIP code range".into(),
            min,
            max,
            selected,
        });
    }
    view.controls.push(Control::MultiSelect {
        id: "categories".into(),
        label: "Select License Categories".into(),
        selected: categories
            .iter()
            .filter(|c| criteria.categories.contains(*c))
            .cloned()
            .collect(),
        options: categories,
    });

    push_table(&mut view, &records, dataset, "No records in the registry.");

    view.subheader("Filter by License Status");
    let by_status = filter_by_status(&records, &criteria.status);
    push_table(&mut view, &by_status, dataset, "No records match the selected license status.");

    view.subheader("Filter by ZIP Code Range");
    let by_zip = match criteria.zip_range {
        Some((min, max)) => filter_by_zip_range(&records, min, max),
        None => Vec::new(),
    };
    push_table(&mut view, &by_zip, dataset, "No records in the selected ZIP code range.");

    let by_category = filter_by_categories(&records, &criteria.categories);
    if by_category.is_empty() {
        view.no_data("No data available for selected categories.");
    } else {
        view.subheader("Bar Chart of License Categories");
        let counts = count_by_category(&by_category, Field::Category);
        view.push(Section::Chart(ChartSpec::Bar(chart::bar_chart(
            &counts,
            Labels::new("Number of Entries per License Category", "License Category", "Count"),
            chart::CATEGORY_PALETTE,
        ))));
    }

    view
}

pub fn visualizations(dataset: &Dataset, widgets: &WidgetState, map_style: &str) -> PageView {
    let mut view = PageView::new(Page::Visualizations, "Data Visualizations");
    let records = dataset.view();
    let camera = widgets.view;

    view.controls.extend([
        Control::NumberInput {
            id: "lat".into(),
            label: "Latitude".into(),
            value: camera.latitude,
            format: "%.4f".into(),
        },
        Control::NumberInput {
            id: "lon".into(),
            label: "Longitude".into(),
            value: camera.longitude,
            format: "%.4f".into(),
        },
        Control::Slider {
            id: "zoom".into(),
            label: "Zoom Level".into(),
            min: 0,
            max: MAX_ZOOM,
            value: camera.zoom,
        },
        Control::Slider {
            id: "pitch".into(),
            label: "Pitch".into(),
            min: 0,
            max: MAX_PITCH,
            value: camera.pitch,
        },
    ]);

    view.subheader("Location Scatter Plot");
    view.text(
        "This scatter plot shows the geographical distribution of cannabis registries in Boston. \
         Change the latitude, longitude, zoom, and pitch in the sidebar to explore different areas.",
    );
    if records.is_empty() {
        view.no_data("No locations available to plot.");
    } else {
        view.push(Section::Chart(ChartSpec::Scatter(chart::scatter_map(&records, camera, map_style))));
    }

    view.subheader("Histogram of Licenses by ZIP Code");
    view.text("This histogram presents the number of licenses distributed across the various ZIP codes.");
    if records.is_empty() {
        view.no_data("No licenses available to count.");
    } else {
        let counts = count_by_category(&records, Field::ZipCode);
        view.push(Section::Chart(ChartSpec::Bar(chart::bar_chart(
            &counts,
            Labels::new("Licenses by ZIP Code", "ZIP Code", "Number of Licenses"),
            chart::ZIP_PALETTE,
        ))));
    }

    view.subheader("License Status by Zip Code");
    view.text("The table below breaks down the number of licenses by their status for each ZIP code.");
    if records.is_empty() {
        view.no_data("No licenses available to break down.");
    } else {
        let table = pivot(&records, Field::ZipCode, Field::Status, Field::Name);
        view.push(Section::Table(TableView::from_pivot(&table, &dataset.columns().zip_code)));
    }

    view
}

pub fn analysis(dataset: &Dataset) -> PageView {
    let mut view = PageView::new(Page::Analysis, "Data Analysis");
    let records = dataset.view();

    view.subheader("License Status Distribution");
    if records.is_empty() {
        view.no_data("No license statuses to chart.");
    } else {
        let counts = count_by_category(&records, Field::Status);
        view.push(Section::Chart(ChartSpec::Bar(chart::bar_chart(
            &counts,
            Labels::new("License Status Distribution", "License Status", "Count"),
            chart::STATUS_PALETTE,
        ))));
    }

    view.subheader("License Category Distribution");
    if records.is_empty() {
        view.no_data("No license categories to chart.");
    } else {
        let counts = count_by_category(&records, Field::Category);
        view.push(Section::Chart(ChartSpec::Pie(chart::pie_chart(
            &counts,
            "License Category Distribution",
        ))));
    }

    view.subheader("Heatmap of License Categories by ZIP Code");
    view.text(
        "The heatmap below represents the concentration of license categories across ZIP codes. \
         More intense colors show a higher concentration of licenses.",
    );
    if records.is_empty() {
        view.no_data("No licenses available for the heatmap.");
    } else {
        let table = pivot(&records, Field::ZipCode, Field::Category, Field::Name);
        view.push(Section::Chart(ChartSpec::Heatmap(chart::heatmap(
            &table,
            Labels::new("Heatmap of License Categories by ZIP Code", "License Category", "ZIP Code"),
        ))));
    }

    view
}

pub fn citations() -> PageView {
    let mut view = PageView::new(Page::Citations, "Citations");
    view.text("Data and images sourced from various websites.");
    view.push(Section::Link {
        label: "Marijuana Stock Photos".into(),
        url: "https://www.istockphoto.com/photos/marijuana".into(),
    });
    view.push(Section::Link {
        label: "Seaborn Charts".into(),
        url: "https://seaborn.pydata.org/examples/many_pairwise_correlations.html".into(),
    });
    view.push(Section::Balloons);
    view
}

fn push_table(view: &mut PageView, records: &[&Record], dataset: &Dataset, empty_message: &str) {
    if records.is_empty() {
        view.no_data(empty_message);
    } else {
        view.push(Section::Table(TableView::from_records(records, dataset.columns())));
    }
}
