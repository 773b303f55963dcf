use crate::aggregate::{PivotTable, ValueCounts};
use crate::config::MapConfig;
use crate::types::Record;
use image::Rgba;
use serde::Serialize;

pub const CATEGORY_PALETTE: &[&str] = &[
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd",
    "#8c564b", "#e377c2", "#7f7f7f", "#bcbd22", "#17becf",
];

pub const STATUS_PALETTE: &[&str] = &["pink", "lightblue", "purple", "yellow", "orange"];

pub const ZIP_PALETTE: &[&str] = &["#1f77b4"];

pub const PIE_PALETTE: &[&str] = &[
    "#1f77b4", "#aec7e8", "#ff7f0e", "#ffbb78", "#2ca02c", "#98df8a", "#d62728",
    "#ff9896", "#9467bd", "#c5b0d5", "#8c564b", "#c49c94", "#e377c2", "#f7b6d2",
    "#7f7f7f", "#c7c7c7", "#bcbd22", "#dbdb8d", "#17becf", "#9edae5",
];

// YlGnBu anchors, light to dark
const YLGNBU: &[&str] = &[
    "#ffffd9", "#edf8b1", "#c7e9b4", "#7fcdbb", "#41b6c4",
    "#1d91c0", "#225ea8", "#253494", "#081d58",
];

pub const EXPLODE_OFFSET: f64 = 0.1;
pub const EXPLODE_THRESHOLD: f64 = 0.1;

pub const SCATTER_COLOR: [u8; 4] = [155, 10, 0, 150];
pub const SCATTER_RADIUS: u32 = 100;
pub const MAX_ZOOM: u8 = 20;
pub const MAX_PITCH: u8 = 60;

/// Something the rendering layer can draw as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartSpec {
    Bar(BarChart),
    Pie(PieChart),
    Heatmap(Heatmap),
    Scatter(ScatterMap),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Labels {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

impl Labels {
    pub fn new(title: &str, x_label: &str, y_label: &str) -> Self {
        Self {
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub labels: Labels,
    pub bars: Vec<Bar>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: usize,
    pub color: String,
}

/// One bar per entry, in count order. The palette repeats when it runs out.
pub fn bar_chart(counts: &ValueCounts, labels: Labels, palette: &[&str]) -> BarChart {
    let bars = counts
        .entries
        .iter()
        .zip(palette.iter().cycle())
        .map(|((key, value), color)| Bar {
            label: key.to_string(),
            value: *value,
            color: color.to_string(),
        })
        .collect();
    BarChart { labels, bars }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieChart {
    pub title: String,
    pub legend_title: String,
    pub start_angle: u16,
    pub slices: Vec<Slice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    pub label: String,
    pub value: usize,
    /// Share of the whole pie, one decimal.
    pub percent: f64,
    pub explode: bool,
    pub offset: f64,
    pub color: String,
}

/// Small slices are pulled out: a slice explodes when its value is strictly
/// below a tenth of the largest slice.
pub fn pie_chart(counts: &ValueCounts, title: &str) -> PieChart {
    let threshold = counts.max() as f64 * EXPLODE_THRESHOLD;

    let slices = counts
        .entries
        .iter()
        .zip(counts.percentages())
        .zip(PIE_PALETTE.iter().cycle())
        .map(|(((key, value), percent), color)| {
            let explode = (*value as f64) < threshold;
            Slice {
                label: key.to_string(),
                value: *value,
                percent,
                explode,
                offset: if explode { EXPLODE_OFFSET } else { 0.0 },
                color: color.to_string(),
            }
        })
        .collect();

    PieChart {
        title: title.to_string(),
        legend_title: "Categories".to_string(),
        start_angle: 90,
        slices,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    pub labels: Labels,
    pub colormap: String,
    pub x_tick_rotation: u16,
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub cells: Vec<Vec<HeatCell>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatCell {
    pub count: usize,
    pub annotation: String,
    /// 0.0 for an empty cell, 1.0 for the busiest.
    pub intensity: f64,
    pub color: String,
}

pub fn heatmap(table: &PivotTable, labels: Labels) -> Heatmap {
    let max = table.max();
    let cells = table
        .cells
        .iter()
        .map(|row| {
            row.iter()
                .map(|&count| {
                    let intensity = if max == 0 { 0.0 } else { count as f64 / max as f64 };
                    HeatCell {
                        count,
                        annotation: count.to_string(),
                        intensity,
                        color: rgba_to_hex(colormap(intensity)),
                    }
                })
                .collect()
        })
        .collect();

    Heatmap {
        labels,
        colormap: "YlGnBu".to_string(),
        x_tick_rotation: 45,
        rows: table.rows.iter().map(ToString::to_string).collect(),
        columns: table.columns.iter().map(ToString::to_string).collect(),
        cells,
    }
}

/// Linear interpolation across the YlGnBu anchors. `t` is clamped to [0, 1].
pub fn colormap(t: f64) -> Rgba<u8> {
    let t = t.clamp(0.0, 1.0);
    let span = (YLGNBU.len() - 1) as f64;
    let pos = t * span;
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(YLGNBU.len() - 1);
    let frac = pos - lo as f64;

    let a = hex_to_rgba(YLGNBU[lo]);
    let b = hex_to_rgba(YLGNBU[hi]);
    let mix = |i: usize| (a[i] as f64 + (b[i] as f64 - a[i] as f64) * frac).round() as u8;
    Rgba([mix(0), mix(1), mix(2), 255])
}

fn hex_to_rgba(hex: &str) -> Rgba<u8> {
    let hex = hex.trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .unwrap_or(0)
    };
    Rgba([channel(0..2), channel(2..4), channel(4..6), 255])
}

fn rgba_to_hex(color: Rgba<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterMap {
    pub map_style: String,
    pub view: ViewState,
    pub layer: ScatterLayer,
}

/// Camera position. Always taken from user input, never fitted to the data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewState {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: u8,
    pub pitch: u8,
}

impl ViewState {
    /// Zoom and pitch are clamped to the slider domains.
    pub fn new(latitude: f64, longitude: f64, zoom: u8, pitch: u8) -> Self {
        Self {
            latitude,
            longitude,
            zoom: zoom.min(MAX_ZOOM),
            pitch: pitch.min(MAX_PITCH),
        }
    }
}

impl From<&MapConfig> for ViewState {
    fn from(map: &MapConfig) -> Self {
        ViewState::new(map.latitude, map.longitude, map.zoom, map.pitch)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterLayer {
    pub layer_type: String,
    /// `[longitude, latitude]` per record.
    pub positions: Vec<[f64; 2]>,
    pub color: [u8; 4],
    pub radius: u32,
}

pub fn scatter_map(records: &[&Record], view: ViewState, map_style: &str) -> ScatterMap {
    ScatterMap {
        map_style: map_style.to_string(),
        view,
        layer: ScatterLayer {
            layer_type: "ScatterplotLayer".to_string(),
            positions: records.iter().map(|r| [r.longitude(), r.latitude()]).collect(),
            color: SCATTER_COLOR,
            radius: SCATTER_RADIUS,
        },
    }
}
