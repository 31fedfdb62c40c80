use crate::types::{DisplayRow, GeoRecord};
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, Geometry};
use serde::Serialize;
use std::collections::BTreeSet;

/// Light to dark, evenly spaced over [0, 1].
pub const COLOR_SCALE: [&str; 15] = [
    "#F4F6DB", "#DFEEB4", "#C4F08F", "#A8EA81", "#8DE07E", "#73D67E", "#57CD82", "#3BC38A",
    "#21B697", "#0E9FA2", "#0580A1", "#016092", "#01407B", "#02215F", "#030240",
];

pub const VALUE_RANGE: (f64, f64) = (0.0, 2.0);

pub const HIGHLIGHT_WIDTH: u32 = 2;
pub const HIGHLIGHT_COLOR: &str = "#ff69b4";

/// Border width per record: selected rows are outlined, the rest are not.
/// Negative indices and indices past `record_count` are ignored.
pub fn highlight(record_count: usize, selected: &BTreeSet<i64>) -> Vec<u32> {
    (0..record_count)
        .map(|i| if selected.contains(&(i as i64)) { HIGHLIGHT_WIDTH } else { 0 })
        .collect()
}

pub fn colorscale() -> Vec<(f64, &'static str)> {
    let last = (COLOR_SCALE.len() - 1) as f64;
    COLOR_SCALE
        .iter()
        .enumerate()
        .map(|(i, color)| (i as f64 / last, *color))
        .collect()
}

/// Plotly-compatible figure.
#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub data: Vec<ChoroplethTrace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChoroplethTrace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub geojson: FeatureCollection,
    pub locations: Vec<String>,
    pub z: Vec<Option<f64>>,
    pub zmin: f64,
    pub zmax: f64,
    pub colorscale: Vec<(f64, &'static str)>,
    pub colorbar: ColorBar,
    pub text: Vec<String>,
    pub hovertemplate: &'static str,
    pub marker: Marker,
    pub hoverlabel: HoverLabel,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColorBar {
    pub title: Title,
    pub x: f64,
    pub y: f64,
    pub xanchor: &'static str,
    pub yanchor: &'static str,
    pub thickness: u32,
    pub len: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub line: MarkerLine,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarkerLine {
    pub width: Vec<u32>,
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct HoverLabel {
    pub bgcolor: &'static str,
    pub font: Font,
}

#[derive(Debug, Clone, Serialize)]
pub struct Font {
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<Margin>,
    pub geo: GeoLayout,
}

#[derive(Debug, Clone, Serialize)]
pub struct Margin {
    pub t: u32,
    pub b: u32,
    pub l: u32,
    pub r: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GeoLayout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showcountries: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countrycolor: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showsubunits: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subunitcolor: Option<&'static str>,
    pub showland: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landcolor: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlakes: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lakecolor: Option<&'static str>,
}

impl GeoLayout {
    fn usa_counties() -> Self {
        GeoLayout {
            scope: Some("usa"),
            visible: Some(false),
            resolution: Some(110),
            showcountries: Some(true),
            countrycolor: Some("rgba(255, 255, 255, 0)"),
            showsubunits: Some(true),
            subunitcolor: Some("#C2C2C2"),
            showland: false,
            landcolor: Some("white"),
            showlakes: Some(true),
            lakecolor: Some("white"),
        }
    }
}

impl Figure {
    /// No traces, only a diagnostic title.
    pub fn empty(title: impl Into<String>) -> Self {
        Figure {
            data: Vec::new(),
            layout: Layout {
                title: Some(Title { text: title.into() }),
                margin: None,
                geo: GeoLayout {
                    showland: true,
                    ..Default::default()
                },
            },
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.layout.title.as_ref().map(|t| t.text.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Builds the choropleth. `rows`, `hover_text` and `line_widths` are in
/// record order, one entry per record.
pub fn choropleth_figure(
    records: &[GeoRecord],
    rows: &[DisplayRow],
    hover_text: Vec<String>,
    line_widths: Vec<u32>,
) -> Figure {
    let features = records
        .iter()
        .enumerate()
        .map(|(i, record)| Feature {
            bbox: None,
            geometry: record
                .geometry
                .as_ref()
                .map(|mp| Geometry::new(geojson::Value::from(mp))),
            id: Some(Id::String(i.to_string())),
            properties: None,
            foreign_members: None,
        })
        .collect();

    let trace = ChoroplethTrace {
        kind: "choropleth",
        geojson: FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        },
        locations: (0..records.len()).map(|i| i.to_string()).collect(),
        z: rows.iter().map(|row| row.underemployment_level).collect(),
        zmin: VALUE_RANGE.0,
        zmax: VALUE_RANGE.1,
        colorscale: colorscale(),
        colorbar: ColorBar {
            title: Title {
                text: "Underemployment Level".to_string(),
            },
            x: 1.0,
            y: 0.5,
            xanchor: "left",
            yanchor: "middle",
            thickness: 20,
            len: 0.65,
        },
        text: hover_text,
        // Drops the default trace name box.
        hovertemplate: "%{text}<extra></extra>",
        marker: Marker {
            line: MarkerLine {
                width: line_widths,
                color: HIGHLIGHT_COLOR,
            },
        },
        hoverlabel: HoverLabel {
            bgcolor: "rgba(255, 255, 255, 0.8)",
            font: Font { color: "black" },
        },
    };

    Figure {
        data: vec![trace],
        layout: Layout {
            title: None,
            margin: Some(Margin { t: 30, b: 0, l: 0, r: 0 }),
            geo: GeoLayout::usa_counties(),
        },
    }
}
