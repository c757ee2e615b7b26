//! Map Renderer
//!
//! Builds the Plotly choropleth figure for the predictions table. The browser
//! draws it; this side owns the data, the fixed color scale and the legend.

use crate::loader::PredictionTable;
use crate::severity::{legend, severity, LegendEntry, Severity};
use serde::Serialize;
use serde_json::{json, Value};

pub const DOMAIN_MIN: f64 = 10.0;
pub const DOMAIN_MAX: f64 = 55.0;

pub const COLOR_STOPS: [(f64, &str); 5] = [
    (0.0, "#1b4332"),
    (0.25, "#52b788"),
    (0.5, "#d4a017"),
    (0.75, "#c0392b"),
    (1.0, "#6b0000"),
];

/// Fixed five-stop scale over [10, 55]; values outside clamp to the ends.
pub struct ColorScale {
    pub min: f64,
    pub max: f64,
    pub stops: &'static [(f64, &'static str)],
}

impl Default for ColorScale {
    fn default() -> Self {
        Self {
            min: DOMAIN_MIN,
            max: DOMAIN_MAX,
            stops: &COLOR_STOPS,
        }
    }
}

impl ColorScale {
    /// Position of `value` on the scale, in [0, 1].
    pub fn position(&self, value: f64) -> f64 {
        if value.is_nan() {
            return 0.0;
        }
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }

    /// Fill color as `#rrggbb`, linearly interpolated between stops in RGB.
    pub fn color_for(&self, value: f64) -> String {
        let t = self.position(value);
        let upper = self
            .stops
            .iter()
            .position(|(stop, _)| *stop >= t)
            .unwrap_or(self.stops.len() - 1);
        if upper == 0 {
            return self.stops[0].1.to_string();
        }

        let (lo_t, lo_hex) = self.stops[upper - 1];
        let (hi_t, hi_hex) = self.stops[upper];
        let (lo, hi) = (parse_hex(lo_hex), parse_hex(hi_hex));
        let f = if hi_t > lo_t { (t - lo_t) / (hi_t - lo_t) } else { 0.0 };
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * f).round() as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            mix(lo.0, hi.0),
            mix(lo.1, hi.1),
            mix(lo.2, hi.2)
        )
    }

    fn plotly_colorscale(&self) -> Value {
        Value::Array(self.stops.iter().map(|(t, c)| json!([t, c])).collect())
    }
}

fn parse_hex(hex: &str) -> (u8, u8, u8) {
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .unwrap_or(0)
    };
    (channel(1..3), channel(3..5), channel(5..7))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapFeature {
    pub country: String,
    pub value: f64,
    pub severity: Severity,
    pub fill_color: String,
}

/// Everything the map shows, in table order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapData {
    pub features: Vec<MapFeature>,
    pub legend: Vec<LegendEntry>,
    pub domain: [f64; 2],
}

pub fn map_data(table: &PredictionTable) -> MapData {
    let scale = ColorScale::default();
    let features = table
        .records()
        .iter()
        .map(|r| MapFeature {
            country: r.country.clone(),
            value: r.predicted_stunting_2026,
            severity: severity(r.predicted_stunting_2026),
            fill_color: scale.color_for(r.predicted_stunting_2026),
        })
        .collect();
    MapData {
        features,
        legend: legend(),
        domain: [scale.min, scale.max],
    }
}

/// Plotly figure (`{data, layout}`) for the Sub-Saharan Africa choropleth.
pub fn figure(table: &PredictionTable) -> Value {
    let scale = ColorScale::default();
    let locations: Vec<&str> = table.records().iter().map(|r| r.country.as_str()).collect();
    let values: Vec<f64> = table.records().iter().map(|r| r.predicted_stunting_2026).collect();

    let annotations: Vec<Value> = legend()
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            json!({
                "x": 0.01,
                "y": 0.28 - i as f64 * 0.055,
                "xref": "paper",
                "yref": "paper",
                "text": format!("<span style='color:{}'>■</span>  {}", entry.color, entry.label),
                "showarrow": false,
                "font": {"size": 11, "color": "#a0a8b0", "family": "Source Sans 3"},
                "align": "left",
                "xanchor": "left",
            })
        })
        .collect();

    json!({
        "data": [{
            "type": "choropleth",
            "locations": locations,
            "locationmode": "country names",
            "z": values,
            "colorscale": scale.plotly_colorscale(),
            "zmin": scale.min,
            "zmax": scale.max,
            "showscale": false,
            "hovertemplate": "<b>%{location}</b><extra></extra>",
            "marker": {"line": {"color": "rgba(255,255,255,0.06)", "width": 0.5}},
        }],
        "layout": {
            "geo": {
                "scope": "africa",
                "bgcolor": "rgba(0,0,0,0)",
                "showframe": false,
                "showcoastlines": false,
                "landcolor": "rgba(15,20,28,0.9)",
                "lakecolor": "rgba(0,0,0,0)",
                "showlakes": true,
                "projection": {"type": "natural earth"},
            },
            "paper_bgcolor": "rgba(0,0,0,0)",
            "margin": {"l": 0, "r": 0, "t": 0, "b": 0},
            "height": 560,
            "hoverlabel": {
                "bgcolor": "#11161e",
                "font": {"color": "#e8e3d9", "family": "Source Sans 3", "size": 13},
                "bordercolor": "#1e2838",
            },
            "annotations": annotations,
        },
    })
}
