//! HTML page rendering
//!
//! One self-contained page per render cycle: title, choropleth, dropdown and
//! the detail panel. Plotly is loaded from its CDN.

use crate::dashboard::{Dashboard, RenderCycle};
use crate::detail::{DetailView, DriverSection, PredictionDetail};
use crate::drivers::RankedDriver;
use std::fmt::Write;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";
const PAGE_TITLE: &str = "Child Stunting · Sub-Saharan Africa";

/// Full dashboard page for one cycle.
pub fn render_page(dashboard: &Dashboard, cycle: &RenderCycle) -> String {
    let figure = serde_json::to_string(&dashboard.figure())
        .unwrap_or_else(|_| "{}".to_string())
        .replace("</", "<\\/");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{css}</style>
    <script src="{plotly}"></script>
</head>
<body>
    {header}
    <div class="columns">
        <div class="map-col"><div id="map"></div></div>
        <div class="panel-col">
            {picker}
            <div class="panel">
                {panel}
            </div>
        </div>
    </div>
    <script>const FIGURE = {figure};</script>
    <script>{js}</script>
</body>
</html>"#,
        title = PAGE_TITLE,
        css = inline_css(),
        plotly = PLOTLY_CDN,
        header = render_header(),
        picker = render_picker(dashboard.options().countries(), cycle.dropdown_index),
        panel = render_detail(&cycle.detail),
        figure = figure,
        js = inline_javascript(),
    )
}

/// Page shown when the predictions file cannot be loaded. Nothing else renders.
pub fn render_error_page(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>{css}</style>
</head>
<body>
    <div class="fatal-error" role="alert">❌ {message}</div>
</body>
</html>"#,
        title = PAGE_TITLE,
        css = inline_css(),
        message = html_escape(message),
    )
}

fn render_header() -> &'static str {
    r#"<div class="title-area">
        <h1>🌍 Child Stunting Predictions 2026</h1>
        <div class="subtitle">SUB-SAHARAN AFRICA &nbsp;·&nbsp; SELECT A COUNTRY TO SEE DETAILS &amp; KEY DRIVERS</div>
    </div>"#
}

fn render_picker(countries: &[String], selected: usize) -> String {
    let mut options = String::new();
    for (i, country) in countries.iter().enumerate() {
        let _ = write!(
            options,
            r#"<option value="{v}"{sel}>{v}</option>"#,
            v = html_escape(country),
            sel = if i == selected { " selected" } else { "" },
        );
    }
    format!(
        r#"<form class="picker" method="get" action="/">
                <label for="country-search">Or pick a country:</label>
                <input id="country-search" type="search" placeholder="Search…" autocomplete="off">
                <select id="country-picker" name="country" onchange="this.form.submit()">{options}</select>
            </form>"#,
    )
}

/// Inner HTML of the detail panel.
pub fn render_detail(view: &DetailView) -> String {
    match view {
        DetailView::NoPrediction { .. } => placeholder(DetailView::NO_PREDICTION),
        DetailView::Prediction(detail) => render_prediction(detail),
    }
}

fn render_prediction(detail: &PredictionDetail) -> String {
    let color = detail.severity.color();
    let mut out = format!(
        r#"<div class="country-name">{country}</div>
        <div class="severity-chip" style="background:{color}22;color:{color};border:1px solid {color}44">{level} stunting risk</div>
        <div class="prediction-number" style="color:{color}">{value}</div>
        <div class="prediction-label">Predicted stunting rate · 2026</div>"#,
        country = html_escape(&detail.country),
        level = detail.severity.label(),
        value = detail.predicted_display(),
    );

    if let Some(delta) = &detail.delta {
        let _ = write!(
            out,
            r#"<div class="delta">vs 2023 actual: <b>{actual:.1}%</b>&nbsp;<span style="color:{color}">{shown}</span></div>"#,
            actual = delta.actual,
            color = delta.direction.color(),
            shown = delta.display(),
        );
    }

    out.push_str(r#"<hr class="divider">"#);
    match &detail.drivers {
        DriverSection::Ranked { drivers } => {
            out.push_str(r#"<div class="driver-label">🎯 Key factors to focus on</div>"#);
            for driver in drivers {
                out.push_str(&render_driver_row(driver));
            }
        }
        section => {
            out.push_str(&placeholder(&section.placeholder().unwrap_or_default()));
        }
    }
    out
}

fn render_driver_row(driver: &RankedDriver) -> String {
    format!(
        r#"<div class="driver-row">
            <div class="driver-rank">{rank}</div>
            <div class="driver-name">{name}</div>
            <div class="driver-bar-bg"><div class="driver-bar-fill" style="width:{pct}%"></div></div>
        </div>"#,
        rank = driver.rank,
        name = html_escape(&driver.display_name),
        pct = driver.bar_percent(),
    )
}

fn placeholder(text: &str) -> String {
    format!(r#"<div class="placeholder">{}</div>"#, html_escape(text))
}

/// Minimal HTML entity escaping for data coming from the CSV files.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn inline_css() -> &'static str {
    r#"
@import url('https://fonts.googleapis.com/css2?family=Playfair+Display:wght@600;700&family=Source+Sans+3:wght@300;400;600&display=swap');
body { font-family: 'Source Sans 3', sans-serif; background: #0a0e14; color: #e8e3d9; margin: 0; padding: 0 24px; }
h1 { font-family: 'Playfair Display', serif; }
.title-area { padding: 18px 0 8px 0; }
.title-area h1 { font-size: 1.5rem; margin: 0; color: #f0ebe0; }
.subtitle { font-size: 0.78rem; color: #404858; margin-top: 4px; letter-spacing: 0.06em; }
.columns { display: flex; gap: 16px; }
.map-col { flex: 2; min-width: 0; }
.panel-col { flex: 1; min-width: 0; }
.picker { display: flex; flex-direction: column; gap: 6px; margin: 4px 0 12px 0; font-size: 0.85rem; color: #a0a8b0; }
.picker input, .picker select { background: #11161e; color: #e8e3d9; border: 1px solid #1e2838; border-radius: 6px; padding: 6px; }
.panel { background: #11161e; border: 1px solid #1e2838; border-radius: 12px; padding: 24px; }
.country-name { font-family: 'Playfair Display', serif; font-size: 1.6rem; color: #f0ebe0; margin-bottom: 4px; }
.prediction-number { font-family: 'Playfair Display', serif; font-size: 3rem; font-weight: 700; line-height: 1; margin: 12px 0 4px 0; }
.prediction-label { font-size: 0.72rem; text-transform: uppercase; letter-spacing: 0.12em; color: #506070; margin-bottom: 20px; }
.delta { font-size: 0.82rem; color: #506070; margin-bottom: 4px; }
.delta b { color: #a0a8b0; }
.divider { border: none; border-top: 1px solid #1e2838; margin: 20px 0; }
.driver-label { font-size: 0.68rem; text-transform: uppercase; letter-spacing: 0.14em; color: #506070; margin-bottom: 12px; }
.driver-row { display: flex; align-items: center; margin-bottom: 10px; gap: 10px; }
.driver-rank { font-size: 0.7rem; color: #304050; width: 16px; text-align: right; flex-shrink: 0; }
.driver-name { font-size: 0.85rem; color: #c8c0b0; flex: 1; }
.driver-bar-bg { width: 80px; height: 5px; background: #1e2838; border-radius: 3px; flex-shrink: 0; }
.driver-bar-fill { height: 5px; border-radius: 3px; background: #ff8c32; }
.placeholder { color: #304050; font-size: 0.9rem; text-align: center; padding: 40px 0; font-style: italic; }
.severity-chip { display: inline-block; padding: 3px 12px; border-radius: 20px; font-size: 0.72rem; font-weight: 600; letter-spacing: 0.08em; text-transform: uppercase; margin-bottom: 8px; }
.fatal-error { margin: 48px auto; max-width: 720px; padding: 16px 20px; border-radius: 8px; background: #3b1212; border: 1px solid #9b1b1b; color: #f0d0d0; }
"#
}

fn inline_javascript() -> &'static str {
    r#"
(function () {
    const map = document.getElementById('map');
    Plotly.newPlot(map, FIGURE.data, FIGURE.layout, {responsive: true, displayModeBar: false});
    map.on('plotly_click', function (event) {
        const point = event.points && event.points[0];
        if (point && point.location) {
            window.location.search = '?click=' + encodeURIComponent(point.location);
        }
    });

    const search = document.getElementById('country-search');
    const picker = document.getElementById('country-picker');
    search.addEventListener('input', function () {
        fetch('/api/countries?q=' + encodeURIComponent(search.value))
            .then(function (r) { return r.json(); })
            .then(function (body) {
                const allowed = new Set(body.countries.map(function (h) { return h.country; }));
                Array.from(picker.options).forEach(function (o) { o.hidden = !allowed.has(o.value); });
                if (body.countries.length === 1) {
                    picker.value = body.countries[0].country;
                    picker.form.submit();
                }
            });
    });
})();
"#
}
