use polars::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use stunting_dashboard::config::DashboardConfig;
use stunting_dashboard::dashboard::{AppState, Dashboard};
use stunting_dashboard::detail::{DetailView, Direction, DriverSection};
use stunting_dashboard::render::render_page;
use stunting_dashboard::selection::Selection;
use stunting_dashboard::severity::Severity;
use stunting_dashboard::DashboardError;

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn data_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "stunting-it-{}-{}",
        std::process::id(),
        DIR_COUNTER.fetch_add(1, Ordering::SeqCst)
    ));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_csv(path: PathBuf, df: &mut DataFrame) {
    let mut file = fs::File::create(path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();
}

fn write_predictions(dir: &PathBuf) {
    let mut df = df![
        "country" => ["Kenya", "Chad", "Angola", "Ghana"],
        "predicted_stunting_2026" => [42.3, 31.0, 19.999, 20.0],
        "stunting_2023_actual" => [Some(38.1), None, Some(0.0), Some(22.5)],
    ]
    .unwrap();
    write_csv(dir.join("predictions_2026.csv"), &mut df);
}

fn write_drivers(dir: &PathBuf) {
    let mut df = df![
        "country" => ["Kenya", "Angola"],
        "gdp_per_capita" => [0.10, 0.0],
        "mothers_education_lag1" => [0.40, 0.0],
        "rainfall_lag2" => [0.20, 0.0],
        "water_access" => [0.05, 0.0],
    ]
    .unwrap();
    write_csv(dir.join("country_shap_nowcast.csv"), &mut df);
}

#[test]
fn test_kenya_end_to_end() {
    let dir = data_dir();
    write_predictions(&dir);
    write_drivers(&dir);

    let dashboard = Dashboard::load(DashboardConfig::new(&dir)).unwrap();
    let DetailView::Prediction(detail) = dashboard.detail("Kenya") else {
        panic!("Kenya should have a prediction");
    };
    assert_eq!(detail.predicted_display(), "42.3%");
    assert_eq!(detail.severity, Severity::Severe);
    let delta = detail.delta.clone().unwrap();
    assert_eq!(delta.direction, Direction::Worsening);
    assert_eq!(format!("{:+.1}pp", delta.value), "+4.2pp");

    let DriverSection::Ranked { drivers } = &detail.drivers else {
        panic!("Kenya should have drivers");
    };
    let names: Vec<&str> = drivers.iter().map(|d| d.display_name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Mothers Education (Prev Yr)", "Rainfall (2Yr Ago)", "Gdp Per Capita", "Water Access"]
    );
    assert_eq!(drivers[0].bar_fraction, 1.0);
    assert_eq!(drivers[1].bar_percent(), 50);
}

#[test]
fn test_boundary_tiers_and_zero_actual() {
    let dir = data_dir();
    write_predictions(&dir);
    write_drivers(&dir);
    let dashboard = Dashboard::load(DashboardConfig::new(&dir)).unwrap();

    let DetailView::Prediction(angola) = dashboard.detail("Angola") else {
        panic!("Angola should have a prediction");
    };
    assert_eq!(angola.severity, Severity::Low);
    assert!(angola.delta.is_none());
    let DriverSection::Ranked { drivers } = &angola.drivers else {
        panic!("Angola should have drivers");
    };
    assert!(drivers.iter().all(|d| d.bar_fraction == 0.0));

    let DetailView::Prediction(ghana) = dashboard.detail("Ghana") else {
        panic!("Ghana should have a prediction");
    };
    assert_eq!(ghana.severity, Severity::Moderate);
    assert_eq!(ghana.delta.unwrap().direction, Direction::Improving);
    assert_eq!(ghana.drivers, DriverSection::NoCountryData);
}

#[test]
fn test_missing_driver_file_degrades_every_country() {
    let dir = data_dir();
    write_predictions(&dir);
    let dashboard = Dashboard::load(DashboardConfig::new(&dir)).unwrap();

    for country in dashboard.options().countries() {
        let DetailView::Prediction(detail) = dashboard.detail(country) else {
            panic!("{} should have a prediction", country);
        };
        assert_eq!(
            detail.drivers.placeholder().as_deref(),
            Some("country_shap_nowcast.csv not found")
        );
    }
}

#[test]
fn test_missing_predictions_is_fatal() {
    let dir = data_dir();
    write_drivers(&dir);
    let result = Dashboard::load(DashboardConfig::new(&dir));
    assert!(matches!(result, Err(DashboardError::MissingPrimaryData { .. })));

    let state = AppState::from_load(Dashboard::load(DashboardConfig::new(&dir))).unwrap();
    assert!(!state.is_ready());
}

#[test]
fn test_unknown_country_skips_driver_lookup() {
    let dir = data_dir();
    write_predictions(&dir);
    write_drivers(&dir);
    let dashboard = Dashboard::load(DashboardConfig::new(&dir)).unwrap();
    assert_eq!(
        dashboard.detail("Atlantis"),
        DetailView::NoPrediction {
            country: "Atlantis".to_string()
        }
    );
}

#[test]
fn test_render_cycle_and_page() {
    let dir = data_dir();
    write_predictions(&dir);
    let dashboard = Dashboard::load(DashboardConfig::new(&dir)).unwrap();

    assert_eq!(
        dashboard.options().countries(),
        &["Angola", "Chad", "Ghana", "Kenya"]
    );

    let cycle = dashboard.render_cycle(&Selection::new(Some("Kenya".into()), Some("Chad".into())));
    assert_eq!(cycle.country.as_deref(), Some("Kenya"));
    assert_eq!(cycle.dropdown_index, 3);

    let html = render_page(&dashboard, &cycle);
    assert!(html.contains("Severe stunting risk"));
    assert!(html.contains(r#"<option value="Kenya" selected>"#));
    assert!(html.contains("\"scope\":\"africa\""));
}

#[test]
fn test_drivers_file_without_country_column_only_degrades() {
    let dir = data_dir();
    write_predictions(&dir);
    fs::write(
        dir.join("country_shap_nowcast.csv"),
        "Country,gdp_per_capita\nKenya,0.4\n",
    )
    .unwrap();

    let state = AppState::from_load(Dashboard::load(DashboardConfig::new(&dir))).unwrap();
    let AppState::Ready(dashboard) = state else {
        panic!("a bad drivers file must not stop the dashboard");
    };
    assert!(dashboard.drivers().is_none());

    let DetailView::Prediction(detail) = dashboard.detail("Kenya") else {
        panic!("Kenya should have a prediction");
    };
    assert_eq!(
        detail.drivers.placeholder().as_deref(),
        Some("country_shap_nowcast.csv not found")
    );
}
