//! Severity tiers for predicted stunting rates.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Low,
    Moderate,
    High,
    Severe,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Moderate,
        Severity::High,
        Severity::Severe,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Moderate => "Moderate",
            Severity::High => "High",
            Severity::Severe => "Severe",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Severity::Low => "#52b788",
            Severity::Moderate => "#d4a017",
            Severity::High => "#e05020",
            Severity::Severe => "#9b1b1b",
        }
    }

    /// Human-readable range shown in the map legend.
    pub fn range_label(&self) -> &'static str {
        match self {
            Severity::Low => "< 20%",
            Severity::Moderate => "20–30%",
            Severity::High => "30–40%",
            Severity::Severe => "> 40%",
        }
    }
}

/// Classify a rate. Total over f64; NaN lands in `Severe`.
pub fn severity(rate: f64) -> Severity {
    if rate < 20.0 {
        Severity::Low
    } else if rate < 30.0 {
        Severity::Moderate
    } else if rate < 40.0 {
        Severity::High
    } else {
        Severity::Severe
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: &'static str,
}

/// The four severity bands, lowest first.
pub fn legend() -> Vec<LegendEntry> {
    Severity::ALL
        .iter()
        .map(|s| LegendEntry {
            label: format!("{} — {}", s.range_label(), s.label()),
            color: s.color(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundaries() {
        assert_eq!(severity(19.999), Severity::Low);
        assert_eq!(severity(20.0), Severity::Moderate);
        assert_eq!(severity(29.99), Severity::Moderate);
        assert_eq!(severity(30.0), Severity::High);
        assert_eq!(severity(39.9), Severity::High);
        assert_eq!(severity(40.0), Severity::Severe);
    }

    #[test]
    fn test_out_of_range_inputs_still_classified() {
        assert_eq!(severity(-5.0), Severity::Low);
        assert_eq!(severity(250.0), Severity::Severe);
        assert_eq!(severity(f64::NAN), Severity::Severe);
    }

    #[test]
    fn test_label_and_color_pairs() {
        let s = severity(42.3);
        assert_eq!((s.color(), s.label()), ("#9b1b1b", "Severe"));
        assert_eq!(severity(12.0).color(), "#52b788");
    }

    #[test]
    fn test_legend_matches_tiers() {
        let entries = legend();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].label, "< 20% — Low");
        assert_eq!(entries[3].label, "> 40% — Severe");
        for (entry, tier) in entries.iter().zip(Severity::ALL) {
            assert_eq!(entry.color, tier.color());
        }
    }
}
