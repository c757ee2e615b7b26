//! Driver Ranker
//!
//! Picks the strongest attribution scores for a country and prepares them for
//! the bar list in the detail panel. `bar_fraction` is relative to the top
//! selected score, not a share of total attribution.

use crate::config::DEFAULT_TOP_DRIVERS;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedDriver {
    /// 1-based position
    pub rank: usize,
    pub feature: String,
    pub display_name: String,
    pub score: f64,
    pub bar_fraction: f64,
}

impl RankedDriver {
    /// Bar width as a whole percentage, truncated.
    pub fn bar_percent(&self) -> u32 {
        (self.bar_fraction * 100.0) as u32
    }
}

/// Rank with the default limit of seven drivers.
pub fn rank(scores: &[(String, f64)]) -> Vec<RankedDriver> {
    rank_top(scores, DEFAULT_TOP_DRIVERS)
}

pub fn rank_top(scores: &[(String, f64)], limit: usize) -> Vec<RankedDriver> {
    let mut selected: Vec<&(String, f64)> = scores.iter().filter(|(_, v)| !v.is_nan()).collect();
    // stable: equal scores keep their column order
    selected.sort_by(|a, b| b.1.total_cmp(&a.1));
    selected.truncate(limit);

    let max = selected.first().map(|(_, v)| *v).unwrap_or(0.0);
    let scale = if max.is_finite() && max > 0.0 { Some(max) } else { None };

    selected
        .into_iter()
        .enumerate()
        .map(|(i, (feature, score))| RankedDriver {
            rank: i + 1,
            feature: feature.clone(),
            display_name: humanize(feature),
            score: *score,
            bar_fraction: scale.map(|m| (score / m).clamp(0.0, 1.0)).unwrap_or(0.0),
        })
        .collect()
}

/// `mothers_education_lag1` -> `Mothers Education (Prev Yr)`
pub fn humanize(feature: &str) -> String {
    let readable = feature
        .replace("_lag1", " (prev yr)")
        .replace("_lag2", " (2yr ago)")
        .replace('_', " ");
    title_case(&readable)
}

/// Uppercase a letter that follows a non-letter, lowercase every other letter.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_is_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(pairs: &[(&str, f64)]) -> Vec<(String, f64)> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_fewer_features_than_limit() {
        let ranked = rank(&scores(&[("a", 10.0), ("b", 30.0), ("c", 5.0), ("d", 30.0)]));
        assert_eq!(ranked.len(), 4);
        assert!(ranked[0].feature == "b" || ranked[0].feature == "d");
        assert_eq!(ranked[0].bar_fraction, 1.0);
        assert_eq!(ranked[1].bar_fraction, 1.0);
        assert_eq!(ranked[3].feature, "c");
        assert_eq!(ranked.iter().map(|d| d.rank).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_ties_keep_column_order() {
        let ranked = rank(&scores(&[("a", 10.0), ("b", 30.0), ("c", 5.0), ("d", 30.0)]));
        assert_eq!(ranked[0].feature, "b");
        assert_eq!(ranked[1].feature, "d");
    }

    #[test]
    fn test_limit_is_seven() {
        let input: Vec<(String, f64)> = (0..12).map(|i| (format!("f{}", i), i as f64)).collect();
        let ranked = rank(&input);
        assert_eq!(ranked.len(), 7);
        assert_eq!(ranked[0].feature, "f11");
        assert_eq!(ranked[6].feature, "f5");
        assert!((ranked[6].bar_fraction - 5.0 / 11.0).abs() < 1e-12);
        assert_eq!(ranked[6].bar_percent(), 45);
    }

    #[test]
    fn test_all_zero_scores_do_not_divide_by_zero() {
        let ranked = rank(&scores(&[("x", 0.0), ("y", 0.0)]));
        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|d| d.bar_fraction == 0.0));
    }

    #[test]
    fn test_negative_scores_clamp_to_zero_width() {
        let ranked = rank(&scores(&[("up", 2.0), ("down", -1.0)]));
        assert_eq!(ranked[1].bar_fraction, 0.0);

        let all_negative = rank(&scores(&[("a", -1.0), ("b", -3.0)]));
        assert!(all_negative.iter().all(|d| d.bar_fraction == 0.0));
    }

    #[test]
    fn test_empty_input() {
        assert!(rank(&[]).is_empty());
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("mothers_education_lag1"), "Mothers Education (Prev Yr)");
        assert_eq!(humanize("gdp_per_capita"), "Gdp Per Capita");
        assert_eq!(humanize("rainfall_lag2"), "Rainfall (2Yr Ago)");
        assert_eq!(humanize("WASH_index"), "Wash Index");
    }
}
