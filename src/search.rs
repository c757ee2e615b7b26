//! Country search for the dropdown's type-ahead box.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use strsim::jaro_winkler;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("whitespace pattern");
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub country: String,
    pub score: f64,
}

pub struct CountrySearch {
    /// Jaro-Winkler similarity (0.0-1.0) needed for a non-substring match
    pub similarity_threshold: f64,
}

impl Default for CountrySearch {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.8,
        }
    }
}

impl CountrySearch {
    pub fn new(threshold: f64) -> Self {
        Self {
            similarity_threshold: threshold,
        }
    }

    /// Lowercase, drop punctuation, collapse whitespace.
    pub fn normalize(&self, s: &str) -> String {
        let stripped: String = s
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace())
            .collect();
        WHITESPACE.replace_all(stripped.trim(), " ").into_owned()
    }

    /// Countries matching `query`, best first. An empty query returns every
    /// country in its original order.
    pub fn search(&self, query: &str, countries: &[String]) -> Vec<SearchHit> {
        let needle = self.normalize(query);
        if needle.is_empty() {
            return countries
                .iter()
                .map(|c| SearchHit {
                    country: c.clone(),
                    score: 1.0,
                })
                .collect();
        }

        let mut hits: Vec<SearchHit> = countries
            .iter()
            .filter_map(|country| {
                let haystack = self.normalize(country);
                let score = if haystack.starts_with(&needle) {
                    1.0
                } else if haystack.contains(&needle) {
                    0.95
                } else {
                    jaro_winkler(&needle, &haystack)
                };
                (score >= self.similarity_threshold).then(|| SearchHit {
                    country: country.clone(),
                    score,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.country.cmp(&b.country)));
        hits
    }
}
