//! Station-name extraction with alias normalization and fuzzy fallback.
//!
//! Matching is two-pass: a curated alias table catches colloquialisms and
//! common misspellings verbatim, then normalized Levenshtein distance over
//! query tokens catches everything else. Both passes are case-insensitive.

use tracing::debug;

use crate::error::NluError;

/// Curated alias → canonical table, checked in order against the lowercased
/// query. Aliases must not collide across stations; first match wins.
const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("macarthur", "MacArthur"),
    ("mac arthur", "MacArthur"),
    ("mcarthur", "MacArthur"),
    ("mc arthur", "MacArthur"),
    ("fruitvale", "Fruitvale"),
    ("fruit vale", "Fruitvale"),
    ("fruitvail", "Fruitvale"),
    ("oakland", "Oakland"),
    ("oak land", "Oakland"),
    ("okland", "Oakland"),
    ("oaklnd", "Oakland"),
    ("oakand", "Oakland"),
    ("downtown oakland", "Oakland"),
    ("oakland downtown", "Oakland"),
];

/// The curated default alias table.
#[must_use]
pub fn default_aliases() -> Vec<(String, String)> {
    DEFAULT_ALIASES
        .iter()
        .map(|(alias, canonical)| ((*alias).to_string(), (*canonical).to_string()))
        .collect()
}

/// Maps free text to a canonical station name from a closed set.
#[derive(Debug, Clone)]
pub struct StationMatcher {
    stations: Vec<String>,
    aliases: Vec<(String, String)>,
    max_distance: f64,
}

impl StationMatcher {
    /// Create a matcher over the closed canonical set, with the default
    /// alias table restricted to stations actually in the set.
    #[must_use]
    pub fn new(stations: Vec<String>) -> Self {
        let aliases = default_aliases()
            .into_iter()
            .filter(|(_, canonical)| stations.iter().any(|s| s == canonical))
            .collect();
        Self {
            stations,
            aliases,
            max_distance: 0.5,
        }
    }

    /// Replace the alias table. Order is significant: earlier entries win.
    #[must_use]
    pub fn with_aliases(mut self, aliases: Vec<(String, String)>) -> Self {
        self.aliases = aliases;
        self
    }

    /// Set the normalized-distance acceptance ceiling for the fuzzy pass.
    #[must_use]
    pub const fn with_max_distance(mut self, max_distance: f64) -> Self {
        self.max_distance = max_distance;
        self
    }

    #[must_use]
    pub fn stations(&self) -> &[String] {
        &self.stations
    }

    /// Resolve a station name from free text.
    ///
    /// Alias containment is tried first; otherwise every query token longer
    /// than 3 characters is compared to every canonical name by Levenshtein
    /// distance normalized by the longer string's length, and the global
    /// minimum is accepted iff it is under the ceiling. Ties keep the first
    /// station in the canonical set's order.
    ///
    /// # Errors
    /// `NluError::NoConfidentMatch` when neither pass produces a match.
    pub fn match_station(&self, query: &str) -> Result<String, NluError> {
        let lower = query.to_lowercase();

        for (alias, canonical) in &self.aliases {
            if lower.contains(alias.as_str()) {
                debug!("alias \"{alias}\" matched, resolving to {canonical}");
                return Ok(canonical.clone());
            }
        }

        let mut best: Option<(&String, f64)> = None;
        for token in lower.split_whitespace() {
            if token.chars().count() <= 3 {
                continue;
            }
            for station in &self.stations {
                let distance = normalized_levenshtein(token, &station.to_lowercase());
                if best.is_none_or(|(_, d)| distance < d) {
                    best = Some((station, distance));
                }
            }
        }

        match best {
            Some((station, distance)) if distance < self.max_distance => {
                debug!("fuzzy match {station} at normalized distance {distance:.2}");
                Ok(station.clone())
            }
            _ => Err(NluError::NoConfidentMatch),
        }
    }
}

/// Minimum single-character edits to transform `a` into `b`.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Levenshtein distance normalized by the longer string's length, in [0, 1].
fn normalized_levenshtein(a: &str, b: &str) -> f64 {
    let longer = a.chars().count().max(b.chars().count());
    if longer == 0 {
        return 0.0;
    }
    levenshtein(a, b) as f64 / longer as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> StationMatcher {
        StationMatcher::new(vec![
            "MacArthur".to_string(),
            "Fruitvale".to_string(),
            "Oakland".to_string(),
        ])
    }

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", "abc"), 0);
    }

    #[test]
    fn alias_lookup_wins() {
        let m = matcher();
        assert_eq!(m.match_station("parking at mc arthur please").unwrap(), "MacArthur");
        assert_eq!(m.match_station("downtown oakland spots").unwrap(), "Oakland");
    }

    #[test]
    fn alias_is_case_insensitive() {
        let m = matcher();
        assert_eq!(m.match_station("FRUITVALE parking").unwrap(), "Fruitvale");
    }

    #[test]
    fn exact_token_has_distance_zero() {
        let m = matcher().with_aliases(vec![]);
        assert_eq!(m.match_station("macarthur parking cost").unwrap(), "MacArthur");
    }

    #[test]
    fn fuzzy_tolerates_misspelling() {
        let m = matcher().with_aliases(vec![]);
        assert_eq!(m.match_station("is there parking at fruitvalle").unwrap(), "Fruitvale");
    }

    #[test]
    fn short_tokens_are_skipped() {
        let m = matcher().with_aliases(vec![]);
        // "oak" is only 3 characters, so the fuzzy pass never sees it
        assert_eq!(m.match_station("oak lot"), Err(NluError::NoConfidentMatch));
    }

    #[test]
    fn unrelated_query_is_rejected() {
        let m = matcher();
        assert_eq!(
            m.match_station("tell me a joke about penguins"),
            Err(NluError::NoConfidentMatch)
        );
    }

    #[test]
    fn tie_keeps_first_station() {
        let m = StationMatcher::new(vec!["Abcd".to_string(), "Abce".to_string()])
            .with_aliases(vec![]);
        // "abcf" is distance 1 from both canonical names
        assert_eq!(m.match_station("near abcf station").unwrap(), "Abcd");
    }
}
