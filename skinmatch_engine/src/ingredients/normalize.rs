use std::collections::HashSet;

use log::trace;
use strsim::normalized_levenshtein;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use super::AliasTable;

/// Minimum similarity (0–100 scale) for a fuzzy match to be accepted. Below this, the cleaned
/// input is kept verbatim as an unknown ingredient. Tunable via
/// [`IngredientNormalizer::with_threshold`]; changing it materially shifts matching
/// recall/precision.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 88.0;

/// Canonicalizes free-text ingredient names against the alias table, with a fuzzy fallback for
/// misspellings.
#[derive(Debug, Clone)]
pub struct IngredientNormalizer {
    table: AliasTable,
    threshold: f64,
}

impl Default for IngredientNormalizer {
    fn default() -> Self {
        Self::new(AliasTable::load())
    }
}

impl IngredientNormalizer {
    pub fn new(table: AliasTable) -> Self {
        Self { table, threshold: DEFAULT_FUZZY_THRESHOLD }
    }

    pub fn with_threshold(table: AliasTable, threshold: f64) -> Self {
        Self { table, threshold }
    }

    pub fn table(&self) -> &AliasTable {
        &self.table
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Normalizes a single ingredient term. Returns an empty string for blank input.
    ///
    /// Exact alias-table hits are returned as-is; otherwise the best fuzzy match over all known
    /// tokens is accepted if it clears the threshold, resolving aliases to their canonical token.
    /// Anything else passes through cleaned but unchanged.
    pub fn normalize_term(&self, raw: &str) -> String {
        let cleaned = clean(raw);
        if cleaned.is_empty() {
            return cleaned;
        }
        if self.table.is_known(&cleaned) {
            return self.table.canonical_for(&cleaned);
        }
        if let Some(matched) = self.best_fuzzy_match(&cleaned) {
            trace!("🧪 Fuzzy-matched ingredient '{cleaned}' to '{matched}'");
            return self.table.canonical_for(&matched);
        }
        cleaned
    }

    /// Normalizes a list of ingredient terms, preserving order and dropping blanks and
    /// duplicates.
    pub fn normalize_list<I, S>(&self, raw: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for term in raw {
            let normalized = self.normalize_term(term.as_ref());
            if normalized.is_empty() {
                continue;
            }
            if seen.insert(normalized.clone()) {
                out.push(normalized);
            }
        }
        out
    }

    /// Normalizes a single comma/semicolon-separated ingredient string, e.g. a raw INCI
    /// declaration scraped from a product page.
    pub fn normalize_split(&self, raw: &str) -> Vec<String> {
        self.normalize_list(raw.split([',', ';']))
    }

    /// Expands normalized tokens into the union of their alias closures, for searching and
    /// membership tests. Every known alias is included bidirectionally.
    pub fn expand_search_terms(&self, tokens: &[String]) -> HashSet<String> {
        let mut out = HashSet::new();
        for token in tokens {
            out.extend(self.table.expand(token));
        }
        out
    }

    fn best_fuzzy_match(&self, cleaned: &str) -> Option<String> {
        let mut best: Option<(f64, &str)> = None;
        for known in self.table.known_terms() {
            let similarity = normalized_levenshtein(cleaned, known) * 100.0;
            if similarity < self.threshold {
                continue;
            }
            match best {
                Some((score, _)) if score >= similarity => {},
                _ => best = Some((similarity, known)),
            }
        }
        best.map(|(_, term)| term.to_string())
    }
}

/// Lowercases, strips diacritics (NFD + combining-mark removal) and punctuation except hyphen and
/// space, and collapses runs of whitespace.
fn clean(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let stripped: String = lowered
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '_')
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod test {
    use super::*;

    fn normalizer() -> IngredientNormalizer {
        IngredientNormalizer::default()
    }

    #[test]
    fn cleaning_strips_punctuation_and_diacritics() {
        assert_eq!(clean("  Aqua (Water)  "), "aqua water");
        assert_eq!(clean("Rosé extract"), "rose extract");
        assert_eq!(clean("alpha-tocopherol"), "alpha-tocopherol");
    }

    #[test]
    fn exact_alias_hits_resolve_to_canonical() {
        let n = normalizer();
        assert_eq!(n.normalize_term("Niacinamide"), "niacinamide");
        assert_eq!(n.normalize_term("ZnO"), "zinc oxide");
        assert_eq!(n.normalize_term("Sodium Hyaluronate"), "sodium hyaluronate");
    }

    #[test]
    fn fuzzy_match_catches_misspellings() {
        let n = normalizer();
        assert_eq!(n.normalize_term("niacinamid"), "niacinamide");
        assert_eq!(n.normalize_term("hyaluronic acd"), "hyaluronic acid");
    }

    #[test]
    fn below_threshold_passes_through_cleaned() {
        let n = normalizer();
        assert_eq!(n.normalize_term("Snail Mucin!"), "snail mucin");
    }

    #[test]
    fn normalization_is_idempotent() {
        let n = normalizer();
        for raw in ["Niacinamide", "hyaluronic acd", "Snail Mucin", "Rosé extract", "vitamin b3"] {
            let once = n.normalize_term(raw);
            assert_eq!(n.normalize_term(&once), once, "not idempotent for {raw}");
        }
    }

    #[test]
    fn blank_input_yields_empty() {
        let n = normalizer();
        assert_eq!(n.normalize_term("   "), "");
        assert!(n.normalize_list(["", "  ", "\t"]).is_empty());
    }

    #[test]
    fn list_normalization_preserves_order_and_dedupes() {
        let n = normalizer();
        let tokens = n.normalize_list(["Aqua", "Niacinamide", "aqua", "Glycerin"]);
        assert_eq!(tokens, vec!["aqua", "niacinamide", "glycerin"]);
    }

    #[test]
    fn split_normalization_handles_raw_inci_strings() {
        let n = normalizer();
        let tokens = n.normalize_split("Aqua, Glycerin; Niacinamide, Phenoxyethanol");
        assert_eq!(tokens, vec!["aqua", "glycerin", "niacinamide", "phenoxyethanol"]);
    }

    #[test]
    fn alias_closure_includes_canonical_form() {
        let n = normalizer();
        let expanded = n.expand_search_terms(&["nicotinamide".to_string()]);
        assert!(expanded.contains("niacinamide"));
        assert!(expanded.contains("vitamin b3"));
    }

    #[test]
    fn expansion_is_bidirectional_after_load() {
        // The authored table lists "zno" only as an alias of "zinc oxide"; symmetrization at load
        // means expanding "zno" still reaches the canonical token and vice versa.
        let n = normalizer();
        let from_alias = n.expand_search_terms(&["zno".to_string()]);
        assert!(from_alias.contains("zinc oxide"));
        let from_canonical = n.expand_search_terms(&["zinc oxide".to_string()]);
        assert!(from_canonical.contains("zno"));
    }

    #[test]
    fn custom_threshold_is_honoured() {
        let strict = IngredientNormalizer::with_threshold(AliasTable::load(), 99.0);
        // One edit away from "niacinamide" is ~91 similarity; a 99 threshold rejects it.
        assert_eq!(strict.normalize_term("niacinamid"), "niacinamid");
    }
}
