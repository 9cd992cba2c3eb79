use std::collections::{HashMap, HashSet};

/// Curated INCI alias entries for common skincare actives, as authored: canonical token →
/// alternate spellings/synonyms. The authored graph is not symmetric; [`AliasTable::load`]
/// symmetrizes it so lookups work in both directions.
fn inci_aliases() -> Vec<(&'static str, &'static [&'static str])> {
    vec![
        // Niacinamide
        ("niacinamide", &["nicotinamide", "vitamin b3", "vitamin b-3"][..]),
        ("nicotinamide", &["niacinamide", "vitamin b3", "vitamin b-3"]),
        // Salicylic acid
        ("salicylic acid", &["bha", "beta hydroxy acid", "2-hydroxybenzoic acid"]),
        ("bha", &["salicylic acid", "beta hydroxy acid"]),
        // Vitamin C
        ("ascorbic acid", &["vitamin c", "l-ascorbic acid", "magnesium ascorbyl phosphate", "sodium ascorbyl phosphate"]),
        ("vitamin c", &["ascorbic acid", "l-ascorbic acid"]),
        ("l-ascorbic acid", &["ascorbic acid", "vitamin c"]),
        ("magnesium ascorbyl phosphate", &["vitamin c", "ascorbic acid", "map"]),
        ("sodium ascorbyl phosphate", &["vitamin c", "ascorbic acid", "sap"]),
        // Retinoids
        ("retinol", &["vitamin a", "retinyl palmitate", "retinyl acetate"]),
        ("retinyl palmitate", &["retinol", "vitamin a"]),
        ("retinyl acetate", &["retinol", "vitamin a"]),
        ("tretinoin", &["retinoic acid", "all-trans retinoic acid"]),
        ("adapalene", &["differin"]),
        // Alpha hydroxy acids
        ("glycolic acid", &["aha", "alpha hydroxy acid", "hydroxyacetic acid"]),
        ("lactic acid", &["aha", "alpha hydroxy acid", "2-hydroxypropanoic acid"]),
        ("mandelic acid", &["aha", "alpha hydroxy acid"]),
        ("aha", &["glycolic acid", "lactic acid", "alpha hydroxy acid"]),
        // Hyaluronic acid
        ("hyaluronic acid", &["sodium hyaluronate", "ha", "hyaluronan"]),
        ("sodium hyaluronate", &["hyaluronic acid", "ha"]),
        // Ceramides
        ("ceramides", &["ceramide np", "ceramide ap", "ceramide eop", "phytosphingosine"]),
        ("ceramide np", &["ceramides"]),
        ("ceramide ap", &["ceramides"]),
        ("ceramide eop", &["ceramides"]),
        // Azelaic acid
        ("azelaic acid", &["nonanedioic acid"]),
        // Vitamin E
        ("tocopherol", &["vitamin e", "alpha-tocopherol", "tocopheryl acetate"]),
        ("vitamin e", &["tocopherol", "alpha-tocopherol"]),
        ("tocopheryl acetate", &["vitamin e", "tocopherol"]),
        // Peptides
        ("peptides", &["palmitoyl pentapeptide", "acetyl hexapeptide", "copper peptides"]),
        ("palmitoyl pentapeptide", &["peptides", "matrixyl"]),
        ("acetyl hexapeptide", &["peptides", "argireline"]),
        ("copper peptides", &["peptides", "copper tripeptide"]),
        // Sunscreen actives
        ("zinc oxide", &["zno"]),
        // Common bases and preservatives
        ("aqua", &["water"]),
        ("water", &["aqua"]),
        ("dimethicone", &["silicone"]),
        ("cyclomethicone", &["silicone"]),
        ("isopropyl myristate", &["ipm"]),
        ("butylene glycol", &["bg"]),
        ("propylene glycol", &["pg"]),
        ("phenoxyethanol", &["preservative"]),
        ("methylparaben", &["preservative"]),
        ("ethylparaben", &["preservative"]),
        ("sodium benzoate", &["preservative"]),
        ("potassium sorbate", &["preservative"]),
    ]
}

/// The resolved alias graph. Canonical tokens map to their alias sets, and a reverse membership
/// index records, per alias, every canonical token that lists it (in declaration order, so
/// resolution is deterministic).
#[derive(Debug, Clone)]
pub struct AliasTable {
    /// canonical → aliases, as authored
    forward: HashMap<String, Vec<String>>,
    /// alias → canonicals listing it, declaration order
    reverse: HashMap<String, Vec<String>>,
    /// every canonical and alias, for fuzzy candidate enumeration
    known: HashSet<String>,
    /// declaration order of canonical tokens
    order: Vec<String>,
}

impl AliasTable {
    /// Builds the table from the curated entries, symmetrizing as it goes: every alias gains a
    /// reverse edge back to each canonical token that lists it, so expansion works in both
    /// directions regardless of how the source entry was authored.
    pub fn load() -> Self {
        let mut forward: HashMap<String, Vec<String>> = HashMap::new();
        let mut reverse: HashMap<String, Vec<String>> = HashMap::new();
        let mut known = HashSet::new();
        let mut order = Vec::new();
        for (canonical, aliases) in inci_aliases() {
            let canonical = canonical.to_string();
            known.insert(canonical.clone());
            order.push(canonical.clone());
            let list = forward.entry(canonical.clone()).or_default();
            for alias in aliases {
                let alias = alias.to_string();
                known.insert(alias.clone());
                reverse.entry(alias.clone()).or_default().push(canonical.clone());
                list.push(alias);
            }
        }
        Self { forward, reverse, known, order }
    }

    /// True if `term` is a canonical token.
    pub fn is_canonical(&self, term: &str) -> bool {
        self.forward.contains_key(term)
    }

    /// True if `term` is a canonical token or a listed alias.
    pub fn is_known(&self, term: &str) -> bool {
        self.known.contains(term)
    }

    /// All known tokens (canonicals and aliases).
    pub fn known_terms(&self) -> impl Iterator<Item = &str> {
        self.known.iter().map(String::as_str)
    }

    /// Resolves a known term to its canonical token: canonical tokens resolve to themselves,
    /// aliases to the first canonical (declaration order) that lists them. Unknown terms resolve
    /// to themselves.
    pub fn canonical_for(&self, term: &str) -> String {
        if self.forward.contains_key(term) {
            return term.to_string();
        }
        match self.reverse.get(term).and_then(|canonicals| canonicals.first()) {
            Some(canonical) => canonical.clone(),
            None => term.to_string(),
        }
    }

    /// The full alias closure of `term`: the term itself, its own aliases if canonical, and for
    /// every canonical token that lists it, that token plus all of its aliases.
    pub fn expand(&self, term: &str) -> HashSet<String> {
        let mut out = HashSet::new();
        out.insert(term.to_string());
        if let Some(aliases) = self.forward.get(term) {
            out.extend(aliases.iter().cloned());
        }
        if let Some(canonicals) = self.reverse.get(term) {
            for canonical in canonicals {
                out.insert(canonical.clone());
                if let Some(aliases) = self.forward.get(canonical) {
                    out.extend(aliases.iter().cloned());
                }
            }
        }
        out
    }

    /// Canonical tokens in declaration order.
    pub fn canonical_order(&self) -> &[String] {
        &self.order
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::load()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn canonical_resolves_to_itself() {
        let table = AliasTable::load();
        assert_eq!(table.canonical_for("niacinamide"), "niacinamide");
    }

    #[test]
    fn alias_resolves_to_first_declaring_canonical() {
        let table = AliasTable::load();
        // "vitamin b3" is listed by both niacinamide and nicotinamide; niacinamide is declared
        // first.
        assert_eq!(table.canonical_for("vitamin b3"), "niacinamide");
        assert_eq!(table.canonical_for("zno"), "zinc oxide");
    }

    #[test]
    fn expansion_covers_the_closure() {
        let table = AliasTable::load();
        let expanded = table.expand("hyaluronic acid");
        for term in ["hyaluronic acid", "sodium hyaluronate", "ha", "hyaluronan"] {
            assert!(expanded.contains(term), "missing {term}");
        }
    }

    #[test]
    fn unknown_term_expands_to_itself() {
        let table = AliasTable::load();
        let expanded = table.expand("snail mucin");
        assert_eq!(expanded.len(), 1);
        assert!(expanded.contains("snail mucin"));
    }
}
