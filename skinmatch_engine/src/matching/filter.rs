use std::collections::HashSet;

use crate::{db_types::Product, ingredients::IngredientNormalizer};

/// Upper bound on candidates entering the scoring/verification pipeline, to bound downstream
/// cost. The SQL pre-filter handles country and price; this policy check handles ingredients.
pub const CANDIDATE_CAP: usize = 200;

/// The product's ingredient tokens expanded to their full alias closures. Computed once per
/// product and reused for both the required and the avoided checks.
pub fn product_search_terms(product: &Product, normalizer: &IngredientNormalizer) -> HashSet<String> {
    let mut terms = HashSet::new();
    for token in product.ingredient_set() {
        terms.extend(normalizer.table().expand(token));
    }
    terms
}

/// True if every required token matches the product via at least one of its aliases
/// (logical AND across required ingredients). An empty required list matches everything.
pub fn matches_required(product_terms: &HashSet<String>, required: &[String], normalizer: &IngredientNormalizer) -> bool {
    required.iter().all(|token| {
        normalizer
            .table()
            .expand(token)
            .iter()
            .any(|alias| product_terms.contains(alias))
    })
}

/// True if none of the avoided tokens match the product through any alias
/// (logical AND of "absent"). An empty avoid list always passes.
pub fn matches_avoided(product_terms: &HashSet<String>, avoided: &[String], normalizer: &IngredientNormalizer) -> bool {
    avoided.iter().all(|token| {
        normalizer
            .table()
            .expand(token)
            .iter()
            .all(|alias| !product_terms.contains(alias))
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::fixtures::product_with_ingredients;

    fn normalizer() -> IngredientNormalizer {
        IngredientNormalizer::default()
    }

    fn terms_for(ingredients: &[&str]) -> HashSet<String> {
        let n = normalizer();
        let product = product_with_ingredients("boots", "sku-1", ingredients);
        product_search_terms(&product, &n)
    }

    #[test]
    fn required_matches_directly() {
        let n = normalizer();
        let terms = terms_for(&["aqua", "niacinamide", "glycerin"]);
        assert!(matches_required(&terms, &["niacinamide".to_string()], &n));
    }

    #[test]
    fn required_matches_through_alias() {
        let n = normalizer();
        // Product declares nicotinamide; the buyer asked for niacinamide.
        let terms = terms_for(&["aqua", "nicotinamide"]);
        assert!(matches_required(&terms, &["niacinamide".to_string()], &n));
    }

    #[test]
    fn all_required_tokens_must_match() {
        let n = normalizer();
        let terms = terms_for(&["aqua", "niacinamide"]);
        let required = vec!["niacinamide".to_string(), "hyaluronic acid".to_string()];
        assert!(!matches_required(&terms, &required, &n));
    }

    #[test]
    fn avoided_ingredient_excludes_through_alias() {
        let n = normalizer();
        // Product contains methylparaben; the buyer avoids "preservative", which methylparaben
        // aliases to.
        let terms = terms_for(&["aqua", "methylparaben"]);
        assert!(!matches_avoided(&terms, &["preservative".to_string()], &n));
    }

    #[test]
    fn empty_lists_are_permissive() {
        let n = normalizer();
        let terms = terms_for(&["aqua"]);
        assert!(matches_required(&terms, &[], &n));
        assert!(matches_avoided(&terms, &[], &n));
    }

    #[test]
    fn filter_policy_is_superset_and_disjoint() {
        // Randomized-ish sweep: for a spread of ingredient lists, a product passes iff its
        // expanded term set covers every required token's closure and misses every avoided one.
        let n = normalizer();
        let catalog: Vec<Vec<&str>> = vec![
            vec!["aqua", "niacinamide", "glycerin"],
            vec!["aqua", "retinol", "dimethicone"],
            vec!["water", "vitamin b3", "fragrance"],
            vec!["aqua", "salicylic acid", "phenoxyethanol"],
            vec!["snail mucin", "aqua"],
        ];
        let required = vec!["niacinamide".to_string()];
        let avoided = vec!["fragrance".to_string()];
        let passing: Vec<usize> = catalog
            .iter()
            .enumerate()
            .filter(|(_, ingredients)| {
                let terms = terms_for(ingredients);
                matches_required(&terms, &required, &n) && matches_avoided(&terms, &avoided, &n)
            })
            .map(|(i, _)| i)
            .collect();
        // Index 0 has niacinamide directly; index 2 has it via the vitamin b3 alias but also
        // carries fragrance; the rest lack the required token.
        assert_eq!(passing, vec![0]);
    }
}
