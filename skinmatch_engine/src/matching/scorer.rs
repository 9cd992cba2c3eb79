use chrono::{DateTime, Utc};

use crate::{
    db_types::{Product, Retailer},
    ingredients::IngredientNormalizer,
};

/// Per-term caps. The four terms are additive; each is capped independently.
const POSITION_CAP: f64 = 50.0;
const FRESHNESS_CAP: f64 = 20.0;
const PRICE_EFFICIENCY_CAP: f64 = 20.0;

/// Freshness decays linearly from the cap to zero over this many days since `last_seen`.
const FRESHNESS_WINDOW_DAYS: f64 = 30.0;

/// Reputation for retailers not in the static table.
const DEFAULT_REPUTATION: f64 = 5.0;

/// Computes the relevance score for a product against the normalized required tokens.
///
/// Deterministic and pure: `now` is an explicit argument so freshness does not depend on the
/// wall clock at call time. The result is rounded to two decimal places; ties are broken later
/// by the stable re-sort of the result set.
pub fn score(product: &Product, required: &[String], normalizer: &IngredientNormalizer, now: DateTime<Utc>) -> f64 {
    let total = position_term(product, required, normalizer)
        + freshness_term(product, now)
        + price_efficiency_term(product)
        + reputation_term(&product.retailer);
    (total * 100.0).round() / 100.0
}

/// Ingredient-position term. For each required token, the first alias match in the *ordered*
/// ingredient sequence that is not "water" earns `max(0, 10 − index) × 5`; earlier positions mean
/// proportionally larger concentration by INCI convention. Tokens with no match contribute
/// nothing.
fn position_term(product: &Product, required: &[String], normalizer: &IngredientNormalizer) -> f64 {
    let mut term = 0.0;
    for token in required {
        let aliases = normalizer.table().expand(token);
        for (index, ingredient) in product.ingredients_norm.iter().enumerate() {
            if ingredient == "water" || !aliases.contains(ingredient) {
                continue;
            }
            let position_score = (10.0 - index as f64).max(0.0) * 5.0;
            term += position_score;
            break;
        }
    }
    term.min(POSITION_CAP)
}

/// Linear decay from the cap (just seen) to zero at 30+ days since `last_seen`.
fn freshness_term(product: &Product, now: DateTime<Utc>) -> f64 {
    let age = now - product.last_seen;
    let days_old = age.num_seconds().max(0) as f64 / 86_400.0;
    (FRESHNESS_CAP - days_old / FRESHNESS_WINDOW_DAYS * FRESHNESS_CAP).clamp(0.0, FRESHNESS_CAP)
}

/// Inversely proportional to price-per-unit-volume when known; unknown contributes nothing.
fn price_efficiency_term(product: &Product) -> f64 {
    match product.price_per_ml {
        Some(ppu) if ppu > 0.0 => (100.0 / ppu).min(PRICE_EFFICIENCY_CAP),
        _ => 0.0,
    }
}

/// Fixed per-retailer reputation constants (cap 10 by construction).
fn reputation_term(retailer: &Retailer) -> f64 {
    match retailer {
        Retailer::Boots => 10.0,
        Retailer::Amazon => 8.0,
        Retailer::Superdrug => 7.0,
        Retailer::LookFantastic => 6.0,
        Retailer::Other(_) => DEFAULT_REPUTATION,
    }
}
