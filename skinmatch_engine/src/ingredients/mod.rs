//! # Ingredient normalization
//!
//! Canonicalizes free-text ingredient names into stable INCI tokens and expands tokens into their
//! full alias sets for matching.
//!
//! The pipeline is: clean (lowercase, strip diacritics and punctuation, collapse whitespace) →
//! exact alias-table lookup → fuzzy fallback against every known token → pass the cleaned string
//! through unchanged when nothing clears the similarity threshold. Unknown ingredients remain
//! usable for exact-string matching against other unknowns.
mod aliases;
mod normalize;

pub use aliases::AliasTable;
pub use normalize::{IngredientNormalizer, DEFAULT_FUZZY_THRESHOLD};
