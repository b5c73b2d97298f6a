//! Index parsing for model routing responses
//!
//! The model is instructed to answer with a single number or multiple
//! numbers separated by commas. Parsing is all-or-nothing: either every
//! token is a valid in-range index or the whole response is rejected.

use std::collections::BTreeSet;

use crate::errors::{ParseReason, Result, RouterError};

/// Parse filtered response text into a set of unique 1-based indices
///
/// Splits on commas, trims each token, and discards tokens left empty
/// by trailing commas or stray whitespace. A response with no surviving
/// tokens is a parse failure, not an empty selection. Duplicate indices
/// collapse into one.
pub(crate) fn parse_selection(text: &str, max: usize) -> Result<BTreeSet<usize>> {
    let mut selection = BTreeSet::new();

    for token in text.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let index: usize = token.parse().map_err(|_| RouterError::Parse {
            response: text.to_string(),
            reason: ParseReason::NotANumber {
                token: token.to_string(),
            },
        })?;

        if index < 1 || index > max {
            return Err(RouterError::Parse {
                response: text.to_string(),
                reason: ParseReason::OutOfRange { index, max },
            });
        }

        selection.insert(index);
    }

    if selection.is_empty() {
        return Err(RouterError::Parse {
            response: text.to_string(),
            reason: ParseReason::Empty,
        });
    }

    Ok(selection)
}
