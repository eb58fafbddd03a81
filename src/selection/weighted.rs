//! Weighted outcome selection.

use thiserror::Error;

use super::random::RandomSource;

/// Errors from [`select`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectionError {
    /// Empty set, or a weight that is not a positive finite number.
    #[error("invalid choice set: {0}")]
    InvalidChoiceSet(String),
}

/// Pick one outcome with probability proportional to its weight.
///
/// A single-element set returns that outcome without drawing.
pub fn select<'a, T>(
    choices: &'a [(T, f64)],
    rng: &mut dyn RandomSource,
) -> Result<&'a T, SelectionError> {
    if choices.is_empty() {
        return Err(SelectionError::InvalidChoiceSet("no choices".to_string()));
    }
    if let Some(pos) = choices
        .iter()
        .position(|(_, w)| !(w.is_finite() && *w > 0.0))
    {
        return Err(SelectionError::InvalidChoiceSet(format!(
            "weight {} at position {} is not positive",
            choices[pos].1, pos
        )));
    }

    if let [(only, _)] = choices {
        return Ok(only);
    }

    let total: f64 = choices.iter().map(|(_, w)| w).sum();
    let draw = rng.uniform() * total;

    let mut cumulative = 0.0;
    for (outcome, weight) in choices {
        cumulative += weight;
        if cumulative > draw {
            return Ok(outcome);
        }
    }

    // Floating point rounding can leave the draw just past the last bound
    Ok(&choices[choices.len() - 1].0)
}
