//! Reweighting multipliers derived from search statistics.
//!
//! All multipliers are computed in `f64` and only converted to the backend's float
//! element when they are applied to a loss.

use crate::error::{LevinLossError, LevinLossResult};

/// Multiplier of the Levin loss: the search's expansion count.
pub fn levin_multiplier(expanded: f64) -> LevinLossResult<f64> {
    if !expanded.is_finite() || expanded < 0.0 {
        return Err(LevinLossError::numeric_domain("Levin multiplier", expanded));
    }
    Ok(expanded)
}

/// Exponent `a` of the improved Levin loss.
///
/// ```text
/// a = log((d + 1) / expanded) / log(solution_pi)    if solution_pi < 1
/// a = 0                                             otherwise
/// ```
///
/// clamped below at zero. `expanded <= 0` leaves the ratio undefined and yields
/// `a = 0`.
///
/// # Errors
/// `NumericDomain` when `solution_pi` is non-finite or not positive, or when
/// `expanded` is non-finite.
pub fn improved_levin_exponent(
    path_depth: usize,
    solution_pi: f64,
    expanded: f64,
) -> LevinLossResult<f64> {
    if !solution_pi.is_finite() || solution_pi <= 0.0 {
        return Err(LevinLossError::numeric_domain(
            "log(solution_pi)",
            solution_pi,
        ));
    }
    if !expanded.is_finite() {
        return Err(LevinLossError::numeric_domain(
            "log((d + 1) / expanded)",
            expanded,
        ));
    }
    if solution_pi >= 1.0 {
        return Ok(0.0);
    }
    if expanded <= 0.0 {
        tracing::warn!(
            expanded,
            "non-positive expansion count, improved Levin exponent set to zero"
        );
        return Ok(0.0);
    }

    let ratio = (path_depth as f64 + 1.0) / expanded;
    let exponent = ratio.ln() / solution_pi.ln();
    Ok(exponent.max(0.0))
}

/// Multiplier of the improved Levin loss: `expanded * a`.
pub fn improved_levin_multiplier(
    path_depth: usize,
    solution_pi: f64,
    expanded: f64,
) -> LevinLossResult<f64> {
    let exponent = improved_levin_exponent(path_depth, solution_pi, expanded)?;
    if exponent == 0.0 {
        return Ok(0.0);
    }

    let multiplier = expanded * exponent;
    tracing::debug!(
        path_depth,
        solution_pi,
        expanded,
        exponent,
        multiplier,
        "improved Levin multiplier"
    );
    Ok(multiplier)
}
