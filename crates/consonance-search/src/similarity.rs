/// Cosine similarity from a precomputed dot product and the two norms.
///
/// Returns exactly 0.0 when either norm is zero (or not finite) and clamps
/// into `[-1, 1]` so rounding can never push a score out of range.
pub(crate) fn cosine(dot: f64, norm_a: f64, norm_b: f64) -> f64 {
    let denom = norm_a * norm_b;
    if denom == 0.0 || !denom.is_finite() {
        return 0.0;
    }
    (dot / denom).clamp(-1.0, 1.0)
}

/// L2 norm of a vector.
pub(crate) fn l2_norm(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum::<f64>().sqrt()
}
