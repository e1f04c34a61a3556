//! Dense vector math shared by the vector index and the diversifier.
//!
//! All reductions sum left to right so repeated calls on identical inputs give
//! bit-identical results.

use crate::{Error, Result};

/// Dot product of two equal-length vectors.
///
/// Extra trailing components of the longer vector are ignored; callers that
/// need a length check use [`check_dimensions`] first.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Euclidean norm.
pub fn l2_norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}

/// Scale `v` to unit length. A zero (or non-finite norm) vector is returned
/// as all zeros, so it is orthogonal to everything.
pub fn normalize(v: &[f32]) -> Vec<f32> {
    let norm = l2_norm(v);
    if norm <= f32::EPSILON || !norm.is_finite() {
        return vec![0.0; v.len()];
    }
    v.iter().map(|x| x / norm).collect()
}

/// Cosine similarity; 0.0 when either vector has zero length.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    check_dimensions(a, b)?;
    let denom = l2_norm(a) * l2_norm(b);
    if denom <= f32::EPSILON {
        return Ok(0.0);
    }
    Ok(dot(a, b) / denom)
}

/// Reject empty or mismatched vectors.
pub fn check_dimensions(a: &[f32], b: &[f32]) -> Result<()> {
    if a.is_empty() || b.is_empty() {
        return Err(Error::invalid_data("Vectors must not be empty"));
    }
    if a.len() != b.len() {
        return Err(Error::invalid_data(format!(
            "Vector length mismatch: {} != {}",
            a.len(),
            b.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(left: f32, right: f32) -> bool {
        (left - right).abs() < 1e-5
    }

    #[test]
    fn cosine_is_one_for_identical_vectors() {
        let v = vec![1.0, 2.0, 3.0, 4.0];
        assert!(approx_eq(cosine_similarity(&v, &v).unwrap(), 1.0));
    }

    #[test]
    fn cosine_is_zero_for_orthogonal_vectors() {
        assert!(approx_eq(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap(), 0.0));
    }

    #[test]
    fn cosine_is_zero_for_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).unwrap(), 0.0);
    }

    #[test]
    fn cosine_rejects_mismatch() {
        let err = cosine_similarity(&[1.0], &[1.0, 0.0]).unwrap_err();
        assert!(err.to_string().contains("mismatch"));
        assert!(cosine_similarity(&[], &[]).is_err());
    }

    #[test]
    fn normalize_gives_unit_length() {
        let n = normalize(&[3.0, 4.0]);
        assert!(approx_eq(n[0], 0.6));
        assert!(approx_eq(n[1], 0.8));
        assert!(approx_eq(l2_norm(&n), 1.0));
    }

    #[test]
    fn normalize_zero_vector_stays_zero() {
        assert_eq!(normalize(&[0.0, 0.0, 0.0]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn dot_is_deterministic() {
        let a: Vec<f32> = (0..64).map(|i| (i as f32).sin()).collect();
        let b: Vec<f32> = (0..64).map(|i| (i as f32).cos()).collect();
        assert_eq!(dot(&a, &b).to_bits(), dot(&a, &b).to_bits());
    }
}
