//! Cosine similarity over embedding vectors.

use ndarray::ArrayView1;

const NORM_EPSILON: f32 = 1e-8;

/// Cosine similarity in [-1, 1]. The epsilon keeps degenerate (near-zero)
/// vectors from producing NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len());

    let a = ArrayView1::from(a);
    let b = ArrayView1::from(b);

    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();
    let dot = a.dot(&b);

    (dot / (norm_a * norm_b + NORM_EPSILON)) as f64
}

/// Cosine distance in [0, 2]: 0 for identical directions, 2 for opposite.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    1.0 - cosine_similarity(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vectors() {
        let v = vec![0.3_f32, -0.4, 0.5];
        assert!(cosine_distance(&v, &v) < 1e-6);
    }

    #[test]
    fn test_orthogonal_vectors() {
        let a = vec![1.0_f32, 0.0];
        let b = vec![0.0_f32, 1.0];
        assert!((cosine_distance(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_opposite_vectors() {
        let a = vec![1.0_f32, 2.0];
        let b = vec![-1.0_f32, -2.0];
        assert!((cosine_distance(&a, &b) - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_zero_vector_is_finite() {
        let a = vec![0.0_f32, 0.0];
        let b = vec![1.0_f32, 1.0];
        assert!(cosine_distance(&a, &b).is_finite());
    }

    #[test]
    fn test_scale_invariance() {
        let a = vec![1.0_f32, 2.0, 3.0];
        let b: Vec<f32> = a.iter().map(|x| x * 40.0).collect();
        assert!(cosine_distance(&a, &b) < 1e-5);
    }
}
