use crate::types::Vector;

/// Checks if a vector is approximately equal to `expected` (length and data
/// within tolerance).
/// Panics if lengths differ or data differs significantly.
pub fn check_vector_near(actual: &Vector, expected: &[f64], tolerance: f64) {
    assert_eq!(actual.len(), expected.len(), "Vector length mismatch");

    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        let diff = (a - e).abs();
        if diff > tolerance {
            panic!(
                "Data mismatch at index {}: actual={:?}, expected={:?}, diff={:?}, tolerance={:?}",
                i, a, e, diff, tolerance
            );
        }
    }
}
