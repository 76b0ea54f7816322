//! Field storage for the 1D Yee grid.
//!
//! A [`Field1D`] is a fixed-length, contiguous array of `f64` values, one per
//! cell. It is allocated once at construction and never resized, so the
//! time-stepping loop runs without heap traffic.

/// Scalar field sampled on `len` grid cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Field1D {
    data: Vec<f64>,
}

impl Field1D {
    /// Create a zero-initialized field with `len` cells.
    pub fn new(len: usize) -> Self {
        Self {
            data: vec![0.0; len],
        }
    }

    /// Number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the field has no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value at cell `i`.
    #[inline]
    pub fn get(&self, i: usize) -> f64 {
        self.data[i]
    }

    /// Overwrite the value at cell `i`.
    #[inline]
    pub fn set(&mut self, i: usize, value: f64) {
        self.data[i] = value;
    }

    /// Add `value` to cell `i`.
    #[inline]
    pub fn add(&mut self, i: usize, value: f64) {
        self.data[i] += value;
    }

    /// Set every cell to `value`.
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Zero the field.
    pub fn clear(&mut self) {
        self.fill(0.0);
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Largest absolute value in the field (0 for an empty field).
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0f64, |acc, v| acc.max(v.abs()))
    }

    /// Unweighted energy norm, 0.5 * sum(v^2).
    pub fn energy(&self) -> f64 {
        0.5 * self.data.iter().map(|v| v * v).sum::<f64>()
    }

    /// Energy norm with a per-cell weight, 0.5 * sum(w_i * v_i^2).
    ///
    /// `weights` must have the same length as the field.
    pub fn weighted_energy(&self, weights: &[f64]) -> f64 {
        debug_assert_eq!(weights.len(), self.data.len());
        0.5 * self
            .data
            .iter()
            .zip(weights)
            .map(|(v, w)| w * v * v)
            .sum::<f64>()
    }

    /// True if every value is finite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_access() {
        let mut f = Field1D::new(5);
        assert_eq!(f.len(), 5);
        f.set(2, 3.0);
        f.add(2, 1.5);
        assert_eq!(f.get(2), 4.5);
        assert_eq!(f.max_abs(), 4.5);

        f.clear();
        assert_eq!(f.energy(), 0.0);
    }

    #[test]
    fn test_energy_norms() {
        let mut f = Field1D::new(3);
        f.set(0, 1.0);
        f.set(1, -2.0);
        assert_eq!(f.energy(), 2.5);
        assert_eq!(f.weighted_energy(&[2.0, 1.0, 100.0]), 3.0);
    }

    #[test]
    fn test_non_finite_detection() {
        let mut f = Field1D::new(4);
        assert!(f.is_finite());
        f.set(3, f64::NAN);
        assert!(!f.is_finite());
    }
}
