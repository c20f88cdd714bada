//! Flat 2D scalar fields
//!
//! Every mesh quantity (density, Green's function, potential, force
//! components) is stored as a `FieldData`: a flat `Vec<f64>` in row-major
//! order, indexed `y * width + x`.

use rayon::prelude::*;

/// 2D scalar field stored in row-major order
#[derive(Debug, Clone, PartialEq)]
pub struct FieldData {
    /// Field values in row-major order (y * width + x)
    pub data: Vec<f64>,
    /// Grid width in cells
    pub width: usize,
    /// Grid height in cells
    pub height: usize,
}

impl FieldData {
    /// Create a new field with given dimensions, initialized to zero
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_value(width, height, 0.0)
    }

    /// Create a new field with given dimensions, initialized to a value
    #[must_use]
    pub fn with_value(width: usize, height: usize, value: f64) -> Self {
        Self {
            data: vec![value; width * height],
            width,
            height,
        }
    }

    /// Create a square field of side `size`, initialized to zero
    #[must_use]
    pub fn square(size: usize) -> Self {
        Self::new(size, size)
    }

    /// Wrap existing row-major values
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != width * height`
    #[must_use]
    pub fn from_vec(width: usize, height: usize, data: Vec<f64>) -> Self {
        assert_eq!(data.len(), width * height, "Field data length mismatch");
        Self {
            data,
            width,
            height,
        }
    }

    /// Get reference to field data
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Get mutable reference to field data
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Flat index of `(x, y)`
    #[inline]
    #[must_use]
    pub const fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Get value at grid position
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        assert!(
            x < self.width && y < self.height,
            "Coordinates out of bounds"
        );
        self.data[self.index(x, y)]
    }

    /// Set value at grid position
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    pub fn set(&mut self, x: usize, y: usize, value: f64) {
        assert!(
            x < self.width && y < self.height,
            "Coordinates out of bounds"
        );
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Add to the value at grid position
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    pub fn add(&mut self, x: usize, y: usize, value: f64) {
        assert!(
            x < self.width && y < self.height,
            "Coordinates out of bounds"
        );
        let idx = self.index(x, y);
        self.data[idx] += value;
    }

    /// Sum of all cells
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Sum of the cell-wise product with another field of the same shape
    ///
    /// # Panics
    ///
    /// Panics if the shapes differ
    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        assert_eq!(
            (self.width, self.height),
            (other.width, other.height),
            "Field shapes differ"
        );
        self.data
            .par_iter()
            .zip(other.data.par_iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    /// Largest absolute value, 0 for an empty field
    #[must_use]
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_creation() {
        let field = FieldData::new(10, 20);
        assert_eq!(field.width, 10);
        assert_eq!(field.height, 20);
        assert_eq!(field.data.len(), 200);
        assert!(field.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_field_get_set_add() {
        let mut field = FieldData::square(10);
        field.set(3, 4, 1.5);
        field.add(3, 4, 2.0);
        assert_eq!(field.get(3, 4), 3.5);

        // Verify row-major indexing
        assert_eq!(field.data[4 * 10 + 3], 3.5);
        assert_eq!(field.sum(), 3.5);
    }

    #[test]
    fn test_field_dot_and_max_abs() {
        let a = FieldData::from_vec(2, 2, vec![1.0, -2.0, 3.0, 0.5]);
        let b = FieldData::with_value(2, 2, 2.0);
        assert_eq!(a.dot(&b), 5.0);
        assert_eq!(a.max_abs(), 3.0);
    }

    #[test]
    #[should_panic(expected = "Coordinates out of bounds")]
    fn test_field_bounds_check() {
        let field = FieldData::new(10, 10);
        let _ = field.get(10, 5);
    }
}
