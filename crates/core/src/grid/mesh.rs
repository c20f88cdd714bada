//! Square coordinate mesh
//!
//! The mesh is the fixed lattice the whole simulation lives on. Cells have unit
//! size, so a particle coordinate is also a (fractional) cell coordinate.
//! Coordinates run `0..size` on both axes; the mesh is not centred.

/// Fixed-size square mesh of unit cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mesh {
    size: usize,
}

impl Mesh {
    /// Create a mesh with `size` cells per axis
    #[must_use]
    pub const fn new(size: usize) -> Self {
        Self { size }
    }

    /// Cells per axis
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Total number of cells
    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.size * self.size
    }

    /// Index of the half-grid point used for kernel mirroring
    #[must_use]
    pub const fn half(&self) -> usize {
        self.size / 2
    }

    /// Squared distance from the mesh origin to cell `(x, y)`
    #[inline]
    #[must_use]
    pub fn squared_radius(&self, x: usize, y: usize) -> f64 {
        debug_assert!(x < self.size && y < self.size, "Cell outside mesh");
        let (fx, fy) = (x as f64, y as f64);
        fx * fx + fy * fy
    }

    /// Wrap an integer cell coordinate onto the mesh
    #[inline]
    #[must_use]
    pub fn wrap_cell(&self, cell: i64) -> usize {
        cell.rem_euclid(self.size as i64) as usize
    }

    /// Wrap a continuous coordinate into `[0, size)`
    ///
    /// `rem_euclid` can round up to exactly `size` for tiny negative inputs,
    /// which is folded back to 0.
    #[inline]
    #[must_use]
    pub fn wrap_coordinate(&self, value: f64) -> f64 {
        let size = self.size as f64;
        let wrapped = value.rem_euclid(size);
        if wrapped >= size {
            0.0
        } else {
            wrapped
        }
    }

    /// Nearest grid point of a continuous coordinate, wrapped onto the mesh
    #[inline]
    #[must_use]
    pub fn nearest_cell(&self, value: f64) -> usize {
        self.wrap_cell(value.round() as i64)
    }

    /// Left and right neighbours of `i` with cyclic wraparound
    #[inline]
    #[must_use]
    pub const fn neighbours(&self, i: usize) -> (usize, usize) {
        let left = if i == 0 { self.size - 1 } else { i - 1 };
        let right = if i + 1 == self.size { 0 } else { i + 1 };
        (left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_cell_rounds_then_wraps() {
        let mesh = Mesh::new(16);
        assert_eq!(mesh.nearest_cell(3.4), 3);
        assert_eq!(mesh.nearest_cell(3.6), 4);
        assert_eq!(mesh.nearest_cell(15.7), 0);
        assert_eq!(mesh.nearest_cell(-0.7), 15);
        assert_eq!(mesh.nearest_cell(33.0), 1);
    }

    #[test]
    fn test_wrap_coordinate_stays_in_range() {
        let mesh = Mesh::new(8);
        assert_eq!(mesh.wrap_coordinate(9.5), 1.5);
        assert_eq!(mesh.wrap_coordinate(-0.5), 7.5);
        let tiny = mesh.wrap_coordinate(-1e-18);
        assert!((0.0..8.0).contains(&tiny));
    }

    #[test]
    fn test_neighbours_wrap() {
        let mesh = Mesh::new(4);
        assert_eq!(mesh.neighbours(0), (3, 1));
        assert_eq!(mesh.neighbours(3), (2, 0));
        assert_eq!(mesh.half(), 2);
        assert_eq!(mesh.cell_count(), 16);
        assert_eq!(mesh.squared_radius(3, 4), 25.0);
    }
}
