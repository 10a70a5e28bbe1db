//! Cubic voxel grids and the operations that paint structures onto them.
//!
//! A grid of edge `n` covers a cube of edge `span` Angstroms centred on the
//! origin. Cells are stored x-major, then y, then z, so the z index varies
//! fastest in memory. Every operation in the submodules writes into a
//! caller-owned [`Grid`] in place.

pub mod discretize;
pub mod electrostatics;
pub mod surface;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum GridError {
    #[error("Grid size must be a positive even number, got {0}")]
    InvalidSize(usize),
    #[error("Grid span must be a positive, finite length in Angstroms, got {0}")]
    InvalidSpan(f64),
    #[error("Failed to allocate a grid buffer of {cells} cells")]
    Allocation { cells: usize },
    #[error("Grid geometries do not match: {left} vs {right}")]
    GeometryMismatch { left: String, right: String },
}

/// The edge length and physical span shared by every grid of one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    size: usize,
    span: f64,
}

impl GridGeometry {
    /// Creates a geometry for an `size`-cell cube covering `span` Angstroms.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidSize`] for a zero or odd `size` and
    /// [`GridError::InvalidSpan`] for a non-positive or non-finite `span`.
    pub fn new(size: usize, span: f64) -> Result<Self, GridError> {
        if size == 0 || size % 2 != 0 {
            return Err(GridError::InvalidSize(size));
        }
        if !span.is_finite() || span <= 0.0 {
            return Err(GridError::InvalidSpan(span));
        }
        Ok(Self { size, span })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn span(&self) -> f64 {
        self.span
    }

    /// Edge length of one voxel in Angstroms.
    pub fn cell_span(&self) -> f64 {
        self.span / self.size as f64
    }

    /// Total number of cells, `size^3`.
    pub fn len(&self) -> usize {
        self.size * self.size * self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Maps a coordinate along one axis to its grid ordinate.
    ///
    /// The result may fall outside `0..size`; callers clamp or skip.
    pub fn ordinate(&self, coordinate: f64) -> i64 {
        let half = (self.size / 2) as i64;
        let ord = (coordinate / self.cell_span()) as i64 + half;
        if coordinate < 0.0 { ord - 1 } else { ord }
    }

    /// Returns the coordinate of the centre of ordinate `i` along one axis.
    pub fn centre(&self, i: usize) -> f64 {
        (i as f64 + 0.5 - (self.size / 2) as f64) * self.cell_span()
    }

    /// Flattens `(x, y, z)` into a buffer index.
    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (x * self.size + y) * self.size + z
    }

    /// Returns `Some(ordinate)` when the ordinate lies inside the grid.
    pub fn checked_ordinate(&self, coordinate: f64) -> Option<usize> {
        let ord = self.ordinate(coordinate);
        (0..self.size as i64).contains(&ord).then_some(ord as usize)
    }
}

impl std::fmt::Display for GridGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}^3 cells over {:.3} A", self.size, self.span)
    }
}

/// A dense cubic buffer of real values.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    geometry: GridGeometry,
    data: Vec<f64>,
}

impl Grid {
    /// Allocates a zero-filled grid.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::Allocation`] if the buffer cannot be reserved.
    pub fn new(geometry: GridGeometry) -> Result<Self, GridError> {
        let cells = geometry.len();
        let mut data = Vec::new();
        data.try_reserve_exact(cells)
            .map_err(|_| GridError::Allocation { cells })?;
        data.resize(cells, 0.0);
        Ok(Self { geometry, data })
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> f64 {
        self.data[self.geometry.index(x, y, z)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: f64) {
        let i = self.geometry.index(x, y, z);
        self.data[i] = value;
    }

    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    /// Counts cells holding exactly `value`.
    pub fn count_equal(&self, value: f64) -> usize {
        self.data.iter().filter(|&&v| v == value).count()
    }

    pub(crate) fn ensure_same_geometry(&self, other: &Grid) -> Result<(), GridError> {
        if self.geometry == other.geometry {
            Ok(())
        } else {
            Err(GridError::GeometryMismatch {
                left: self.geometry.to_string(),
                right: other.geometry.to_string(),
            })
        }
    }
}
