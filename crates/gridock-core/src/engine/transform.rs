use super::error::EngineError;
use crate::core::grid::{Grid, GridError};
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;
use tracing::debug;

/// Half-complex spectrum of a real cubic grid.
///
/// Layout is `size x size x (size / 2 + 1)`, with the last (z) axis halved,
/// stored x-major like [`Grid`].
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    size: usize,
    data: Vec<Complex<f64>>,
}

impl Spectrum {
    pub fn size(&self) -> usize {
        self.size
    }

    /// Length of the halved z axis.
    pub fn half_len(&self) -> usize {
        self.size / 2 + 1
    }

    pub fn data(&self) -> &[Complex<f64>] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [Complex<f64>] {
        &mut self.data
    }
}

/// Forward and inverse 3D real transforms for one grid size.
///
/// Built once per run and reused for every rotation. Neither direction is
/// normalized, so an inverse after a forward transform scales by `size^3`.
/// The z axis uses real-to-complex transforms; x and y use complex ones.
pub struct TransformPlan {
    size: usize,
    r2c: Arc<dyn RealToComplex<f64>>,
    c2r: Arc<dyn ComplexToReal<f64>>,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    real_line: Vec<f64>,
    half_line: Vec<Complex<f64>>,
    column: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
}

impl TransformPlan {
    pub fn new(size: usize) -> Self {
        let mut real_planner = RealFftPlanner::<f64>::new();
        let r2c = real_planner.plan_fft_forward(size);
        let c2r = real_planner.plan_fft_inverse(size);

        let mut planner = FftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);

        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len())
            .max(r2c.get_scratch_len())
            .max(c2r.get_scratch_len());
        debug!(size, scratch_len, "Built transform plans.");

        Self {
            size,
            r2c,
            c2r,
            forward,
            inverse,
            real_line: vec![0.0; size],
            half_line: vec![Complex::default(); size / 2 + 1],
            column: vec![Complex::default(); size],
            scratch: vec![Complex::default(); scratch_len],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Allocates a zeroed spectrum buffer for this plan's size.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::Allocation`] if the buffer cannot be reserved.
    pub fn allocate_spectrum(&self) -> Result<Spectrum, GridError> {
        let n = self.size;
        let cells = n * n * (n / 2 + 1);
        let mut data = Vec::new();
        data.try_reserve_exact(cells)
            .map_err(|_| GridError::Allocation { cells })?;
        data.resize(cells, Complex::default());
        Ok(Spectrum { size: n, data })
    }

    /// Transforms `grid` into `spectrum`. The grid is left untouched.
    ///
    /// # Errors
    ///
    /// Fails if either buffer does not match the plan's size, or if the
    /// underlying transform reports an error.
    pub fn forward(&mut self, grid: &Grid, spectrum: &mut Spectrum) -> Result<(), EngineError> {
        self.check_sizes(grid, spectrum)?;
        let n = self.size;
        let h = n / 2 + 1;

        let scratch_len = self.r2c.get_scratch_len();
        for line in 0..n * n {
            self.real_line
                .copy_from_slice(&grid.data()[line * n..(line + 1) * n]);
            self.r2c
                .process_with_scratch(
                    &mut self.real_line,
                    &mut spectrum.data[line * h..(line + 1) * h],
                    &mut self.scratch[..scratch_len],
                )
                .map_err(|e| EngineError::Transform(e.to_string()))?;
        }

        self.complex_pass(spectrum, true);
        Ok(())
    }

    /// Transforms `spectrum` back into `grid`.
    ///
    /// The spectrum is used as working space and holds garbage afterwards.
    ///
    /// # Errors
    ///
    /// Fails if either buffer does not match the plan's size, or if the
    /// underlying transform reports an error.
    pub fn inverse(&mut self, spectrum: &mut Spectrum, grid: &mut Grid) -> Result<(), EngineError> {
        self.check_sizes(grid, spectrum)?;
        let n = self.size;
        let h = n / 2 + 1;

        self.complex_pass(spectrum, false);

        let scratch_len = self.c2r.get_scratch_len();
        for line in 0..n * n {
            self.half_line
                .copy_from_slice(&spectrum.data[line * h..(line + 1) * h]);
            // The DC and Nyquist terms of a real signal are real; drop the
            // rounding residue the complex passes leave behind.
            self.half_line[0].im = 0.0;
            self.half_line[h - 1].im = 0.0;
            self.c2r
                .process_with_scratch(
                    &mut self.half_line,
                    &mut grid.data_mut()[line * n..(line + 1) * n],
                    &mut self.scratch[..scratch_len],
                )
                .map_err(|e| EngineError::Transform(e.to_string()))?;
        }
        Ok(())
    }

    // Complex transforms along y, then x.
    fn complex_pass(&mut self, spectrum: &mut Spectrum, forward: bool) {
        let n = self.size;
        let h = n / 2 + 1;
        let fft = if forward {
            Arc::clone(&self.forward)
        } else {
            Arc::clone(&self.inverse)
        };

        for x in 0..n {
            for kz in 0..h {
                let base = x * n * h + kz;
                self.transform_column(&*fft, &mut spectrum.data, base, h);
            }
        }
        for y in 0..n {
            for kz in 0..h {
                let base = y * h + kz;
                self.transform_column(&*fft, &mut spectrum.data, base, n * h);
            }
        }
    }

    fn transform_column(
        &mut self,
        fft: &dyn Fft<f64>,
        data: &mut [Complex<f64>],
        base: usize,
        stride: usize,
    ) {
        for (k, slot) in self.column.iter_mut().enumerate() {
            *slot = data[base + k * stride];
        }
        let scratch_len = fft.get_inplace_scratch_len();
        fft.process_with_scratch(&mut self.column, &mut self.scratch[..scratch_len]);
        for (k, value) in self.column.iter().enumerate() {
            data[base + k * stride] = *value;
        }
    }

    fn check_sizes(&self, grid: &Grid, spectrum: &Spectrum) -> Result<(), EngineError> {
        let grid_size = grid.geometry().size();
        if grid_size != self.size || spectrum.size != self.size {
            return Err(EngineError::Transform(format!(
                "buffer sizes (grid {}, spectrum {}) do not match the plan size {}",
                grid_size, spectrum.size, self.size
            )));
        }
        Ok(())
    }
}
