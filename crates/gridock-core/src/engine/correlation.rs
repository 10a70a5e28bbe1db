use super::error::EngineError;
use super::selection::{Candidate, Displacement, TopScores};
use super::transform::{Spectrum, TransformPlan};
use crate::core::grid::Grid;
use rustfft::num_complex::Complex;
use tracing::debug;

/// Above this the electrostatic ratio is not recorded.
const ELEC_RATIO_CUTOFF: f64 = 0.1;

/// Scores every translation of a mobile partner against a fixed static one.
///
/// The static potentials are transformed once, in [`CorrelationEngine::new`].
/// Each call to [`CorrelationEngine::score`] transforms the mobile grids,
/// multiplies by the conjugate, transforms back and keeps the best cells.
/// All buffers are allocated up front and reused.
pub struct CorrelationEngine {
    plan: TransformPlan,
    static_shape: Spectrum,
    static_elec: Option<Spectrum>,
    mobile_shape: Spectrum,
    mobile_elec: Spectrum,
    shape_result: Grid,
    elec_result: Grid,
}

impl CorrelationEngine {
    /// Builds the transform plans and transforms the static potentials.
    ///
    /// Passing `static_elec` enables the electrostatic filter for every
    /// subsequent call to [`score`](Self::score).
    ///
    /// # Errors
    ///
    /// Fails on allocation, geometry mismatch or transform errors.
    pub fn new(static_shape: &Grid, static_elec: Option<&Grid>) -> Result<Self, EngineError> {
        let geometry = *static_shape.geometry();
        let mut plan = TransformPlan::new(geometry.size());

        let mut shape_spectrum = plan.allocate_spectrum()?;
        plan.forward(static_shape, &mut shape_spectrum)?;

        let elec_spectrum = match static_elec {
            Some(field) => {
                static_shape.ensure_same_geometry(field)?;
                let mut spectrum = plan.allocate_spectrum()?;
                plan.forward(field, &mut spectrum)?;
                Some(spectrum)
            }
            None => None,
        };
        debug!(%geometry, electrostatics = elec_spectrum.is_some(), "Static grids transformed.");

        Ok(Self {
            mobile_shape: plan.allocate_spectrum()?,
            mobile_elec: plan.allocate_spectrum()?,
            shape_result: Grid::new(geometry)?,
            elec_result: Grid::new(geometry)?,
            plan,
            static_shape: shape_spectrum,
            static_elec: elec_spectrum,
        })
    }

    pub fn electrostatics(&self) -> bool {
        self.static_elec.is_some()
    }

    /// Correlates the mobile grids against the static ones and returns the
    /// `keep` best translations.
    ///
    /// # Errors
    ///
    /// Fails if a mobile grid does not match the static geometry, if the
    /// electrostatic grid is missing while the filter is enabled, or if a
    /// transform fails.
    pub fn score(
        &mut self,
        mobile_shape: &Grid,
        mobile_elec: Option<&Grid>,
        keep: usize,
    ) -> Result<TopScores, EngineError> {
        self.shape_result.ensure_same_geometry(mobile_shape)?;
        self.plan.forward(mobile_shape, &mut self.mobile_shape)?;
        conjugate_product(&self.static_shape, &mut self.mobile_shape);
        self.plan
            .inverse(&mut self.mobile_shape, &mut self.shape_result)?;

        if let Some(static_elec) = &self.static_elec {
            let field = mobile_elec.ok_or_else(|| {
                EngineError::Transform("electrostatic grid missing for the mobile partner".into())
            })?;
            self.elec_result.ensure_same_geometry(field)?;
            self.plan.forward(field, &mut self.mobile_elec)?;
            conjugate_product(static_elec, &mut self.mobile_elec);
            self.plan
                .inverse(&mut self.mobile_elec, &mut self.elec_result)?;
        }

        Ok(self.select(keep))
    }

    fn select(&self, keep: usize) -> TopScores {
        let n = self.shape_result.geometry().size();
        let cells = self.shape_result.geometry().len() as f64;
        let shape = self.shape_result.data();
        let elec = self.elec_result.data();
        let electrostatics = self.electrostatics();

        let mut top = TopScores::new(keep);
        let Some(mut threshold) = top.threshold() else {
            return top;
        };

        let mut i = 0;
        for x in 0..n {
            for y in 0..n {
                for z in 0..n {
                    let index = i;
                    i += 1;

                    let elec_value = if electrostatics {
                        let value = elec[index] / cells;
                        if value >= 0.0 {
                            continue;
                        }
                        value
                    } else {
                        0.0
                    };

                    let score = (shape[index] / cells) as i32;
                    if score <= threshold {
                        continue;
                    }
                    let ratio = if electrostatics && elec_value < ELEC_RATIO_CUTOFF {
                        elec_value
                    } else {
                        0.0
                    };
                    top.offer(Candidate {
                        score,
                        elec: ratio,
                        displacement: Displacement::from_wrapped(x, y, z, n),
                    });
                    threshold = top.threshold().unwrap_or(threshold);
                }
            }
        }
        top
    }
}

/// `mobile <- static * conj(mobile)`, cell by cell.
fn conjugate_product(static_spectrum: &Spectrum, mobile: &mut Spectrum) {
    for (m, s) in mobile.data_mut().iter_mut().zip(static_spectrum.data()) {
        *m = Complex::new(s.re * m.re + s.im * m.im, s.im * m.re - s.re * m.im);
    }
}
