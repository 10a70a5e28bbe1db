use super::{Grid, GridError};
use crate::core::models::structure::Structure;
use nalgebra::Point3;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Distances shorter than this are clamped before the potential is evaluated.
pub const MIN_CHARGE_DISTANCE: f64 = 2.0;

/// Distance-dependent dielectric: 4 up to 6 A, 80 from 8 A, linear between.
pub fn dielectric(distance: f64) -> f64 {
    if distance >= 8.0 {
        80.0
    } else if distance <= 6.0 {
        4.0
    } else {
        38.0 * distance - 224.0
    }
}

fn charged_atoms(structure: &Structure) -> Vec<(Point3<f64>, f64)> {
    structure
        .atoms()
        .filter(|a| a.charge != 0.0)
        .map(|a| (a.position, a.charge))
        .collect()
}

/// Evaluates the full Coulomb field of `structure` at every voxel centre.
///
/// `phi = sum(q / (epsilon(d) * d))` with `d` clamped to
/// [`MIN_CHARGE_DISTANCE`]. With the `parallel` feature the x planes are
/// filled on the rayon pool; the result is identical either way.
pub fn electric_field(structure: &Structure, grid: &mut Grid) {
    let geometry = *grid.geometry();
    let n = geometry.size();
    let charges = charged_atoms(structure);

    let fill_plane = |x: usize, plane: &mut [f64]| {
        let cx = geometry.centre(x);
        for y in 0..n {
            let cy = geometry.centre(y);
            for z in 0..n {
                let centre = Point3::new(cx, cy, geometry.centre(z));
                plane[y * n + z] = charges
                    .iter()
                    .map(|(position, charge)| {
                        let d = (centre - position).norm().max(MIN_CHARGE_DISTANCE);
                        charge / (dielectric(d) * d)
                    })
                    .sum();
            }
        }
    };

    #[cfg(feature = "parallel")]
    grid.data_mut()
        .par_chunks_mut(n * n)
        .enumerate()
        .for_each(|(x, plane)| fill_plane(x, plane));

    #[cfg(not(feature = "parallel"))]
    grid.data_mut()
        .chunks_mut(n * n)
        .enumerate()
        .for_each(|(x, plane)| fill_plane(x, plane));
}

/// Zeroes `field` wherever `surfaced` holds the internal deterrent value.
///
/// # Errors
///
/// Returns [`GridError::GeometryMismatch`] if the grids differ in size or span.
pub fn zero_core(field: &mut Grid, surfaced: &Grid, internal_value: f64) -> Result<(), GridError> {
    field.ensure_same_geometry(surfaced)?;
    for (value, &shape) in field.data_mut().iter_mut().zip(surfaced.data()) {
        if shape == internal_value {
            *value = 0.0;
        }
    }
    Ok(())
}

/// Deposits every charge of `structure` on its nearest voxel.
///
/// The grid is cleared first. Charges outside the grid are dropped and
/// counted; the count is returned.
pub fn point_charge(structure: &Structure, grid: &mut Grid) -> usize {
    grid.clear();
    let geometry = *grid.geometry();
    let mut dropped = 0;
    for (position, charge) in charged_atoms(structure) {
        let cell = (
            geometry.checked_ordinate(position.x),
            geometry.checked_ordinate(position.y),
            geometry.checked_ordinate(position.z),
        );
        match cell {
            (Some(x), Some(y), Some(z)) => {
                let i = geometry.index(x, y, z);
                grid.data_mut()[i] += charge;
            }
            _ => dropped += 1,
        }
    }
    dropped
}
