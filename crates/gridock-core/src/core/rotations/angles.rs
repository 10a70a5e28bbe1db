use crate::core::utils::geometry::DEG_TO_RAD;
use std::fmt;
use thiserror::Error;

const FULL_TURN: i32 = 360;
const HALF_TURN: i32 = 180;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum AngleError {
    #[error("Invalid angle step: {0} degrees. The step must lie between 1 and 360")]
    InvalidStep(i64),
}

/// An integer Euler triple in degrees: a twist about z, a tilt in the x-z
/// plane, then a second twist about z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct EulerAngles {
    pub z_twist: i32,
    pub theta: i32,
    pub phi: i32,
}

impl EulerAngles {
    pub const fn new(z_twist: i32, theta: i32, phi: i32) -> Self {
        Self {
            z_twist,
            theta,
            phi,
        }
    }
}

impl fmt::Display for EulerAngles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.z_twist, self.theta, self.phi)
    }
}

/// The full set of sampled rotations for one angular step.
///
/// Stored as three parallel arrays. Theta is sampled on every multiple of the
/// step from 0 to 180 inclusive; the phi step at each latitude is widened by
/// `1 / sin(theta)` so that rings near the poles are not oversampled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AngleSet {
    step: i32,
    z_twist: Vec<i32>,
    theta: Vec<i32>,
    phi: Vec<i32>,
}

impl AngleSet {
    /// Enumerates every rotation for `step` degrees.
    ///
    /// # Errors
    ///
    /// Returns [`AngleError::InvalidStep`] when `step` is outside `1..=360`.
    pub fn generate(step: u32) -> Result<Self, AngleError> {
        if step == 0 || step > FULL_TURN as u32 {
            return Err(AngleError::InvalidStep(i64::from(step)));
        }
        let step = step as i32;

        let mut set = Self {
            step,
            z_twist: Vec::new(),
            theta: Vec::new(),
            phi: Vec::new(),
        };

        for z_twist in (0..FULL_TURN).step_by(step as usize) {
            for theta in (0..=HALF_TURN).step_by(step as usize) {
                if theta == 0 || theta == HALF_TURN {
                    set.push(z_twist, theta, 0);
                    continue;
                }
                let phi_step = latitude_phi_step(step, theta);
                for phi in (0..FULL_TURN).step_by(phi_step as usize) {
                    set.push(z_twist, theta, phi);
                }
            }
        }

        Ok(set)
    }

    fn push(&mut self, z_twist: i32, theta: i32, phi: i32) {
        self.z_twist.push(z_twist);
        self.theta.push(theta);
        self.phi.push(phi);
    }

    /// The angular step this set was generated for.
    pub fn step(&self) -> u32 {
        self.step as u32
    }

    /// The number of rotations, N.
    pub fn len(&self) -> usize {
        self.z_twist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.z_twist.is_empty()
    }

    /// Returns the triple for a 1-based rotation id, or `None` outside `1..=N`.
    pub fn get(&self, rotation: usize) -> Option<EulerAngles> {
        let index = rotation.checked_sub(1)?;
        Some(EulerAngles::new(
            *self.z_twist.get(index)?,
            self.theta[index],
            self.phi[index],
        ))
    }

    /// Iterates over `(rotation_id, angles)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, EulerAngles)> + '_ {
        (0..self.len()).map(move |i| {
            (
                i + 1,
                EulerAngles::new(self.z_twist[i], self.theta[i], self.phi[i]),
            )
        })
    }
}

fn latitude_phi_step(step: i32, theta: i32) -> i32 {
    let widened = f64::from(step) / (DEG_TO_RAD * f64::from(theta)).sin();
    (widened as i32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn step_of_360_yields_only_the_identity() {
        let set = AngleSet::generate(360).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(1), Some(EulerAngles::new(0, 0, 0)));
    }

    #[test]
    fn invalid_steps_are_rejected() {
        assert_eq!(AngleSet::generate(0), Err(AngleError::InvalidStep(0)));
        assert_eq!(AngleSet::generate(361), Err(AngleError::InvalidStep(361)));
    }

    #[test]
    fn step_of_90_samples_poles_once_and_equator_four_times() {
        let set = AngleSet::generate(90).unwrap();
        // 4 z-twists x (pole + 4 equatorial + pole)
        assert_eq!(set.len(), 24);
        let first_six: Vec<_> = set.iter().take(6).map(|(_, a)| a).collect();
        assert_eq!(
            first_six,
            vec![
                EulerAngles::new(0, 0, 0),
                EulerAngles::new(0, 90, 0),
                EulerAngles::new(0, 90, 90),
                EulerAngles::new(0, 90, 180),
                EulerAngles::new(0, 90, 270),
                EulerAngles::new(0, 180, 0),
            ]
        );
    }

    #[test]
    fn phi_sampling_thins_out_towards_the_poles() {
        let set = AngleSet::generate(30).unwrap();
        let count_at = |theta: i32| {
            set.iter()
                .filter(|(_, a)| a.z_twist == 0 && a.theta == theta)
                .count()
        };
        assert!(count_at(30) < count_at(90));
        assert!(count_at(150) < count_at(90));
        assert_eq!(count_at(90), 12);
    }

    #[test]
    fn rotation_counts_for_common_steps_are_stable() {
        assert_eq!(AngleSet::generate(30).unwrap().len(), 588);
        assert_eq!(AngleSet::generate(15).unwrap().len(), 4632);
        assert_eq!(AngleSet::generate(12).unwrap().len(), 9000);
    }

    #[test]
    fn ids_are_one_based_and_bounded() {
        let set = AngleSet::generate(90).unwrap();
        assert!(set.get(0).is_none());
        assert!(set.get(set.len()).is_some());
        assert!(set.get(set.len() + 1).is_none());
        assert_eq!(set.iter().next().map(|(id, _)| id), Some(1));
    }

    #[test]
    fn generation_is_restartable_and_free_of_duplicates() {
        let a = AngleSet::generate(20).unwrap();
        let b = AngleSet::generate(20).unwrap();
        assert_eq!(a, b);
        let unique: HashSet<_> = a.iter().map(|(_, angles)| angles).collect();
        assert_eq!(unique.len(), a.len());
    }
}
