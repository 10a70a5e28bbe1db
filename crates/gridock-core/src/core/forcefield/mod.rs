//! # Force Field Module
//!
//! Partial charges for the electrostatic term of the docking score.
//!
//! Only a handful of atoms carry charge: the backbone nitrogen and oxygen
//! (with special values at the termini and for proline) and the charged
//! side-chain groups of ARG, ASP, GLU and LYS. See [`charges`].

pub mod charges;
