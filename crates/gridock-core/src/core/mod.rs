//! # Core Module
//!
//! Stateless building blocks of the docking search.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Atoms, residues and structures
//! - **File I/O** ([`io`]) - Reading and writing PDB `ATOM` records
//! - **Geometry** ([`utils`]) - Euler rotations, centroids and radii
//! - **Rotational Sampling** ([`rotations`]) - Enumerated Euler angle sets
//! - **Voxel Grids** ([`grid`]) - Discretization, surface shells and electrostatic potentials
//! - **Charges** ([`forcefield`]) - The fixed partial-charge table
//!
//! Nothing in this module keeps state between calls; the search loop itself
//! lives in [`crate::engine`] and [`crate::workflows`].

pub mod forcefield;
pub mod grid;
pub mod io;
pub mod models;
pub mod rotations;
pub mod utils;
