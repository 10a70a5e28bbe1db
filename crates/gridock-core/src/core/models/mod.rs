//! # Core Models Module
//!
//! Plain data structures for the molecules being docked.
//!
//! ## Key Components
//!
//! - [`atom`] - A single atom: serial, raw name, coordinates, occupancy and charge
//! - [`residue`] - A residue and the atoms it owns, in file order
//! - [`structure`] - A whole molecule with value-returning transforms
//!   (translate, rotate, merge) and the size measures used to dimension grids
//!
//! ## Usage
//!
//! ```ignore
//! use gridock::core::io::{pdb::PdbFile, traits::StructureFile};
//! use gridock::core::rotations::EulerAngles;
//!
//! let receptor = PdbFile::read_from_path("receptor.pdb")?.translate_onto_origin();
//! let tilted = receptor.rotate(EulerAngles::new(0, 90, 0));
//! ```

pub mod atom;
pub mod residue;
pub mod structure;
