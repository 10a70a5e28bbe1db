//! Provides input/output functionality for structure files.
//!
//! The [`traits::StructureFile`] trait gives every format the same read and
//! write API; [`pdb`] implements it for fixed-width `ATOM` records.

pub mod pdb;
pub mod traits;
