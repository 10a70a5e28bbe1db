//! # gridock Core Library
//!
//! Exhaustive rigid-body docking of two protein structures by Fourier
//! correlation of voxel grids.
//!
//! ## Architecture
//!
//! - **[`core`]: The Foundation.** Structure models and their fixed-width
//!   coordinate files, rotation sampling, partial charges and the grid
//!   operations that paint shape and electrostatics onto voxels.
//!
//! - **[`engine`]: The Search.** Transform plans and the correlation engine,
//!   per-rotation selection and global ranking, the checkpoint files that
//!   make a scan resumable, and the shard plan that splits it across
//!   processes.
//!
//! - **[`workflows`]: The Public API.** [`workflows::dock::run`] executes a
//!   full scan from a validated [`engine::config::DockingConfig`].

pub mod core;
pub mod engine;
pub mod workflows;
