//! # Engine Module
//!
//! The stateful half of the search: configuration, the transform-based
//! correlation, per-rotation selection and the on-disk checkpoint that makes
//! long runs resumable.
//!
//! - **Configuration** ([`config`]) - validated run settings and their provenance
//! - **Correlation** ([`transform`], [`correlation`]) - 3D real transforms and translational scoring
//! - **Selection** ([`selection`]) - top-K retention, de-duplication and final ranking
//! - **Persistence** ([`checkpoint`], [`report`]) - scratch files, rescue and the result table
//! - **Sharding** ([`shard`]) - splitting the rotation set across processes
//! - **Progress Monitoring** ([`progress`]) - callback-based progress events
//! - **Error Handling** ([`error`]) - the aggregated [`error::EngineError`]

pub mod checkpoint;
pub mod config;
pub mod correlation;
pub mod error;
pub mod progress;
pub mod report;
pub mod selection;
pub mod shard;
pub mod transform;
