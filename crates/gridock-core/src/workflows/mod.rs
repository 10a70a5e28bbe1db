//! # Workflows Module
//!
//! End-to-end entry points that tie [`crate::core`] and [`crate::engine`]
//! together. [`dock`] runs a complete global scan: it loads both partners,
//! builds the static grids, scores every owned rotation, checkpoints as it
//! goes and writes the ranked result table.

pub mod dock;
