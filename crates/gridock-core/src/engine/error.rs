use std::path::PathBuf;
use thiserror::Error;

use super::checkpoint::CheckpointError;
use super::config::ConfigError;
use crate::core::grid::GridError;
use crate::core::io::pdb::PdbError;
use crate::core::rotations::AngleError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to load structure '{path}': {source}", path = path.display())]
    StructureLoad {
        path: PathBuf,
        #[source]
        source: PdbError,
    },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Rotation sampling failed: {0}")]
    Angles(#[from] AngleError),

    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    #[error("Fourier transform failed: {0}")]
    Transform(String),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}
