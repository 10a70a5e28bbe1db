use super::checkpoint::CheckpointPaths;
use super::shard::{ShardError, ShardPlan};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_OUTPUT_FILE: &str = "ftdock_global.dat";
pub const DEFAULT_ANGLE_STEP: u32 = 12;
pub const DEFAULT_SURFACE_THICKNESS: f64 = 1.3;
pub const DEFAULT_INTERNAL_VALUE: f64 = -15.0;
pub const DEFAULT_KEEP_PER_ROTATION: usize = 3;
pub const DEFAULT_TARGET_CELL_SPAN: f64 = 0.7;

/// Grid edge lengths with only small prime factors, on which the transforms
/// run fastest. Automatic sizing rounds up to the next entry.
#[rustfmt::skip]
pub const NICE_GRID_SIZES: [usize; 133] = [
    64, 66, 70, 72, 78, 80, 84, 88, 90, 96, 98, 100, 104, 108, 110, 112, 120,
    126, 128, 130, 132, 140, 144, 150, 154, 156, 160, 162, 168, 176, 180, 182,
    192, 196, 198, 200, 208, 210, 216, 220, 224, 234, 240, 250, 252, 256, 260,
    264, 270, 280, 288, 294, 300, 308, 312, 320, 324, 330, 336, 350, 352, 360,
    364, 378, 384, 390, 392, 396, 400, 416, 420, 432, 440, 448, 450, 462, 468,
    480, 486, 490, 500, 504, 512, 520, 528, 540, 546, 550, 560, 576, 588, 594,
    600, 616, 624, 630, 640, 648, 650, 660, 672, 686, 700, 702, 704, 720, 728,
    750, 756, 768, 770, 780, 784, 792, 800, 810, 832, 840, 864, 880, 882, 896,
    900, 910, 924, 936, 960, 972, 980, 990, 1000, 1008, 1024,
];

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Grid size must be even, got {0}")]
    OddGridSize(usize),
    #[error("Grid size must be positive")]
    ZeroGridSize,
    #[error("Target grid cell span must be a positive length, got {0}")]
    InvalidCellSpan(f64),
    #[error("Angle step must lie between 1 and 360 degrees, got {0}")]
    InvalidAngleStep(u32),
    #[error("Surface thickness must be a non-negative length, got {0}")]
    InvalidSurfaceThickness(f64),
    #[error("Internal deterrent value must be finite, got {0}")]
    InvalidInternalValue(f64),
    #[error("At least one entry must be kept per rotation")]
    InvalidKeep,
    #[error(transparent)]
    Shard(#[from] ShardError),
}

/// Where a recorded parameter value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    Default,
    UserDefined,
    DefaultCalculated,
    UserDefinedCalculated,
    RescueFile,
}

impl ValueSource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Default => "(default)",
            Self::UserDefined => "(user defined)",
            Self::DefaultCalculated => "(default calculated)",
            Self::UserDefinedCalculated => "(user defined calculated)",
            Self::RescueFile => "(read from rescue file)",
        }
    }

    fn of<T>(value: &Option<T>) -> Self {
        if value.is_some() {
            Self::UserDefined
        } else {
            Self::Default
        }
    }
}

/// Provenance of each search parameter echoed into the output headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterSources {
    pub grid_size: ValueSource,
    pub angle_step: ValueSource,
    pub surface_thickness: ValueSource,
    pub internal_value: ValueSource,
    pub electrostatics: ValueSource,
    pub keep_per_rotation: ValueSource,
}

impl ParameterSources {
    pub fn all(source: ValueSource) -> Self {
        Self {
            grid_size: source,
            angle_step: source,
            surface_thickness: source,
            internal_value: source,
            electrostatics: source,
            keep_per_rotation: source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridSizing {
    Fixed(usize),
    /// Size the grid so each cell spans about `target_cell_span` Angstroms.
    Automatic { target_cell_span: f64 },
}

impl Default for GridSizing {
    fn default() -> Self {
        Self::Automatic {
            target_cell_span: DEFAULT_TARGET_CELL_SPAN,
        }
    }
}

impl GridSizing {
    /// Resolves the grid edge for a pair whose combined span is `total_span`.
    pub fn resolve(&self, total_span: f64) -> usize {
        match *self {
            Self::Fixed(size) => size,
            Self::Automatic { target_cell_span } => {
                let mut size = (total_span / target_cell_span) as usize;
                if size % 2 != 0 {
                    size += 1;
                }
                round_up_to_nice_size(size)
            }
        }
    }
}

/// The smallest entry of [`NICE_GRID_SIZES`] not below `size`.
///
/// Sizes beyond the table are returned unchanged.
pub fn round_up_to_nice_size(size: usize) -> usize {
    let i = NICE_GRID_SIZES.partition_point(|&nice| nice < size);
    NICE_GRID_SIZES.get(i).copied().unwrap_or(size)
}

/// Validated settings of one docking run.
#[derive(Debug, Clone, PartialEq)]
pub struct DockingConfig {
    /// Input structures; optional only in rescue mode, where the checkpoint
    /// names them.
    pub static_path: Option<PathBuf>,
    pub mobile_path: Option<PathBuf>,
    pub output_path: PathBuf,
    pub grid: GridSizing,
    pub angle_step: u32,
    pub surface_thickness: f64,
    pub internal_value: f64,
    pub electrostatics: bool,
    pub keep_per_rotation: usize,
    pub rescue: bool,
    pub shard: ShardPlan,
    /// Squared grid distance below which a lower-ranked translation of the
    /// same rotation is dropped; 0 keeps everything.
    pub min_translation_distance_sq: u32,
    pub checkpoint: CheckpointPaths,
    pub sources: ParameterSources,
}

#[derive(Debug, Clone, Default)]
pub struct DockingConfigBuilder {
    static_path: Option<PathBuf>,
    mobile_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    grid: Option<GridSizing>,
    angle_step: Option<u32>,
    surface_thickness: Option<f64>,
    internal_value: Option<f64>,
    electrostatics: Option<bool>,
    keep_per_rotation: Option<usize>,
    rescue: bool,
    parallel: Option<(usize, usize)>,
    min_translation_distance_sq: Option<u32>,
    work_dir: Option<PathBuf>,
}

impl DockingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn static_path(mut self, path: PathBuf) -> Self {
        self.static_path = Some(path);
        self
    }
    pub fn mobile_path(mut self, path: PathBuf) -> Self {
        self.mobile_path = Some(path);
        self
    }
    pub fn output_path(mut self, path: PathBuf) -> Self {
        self.output_path = Some(path);
        self
    }
    pub fn grid_size(mut self, size: usize) -> Self {
        self.grid = Some(GridSizing::Fixed(size));
        self
    }
    pub fn target_cell_span(mut self, span: f64) -> Self {
        self.grid = Some(GridSizing::Automatic {
            target_cell_span: span,
        });
        self
    }
    pub fn angle_step(mut self, step: u32) -> Self {
        self.angle_step = Some(step);
        self
    }
    pub fn surface_thickness(mut self, thickness: f64) -> Self {
        self.surface_thickness = Some(thickness);
        self
    }
    pub fn internal_value(mut self, value: f64) -> Self {
        self.internal_value = Some(value);
        self
    }
    pub fn electrostatics(mut self, enabled: bool) -> Self {
        self.electrostatics = Some(enabled);
        self
    }
    pub fn keep_per_rotation(mut self, keep: usize) -> Self {
        self.keep_per_rotation = Some(keep);
        self
    }
    pub fn rescue(mut self, rescue: bool) -> Self {
        self.rescue = rescue;
        self
    }
    pub fn parallel(mut self, parts: usize, id: usize) -> Self {
        self.parallel = Some((parts, id));
        self
    }
    pub fn min_translation_distance_sq(mut self, distance_sq: u32) -> Self {
        self.min_translation_distance_sq = Some(distance_sq);
        self
    }
    pub fn work_dir(mut self, dir: PathBuf) -> Self {
        self.work_dir = Some(dir);
        self
    }

    pub fn build(self) -> Result<DockingConfig, ConfigError> {
        if !self.rescue {
            if self.static_path.is_none() {
                return Err(ConfigError::MissingParameter("static_path"));
            }
            if self.mobile_path.is_none() {
                return Err(ConfigError::MissingParameter("mobile_path"));
            }
        }

        let grid = self.grid.unwrap_or_default();
        match grid {
            GridSizing::Fixed(0) => return Err(ConfigError::ZeroGridSize),
            GridSizing::Fixed(size) if size % 2 != 0 => {
                return Err(ConfigError::OddGridSize(size));
            }
            GridSizing::Automatic { target_cell_span }
                if !target_cell_span.is_finite() || target_cell_span <= 0.0 =>
            {
                return Err(ConfigError::InvalidCellSpan(target_cell_span));
            }
            _ => {}
        }

        let angle_step = self.angle_step.unwrap_or(DEFAULT_ANGLE_STEP);
        if !(1..=360).contains(&angle_step) {
            return Err(ConfigError::InvalidAngleStep(angle_step));
        }
        let surface_thickness = self.surface_thickness.unwrap_or(DEFAULT_SURFACE_THICKNESS);
        if !surface_thickness.is_finite() || surface_thickness < 0.0 {
            return Err(ConfigError::InvalidSurfaceThickness(surface_thickness));
        }
        let internal_value = self.internal_value.unwrap_or(DEFAULT_INTERNAL_VALUE);
        if !internal_value.is_finite() {
            return Err(ConfigError::InvalidInternalValue(internal_value));
        }
        let keep_per_rotation = self.keep_per_rotation.unwrap_or(DEFAULT_KEEP_PER_ROTATION);
        if keep_per_rotation == 0 {
            return Err(ConfigError::InvalidKeep);
        }
        let (parts, id) = self.parallel.unwrap_or((1, 1));
        let shard = ShardPlan::new(parts, id)?;

        let sources = ParameterSources {
            grid_size: match self.grid {
                Some(GridSizing::Fixed(_)) => ValueSource::UserDefined,
                Some(GridSizing::Automatic { .. }) => ValueSource::UserDefinedCalculated,
                None => ValueSource::DefaultCalculated,
            },
            angle_step: ValueSource::of(&self.angle_step),
            surface_thickness: ValueSource::of(&self.surface_thickness),
            internal_value: ValueSource::of(&self.internal_value),
            electrostatics: ValueSource::of(&self.electrostatics),
            keep_per_rotation: ValueSource::of(&self.keep_per_rotation),
        };

        Ok(DockingConfig {
            static_path: self.static_path,
            mobile_path: self.mobile_path,
            output_path: self
                .output_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE)),
            grid,
            angle_step,
            surface_thickness,
            internal_value,
            electrostatics: self.electrostatics.unwrap_or(true),
            keep_per_rotation,
            rescue: self.rescue,
            shard,
            min_translation_distance_sq: self.min_translation_distance_sq.unwrap_or(0),
            checkpoint: self
                .work_dir
                .map(CheckpointPaths::new)
                .unwrap_or_default(),
            sources,
        })
    }
}
