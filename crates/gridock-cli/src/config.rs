use crate::cli::DockArgs;
use crate::error::{CliError, Result};
use gridock::engine::config::{DockingConfig, DockingConfigBuilder};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialGridConfig {
    size: Option<usize>,
    target_cell_span: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialSearchConfig {
    angle_step: Option<u32>,
    keep_per_rotation: Option<usize>,
    reduce_translations: Option<u32>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialScoringConfig {
    surface_thickness: Option<f64>,
    internal_value: Option<f64>,
    electrostatics: Option<bool>,
}

/// Everything a `--config` file may set. Every key is optional; whatever is
/// left unset falls back to the command line, then to the built-in defaults.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialDockingConfig {
    output: Option<PathBuf>,
    work_dir: Option<PathBuf>,
    grid: Option<PartialGridConfig>,
    search: Option<PartialSearchConfig>,
    scoring: Option<PartialScoringConfig>,
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value.parse().map_err(|_| {
        CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value))
    })
}

impl PartialDockingConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Layers `--set` values and explicit flags over the file and validates
    /// the result.
    pub fn merge_with_cli(mut self, args: &DockArgs) -> Result<DockingConfig> {
        self.apply_set_values(&args.set_values)?;

        let grid = self.grid.take().unwrap_or_default();
        let search = self.search.take().unwrap_or_default();
        let scoring = self.scoring.take().unwrap_or_default();

        let mut builder = DockingConfigBuilder::new().rescue(args.rescue);
        if let Some(path) = &args.static_path {
            builder = builder.static_path(path.clone());
        }
        if let Some(path) = &args.mobile_path {
            builder = builder.mobile_path(path.clone());
        }
        if let Some(path) = args.output.clone().or(self.output) {
            builder = builder.output_path(path);
        }
        if let Some(dir) = args.work_dir.clone().or(self.work_dir) {
            builder = builder.work_dir(dir);
        }

        builder = Self::merge_grid(builder, args, grid);

        if let Some(step) = args.angle_step.or(search.angle_step) {
            builder = builder.angle_step(step);
        }
        if let Some(keep) = args.keep_per_rotation.or(search.keep_per_rotation) {
            builder = builder.keep_per_rotation(keep);
        }
        if let Some(d2) = args.reduce_translations.or(search.reduce_translations) {
            builder = builder.min_translation_distance_sq(d2);
        }
        if let Some(thickness) = args.surface_thickness.or(scoring.surface_thickness) {
            builder = builder.surface_thickness(thickness);
        }
        if let Some(value) = args.internal_value.or(scoring.internal_value) {
            builder = builder.internal_value(value);
        }
        if args.noelec {
            builder = builder.electrostatics(false);
        } else if let Some(enabled) = scoring.electrostatics {
            builder = builder.electrostatics(enabled);
        }
        if let (Some(parts), Some(id)) = (args.parallel_parts, args.parallel_id) {
            builder = builder.parallel(parts, id);
        }

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    fn merge_grid(
        builder: DockingConfigBuilder,
        args: &DockArgs,
        file: PartialGridConfig,
    ) -> DockingConfigBuilder {
        if let Some(size) = args.grid {
            builder.grid_size(size)
        } else if let Some(span) = args.calculate_grid {
            builder.target_cell_span(span)
        } else if let Some(size) = file.size {
            builder.grid_size(size)
        } else if let Some(span) = file.target_cell_span {
            builder.target_cell_span(span)
        } else {
            builder
        }
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };

            match key {
                "output" => self.output = Some(PathBuf::from(value)),
                "work-dir" => self.work_dir = Some(PathBuf::from(value)),
                "grid.size" => {
                    self.grid.get_or_insert_with(Default::default).size =
                        Some(parse_value(key, value, "integer")?);
                }
                "grid.target-cell-span" => {
                    self.grid
                        .get_or_insert_with(Default::default)
                        .target_cell_span = Some(parse_value(key, value, "float")?);
                }
                "search.angle-step" => {
                    self.search.get_or_insert_with(Default::default).angle_step =
                        Some(parse_value(key, value, "integer")?);
                }
                "search.keep-per-rotation" => {
                    self.search
                        .get_or_insert_with(Default::default)
                        .keep_per_rotation = Some(parse_value(key, value, "integer")?);
                }
                "search.reduce-translations" => {
                    self.search
                        .get_or_insert_with(Default::default)
                        .reduce_translations = Some(parse_value(key, value, "integer")?);
                }
                "scoring.surface-thickness" => {
                    self.scoring
                        .get_or_insert_with(Default::default)
                        .surface_thickness = Some(parse_value(key, value, "float")?);
                }
                "scoring.internal-value" => {
                    self.scoring
                        .get_or_insert_with(Default::default)
                        .internal_value = Some(parse_value(key, value, "float")?);
                }
                "scoring.electrostatics" => {
                    self.scoring
                        .get_or_insert_with(Default::default)
                        .electrostatics = Some(parse_value(key, value, "boolean")?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}
