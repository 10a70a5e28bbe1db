use super::config::{ParameterSources, ValueSource};
use super::selection::{Displacement, ScoreEntry};
use crate::core::rotations::EulerAngles;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const PARAMETERS_FILE: &str = "scratch_parameters.dat";
pub const SCORES_FILE: &str = "scratch_scores.dat";

const RECORD_TAG: &str = "G_DATA";

const STATIC_MOLECULE: &str = "Static molecule";
const MOBILE_MOLECULE: &str = "Mobile molecule";
const OUTPUT_FILE: &str = "Output file name";
const GRID_SIZE: &str = "Global grid size";
const ANGLE_STEP: &str = "Global search angle step";
const SURFACE: &str = "Global surface thickness";
const INTERNAL: &str = "Global internal deterrent value";
const ELECTROSTATICS: &str = "Electrostatics";
const KEEP: &str = "Global keep per rotation";
const ROTATIONS: &str = "Global rotations";
const TOTAL_SPAN: &str = "Global total span (angstroms)";
const CELL_SPAN: &str = "Global grid cell span (angstroms)";

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Cannot access '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Malformed line {line} in '{path}': {message}", path = path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("'{path}' has no value for '{key}'", path = path.display())]
    MissingField { path: PathBuf, key: &'static str },
}

impl CheckpointError {
    fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Location of the two scratch files. Their names are fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointPaths {
    dir: PathBuf,
}

impl Default for CheckpointPaths {
    fn default() -> Self {
        Self::new(PathBuf::from("."))
    }
}

impl CheckpointPaths {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn parameters(&self) -> PathBuf {
        self.dir.join(PARAMETERS_FILE)
    }

    pub fn scores(&self) -> PathBuf {
        self.dir.join(SCORES_FILE)
    }
}

/// The effective parameters of a run, as persisted for rescue and echoed
/// into the result header.
#[derive(Debug, Clone, PartialEq)]
pub struct RunParameters {
    pub static_path: PathBuf,
    pub mobile_path: PathBuf,
    pub output_path: PathBuf,
    pub grid_size: usize,
    pub angle_step: u32,
    pub surface_thickness: f64,
    pub internal_value: f64,
    pub electrostatics: bool,
    pub keep_per_rotation: usize,
    pub rotations: usize,
    pub total_span: f64,
    pub cell_span: f64,
    pub sources: ParameterSources,
}

fn line(writer: &mut impl Write, key: &str, value: impl std::fmt::Display) -> io::Result<()> {
    writeln!(writer, "{:<35}:: {}", key, value)
}

impl RunParameters {
    /// Writes the human-readable parameter block.
    pub fn write_to(&self, writer: &mut impl Write) -> io::Result<()> {
        let s = &self.sources;
        writeln!(writer)?;
        writeln!(writer, "Global Scan")?;
        writeln!(writer)?;
        writeln!(writer, "Command line controllable values")?;
        line(writer, STATIC_MOLECULE, self.static_path.display())?;
        line(writer, MOBILE_MOLECULE, self.mobile_path.display())?;
        line(writer, OUTPUT_FILE, self.output_path.display())?;
        writeln!(writer)?;
        line(
            writer,
            GRID_SIZE,
            format_args!("{:6}      {}", self.grid_size, s.grid_size.label()),
        )?;
        line(
            writer,
            ANGLE_STEP,
            format_args!("{:6}      {}", self.angle_step, s.angle_step.label()),
        )?;
        line(
            writer,
            SURFACE,
            format_args!("{:9.2}   {}", self.surface_thickness, s.surface_thickness.label()),
        )?;
        line(
            writer,
            INTERNAL,
            format_args!("{:9.2}   {}", self.internal_value, s.internal_value.label()),
        )?;
        let switch = if self.electrostatics { "    on" } else { "   off" };
        line(
            writer,
            ELECTROSTATICS,
            format_args!("{}      {}", switch, s.electrostatics.label()),
        )?;
        line(
            writer,
            KEEP,
            format_args!("{:6}      {}", self.keep_per_rotation, s.keep_per_rotation.label()),
        )?;
        writeln!(writer)?;
        writeln!(writer, "Calculated values")?;
        line(writer, ROTATIONS, format_args!("{:6}", self.rotations))?;
        line(writer, TOTAL_SPAN, format_args!("{:10.3}", self.total_span))?;
        line(writer, CELL_SPAN, format_args!("{:10.3}", self.cell_span))?;
        Ok(())
    }

    /// Creates (or truncates) the parameters file and writes the block.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError::Io`] if the file cannot be written.
    pub fn write_to_path(&self, path: &Path) -> Result<(), CheckpointError> {
        let file = File::create(path).map_err(CheckpointError::io(path))?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)
            .and_then(|_| writer.flush())
            .map_err(CheckpointError::io(path))
    }

    /// Reads a parameters file written by [`write_to_path`](Self::write_to_path).
    ///
    /// Every value is marked [`ValueSource::RescueFile`].
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened, a value is malformed or a key is missing.
    pub fn read_from_path(path: &Path) -> Result<Self, CheckpointError> {
        let file = File::open(path).map_err(CheckpointError::io(path))?;
        let mut values: Vec<(String, String, usize)> = Vec::new();
        for (index, text) in BufReader::new(file).lines().enumerate() {
            let text = text.map_err(CheckpointError::io(path))?;
            if let Some((key, value)) = text.split_once("::") {
                values.push((key.trim().to_string(), value.trim().to_string(), index + 1));
            }
        }

        let lookup = |key: &'static str| {
            values
                .iter()
                .find(|(k, _, _)| k == key)
                .map(|(_, v, line)| (v.as_str(), *line))
                .ok_or_else(|| CheckpointError::MissingField {
                    path: path.to_path_buf(),
                    key,
                })
        };
        let number = |key: &'static str| -> Result<f64, CheckpointError> {
            let (value, line) = lookup(key)?;
            value
                .split_whitespace()
                .next()
                .and_then(|token| token.parse().ok())
                .ok_or_else(|| CheckpointError::Parse {
                    path: path.to_path_buf(),
                    line,
                    message: format!("expected a number for '{}', found '{}'", key, value),
                })
        };
        let count = |key: &'static str| -> Result<usize, CheckpointError> {
            let (value, line) = lookup(key)?;
            value
                .split_whitespace()
                .next()
                .and_then(|token| token.parse().ok())
                .ok_or_else(|| CheckpointError::Parse {
                    path: path.to_path_buf(),
                    line,
                    message: format!("expected a count for '{}', found '{}'", key, value),
                })
        };

        let (switch, switch_line) = lookup(ELECTROSTATICS)?;
        let electrostatics = match switch.split_whitespace().next() {
            Some("on") => true,
            Some("off") => false,
            _ => {
                return Err(CheckpointError::Parse {
                    path: path.to_path_buf(),
                    line: switch_line,
                    message: format!("expected 'on' or 'off', found '{}'", switch),
                });
            }
        };
        let angle_step = count(ANGLE_STEP)?;

        Ok(Self {
            static_path: PathBuf::from(lookup(STATIC_MOLECULE)?.0),
            mobile_path: PathBuf::from(lookup(MOBILE_MOLECULE)?.0),
            output_path: PathBuf::from(lookup(OUTPUT_FILE)?.0),
            grid_size: count(GRID_SIZE)?,
            angle_step: u32::try_from(angle_step).map_err(|_| CheckpointError::Parse {
                path: path.to_path_buf(),
                line: lookup(ANGLE_STEP).map_or(0, |(_, l)| l),
                message: format!("angle step {} is out of range", angle_step),
            })?,
            surface_thickness: number(SURFACE)?,
            internal_value: number(INTERNAL)?,
            electrostatics,
            keep_per_rotation: count(KEEP)?,
            rotations: count(ROTATIONS)?,
            total_span: number(TOTAL_SPAN)?,
            cell_span: number(CELL_SPAN)?,
            sources: ParameterSources::all(ValueSource::RescueFile),
        })
    }
}

/// Formats one score-log record.
///
/// The electrostatic ratio is written in exponent form so that it reads back
/// bit for bit.
pub fn format_log_entry(entry: &ScoreEntry) -> String {
    format!(
        "{} {:6}   {:6}    {:7}       {:>12e}      {:4} {:4} {:4}      {:4}{:4}{:4}",
        RECORD_TAG,
        entry.rotation,
        entry.previous_id,
        entry.score,
        entry.elec,
        entry.displacement.x,
        entry.displacement.y,
        entry.displacement.z,
        entry.angles.z_twist,
        entry.angles.theta,
        entry.angles.phi,
    )
}

/// Parses one score-log record; `None` for anything that is not a record.
pub fn parse_log_entry(text: &str) -> Option<Result<ScoreEntry, String>> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.first() != Some(&RECORD_TAG) {
        return None;
    }
    if tokens.len() != 11 {
        return Some(Err(format!("expected 11 fields, found {}", tokens.len())));
    }
    let int = |i: usize| -> Result<i32, String> {
        tokens[i]
            .parse()
            .map_err(|_| format!("field {} ('{}') is not an integer", i + 1, tokens[i]))
    };
    let id = |i: usize| -> Result<usize, String> {
        tokens[i]
            .parse()
            .map_err(|_| format!("field {} ('{}') is not an id", i + 1, tokens[i]))
    };
    let parsed = (|| -> Result<ScoreEntry, String> {
        Ok(ScoreEntry {
            rotation: id(1)?,
            previous_id: id(2)?,
            score: int(3)?,
            elec: tokens[4]
                .parse()
                .map_err(|_| format!("field 5 ('{}') is not a number", tokens[4]))?,
            displacement: Displacement::new(int(5)?, int(6)?, int(7)?),
            angles: EulerAngles::new(int(8)?, int(9)?, int(10)?),
        })
    })();
    Some(parsed)
}

/// Append-only writer for the per-rotation score log.
pub struct ScoreLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl ScoreLog {
    /// Creates a fresh, empty log, truncating any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError::Io`] if the file cannot be created.
    pub fn create(path: &Path) -> Result<Self, CheckpointError> {
        let file = File::create(path).map_err(CheckpointError::io(path))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    /// Opens an existing log for appending.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError::Io`] if the file does not exist or cannot
    /// be opened for writing.
    pub fn append_to(path: &Path) -> Result<Self, CheckpointError> {
        let file = OpenOptions::new()
            .append(true)
            .open(path)
            .map_err(CheckpointError::io(path))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    /// Appends the entries of one completed rotation and flushes them to disk.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError::Io`] on any write failure.
    pub fn append(&mut self, entries: &[ScoreEntry]) -> Result<(), CheckpointError> {
        for entry in entries {
            writeln!(self.writer, "{}", format_log_entry(entry))
                .map_err(CheckpointError::io(&self.path))?;
        }
        self.writer.flush().map_err(CheckpointError::io(&self.path))
    }

    /// Prepares the log of an interrupted run for a rescue.
    ///
    /// A malformed final line is a record cut short by the interruption and
    /// is dropped. The highest logged rotation may have been cut between two
    /// of its records, so its records are dropped too and it is scored again.
    /// The log is rewritten with what remains and reopened for appending.
    ///
    /// Returns the log and the rotation id to resume after.
    ///
    /// # Errors
    ///
    /// Fails if the log cannot be read or rewritten, or if a record other
    /// than the last one is malformed.
    pub fn resume(path: &Path) -> Result<(Self, usize), CheckpointError> {
        let mut entries = read_records(path, true)?;
        let redo = last_completed_rotation(&entries);
        entries.retain(|e| e.rotation != redo);
        debug!(redo, kept = entries.len(), "Score log trimmed for rescue.");

        let staging = path.with_extension("tmp");
        Self::create(&staging)?.append(&entries)?;
        std::fs::rename(&staging, path).map_err(CheckpointError::io(path))?;

        Ok((Self::append_to(path)?, redo.saturating_sub(1)))
    }

    /// Reads every record of a log, in file order.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or a record is malformed.
    pub fn read_all(path: &Path) -> Result<Vec<ScoreEntry>, CheckpointError> {
        read_records(path, false)
    }
}

fn read_records(path: &Path, allow_torn_tail: bool) -> Result<Vec<ScoreEntry>, CheckpointError> {
    let file = File::open(path).map_err(CheckpointError::io(path))?;
    let lines = BufReader::new(file)
        .lines()
        .collect::<io::Result<Vec<String>>>()
        .map_err(CheckpointError::io(path))?;
    let last_line = lines.iter().rposition(|text| !text.trim().is_empty());

    let mut entries = Vec::new();
    for (index, text) in lines.iter().enumerate() {
        match parse_log_entry(text) {
            Some(Ok(entry)) => entries.push(entry),
            Some(Err(message)) if allow_torn_tail && Some(index) == last_line => {
                warn!(line = index + 1, %message, "Dropping an incomplete final record.");
            }
            Some(Err(message)) => {
                return Err(CheckpointError::Parse {
                    path: path.to_path_buf(),
                    line: index + 1,
                    message,
                });
            }
            None => {}
        }
    }
    Ok(entries)
}

/// The highest rotation id present in `entries`, or 0 for an empty log.
pub fn last_completed_rotation(entries: &[ScoreEntry]) -> usize {
    entries.iter().map(|e| e.rotation).max().unwrap_or(0)
}
