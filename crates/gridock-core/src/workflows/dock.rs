use crate::core::forcefield::charges::assign_charges;
use crate::core::grid::discretize::discretize;
use crate::core::grid::electrostatics::{electric_field, point_charge, zero_core};
use crate::core::grid::surface::surface;
use crate::core::grid::{Grid, GridGeometry};
use crate::core::io::pdb::PdbFile;
use crate::core::io::traits::StructureFile;
use crate::core::models::structure::{Structure, total_span};
use crate::core::rotations::{AngleSet, EulerAngles};
use crate::engine::checkpoint::{RunParameters, ScoreLog};
use crate::engine::config::{ConfigError, DockingConfig, GridSizing, ParameterSources};
use crate::engine::correlation::CorrelationEngine;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::report::{RankedEntry, rank, write_results_to_path};
use crate::engine::selection::{ScoreEntry, deduplicate};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, trace, warn};

/// Recorded and recomputed spans closer than this are treated as equal.
const SPAN_TOLERANCE: f64 = 5e-4;

#[derive(Debug, Clone)]
pub struct DockingResult {
    /// The effective parameters, as written to the result header.
    pub parameters: RunParameters,
    pub ranked: Vec<RankedEntry>,
    /// Rotations scored by this invocation; fewer than the total on a rescue
    /// or for one shard of a split run.
    pub rotations_scored: usize,
}

/// Settings after a rescue file, if any, has been layered over the config.
struct RunSettings {
    static_path: PathBuf,
    mobile_path: PathBuf,
    output_path: PathBuf,
    grid: GridSizing,
    angle_step: u32,
    surface_thickness: f64,
    internal_value: f64,
    electrostatics: bool,
    keep_per_rotation: usize,
    sources: ParameterSources,
    recorded_span: Option<f64>,
}

impl RunSettings {
    fn from_config(config: &DockingConfig) -> Result<Self, EngineError> {
        let static_path = config
            .static_path
            .clone()
            .ok_or(ConfigError::MissingParameter("static_path"))?;
        let mobile_path = config
            .mobile_path
            .clone()
            .ok_or(ConfigError::MissingParameter("mobile_path"))?;
        Ok(Self {
            static_path,
            mobile_path,
            output_path: config.output_path.clone(),
            grid: config.grid,
            angle_step: config.angle_step,
            surface_thickness: config.surface_thickness,
            internal_value: config.internal_value,
            electrostatics: config.electrostatics,
            keep_per_rotation: config.keep_per_rotation,
            sources: config.sources,
            recorded_span: None,
        })
    }

    fn from_rescue_file(recorded: RunParameters) -> Self {
        Self {
            static_path: recorded.static_path,
            mobile_path: recorded.mobile_path,
            output_path: recorded.output_path,
            grid: GridSizing::Fixed(recorded.grid_size),
            angle_step: recorded.angle_step,
            surface_thickness: recorded.surface_thickness,
            internal_value: recorded.internal_value,
            electrostatics: recorded.electrostatics,
            keep_per_rotation: recorded.keep_per_rotation,
            sources: recorded.sources,
            recorded_span: Some(recorded.total_span),
        }
    }
}

#[instrument(skip_all, name = "docking_workflow")]
pub fn run(config: &DockingConfig, reporter: &ProgressReporter) -> Result<DockingResult, EngineError> {
    // === Phase 0: Preparation ===
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    let settings = if config.rescue {
        let path = config.checkpoint.parameters();
        info!(path = %path.display(), "Rescue mode: reading recorded parameters.");
        RunSettings::from_rescue_file(RunParameters::read_from_path(&path)?)
    } else {
        RunSettings::from_config(config)?
    };

    let (static_structure, mobile_structure) = load_partners(&settings)?;
    let span = total_span(&static_structure, &mobile_structure);
    if let Some(recorded) = settings.recorded_span
        && (recorded - span).abs() > SPAN_TOLERANCE
    {
        warn!(
            recorded,
            recomputed = span,
            "Total span differs from the rescue file; the input structures may have changed."
        );
    }

    let geometry = GridGeometry::new(settings.grid.resolve(span), span)?;
    let angles = AngleSet::generate(settings.angle_step)?;
    let parameters = RunParameters {
        static_path: settings.static_path.clone(),
        mobile_path: settings.mobile_path.clone(),
        output_path: settings.output_path.clone(),
        grid_size: geometry.size(),
        angle_step: settings.angle_step,
        surface_thickness: settings.surface_thickness,
        internal_value: settings.internal_value,
        electrostatics: settings.electrostatics,
        keep_per_rotation: settings.keep_per_rotation,
        rotations: angles.len(),
        total_span: span,
        cell_span: geometry.cell_span(),
        sources: settings.sources,
    };
    info!(
        %geometry,
        rotations = angles.len(),
        electrostatics = settings.electrostatics,
        "Search space prepared."
    );

    let scores_path = config.checkpoint.scores();
    let (mut log, last_completed) = if config.rescue {
        let (log, resume_after) = ScoreLog::resume(&scores_path)?;
        info!(resume_after, "Resuming the rotational scan.");
        reporter.report(Progress::Message(format!(
            "Resuming after rotation {}",
            resume_after
        )));
        (log, resume_after)
    } else {
        parameters.write_to_path(&config.checkpoint.parameters())?;
        (ScoreLog::create(&scores_path)?, 0)
    };
    reporter.report(Progress::PhaseFinish);

    // === Phase 1: Static partner grids ===
    reporter.report(Progress::PhaseStart {
        name: "Static Grids",
    });
    let mut engine = prepare_static(&static_structure, geometry, &settings)?;
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Rotational scan ===
    let pending: Vec<(usize, EulerAngles)> = config
        .shard
        .rotations_after(last_completed, angles.len())
        .filter_map(|rotation| angles.get(rotation).map(|a| (rotation, a)))
        .collect();
    reporter.report(Progress::PhaseStart {
        name: "Rotational Scan",
    });
    reporter.report(Progress::TaskStart {
        total_steps: pending.len() as u64,
    });
    info!(
        pending = pending.len(),
        shard = config.shard.id(),
        parts = config.shard.parts(),
        "Starting rotational scan."
    );
    if config.shard.parts() > 1 {
        reporter.report(Progress::Message(format!(
            "Scanning part {} of {}",
            config.shard.id(),
            config.shard.parts()
        )));
    }

    let mut mobile_grid = Grid::new(geometry)?;
    let mut mobile_field = if settings.electrostatics {
        Some(Grid::new(geometry)?)
    } else {
        None
    };
    for &(rotation, angle) in &pending {
        let rotated = mobile_structure.rotate(angle);
        discretize(&rotated, &mut mobile_grid);
        if let Some(field) = mobile_field.as_mut() {
            let dropped = point_charge(&rotated, field);
            if dropped > 0 {
                trace!(rotation, dropped, "Charges fell outside the grid.");
            }
        }

        let top = engine.score(&mobile_grid, mobile_field.as_ref(), settings.keep_per_rotation)?;
        let entries: Vec<ScoreEntry> =
            deduplicate(top.as_slice(), config.min_translation_distance_sq)
                .iter()
                .map(|candidate| ScoreEntry::new(rotation, angle, candidate))
                .collect();
        log.append(&entries)?;

        let best_score = entries.first().map_or(0, |e| e.score);
        trace!(rotation, ?angle, best_score, kept = entries.len(), "Rotation scored.");
        reporter.report(Progress::RotationScored {
            rotation,
            best_score,
        });
        reporter.report(Progress::TaskIncrement);
    }
    drop(log);
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    // === Phase 3: Global ranking ===
    reporter.report(Progress::PhaseStart { name: "Ranking" });
    let ranked = rank(ScoreLog::read_all(&scores_path)?);
    write_results_to_path(&parameters.output_path, &parameters, &ranked)?;
    reporter.report(Progress::PhaseFinish);

    info!(
        ranked = ranked.len(),
        output = %parameters.output_path.display(),
        "Docking complete."
    );
    Ok(DockingResult {
        parameters,
        ranked,
        rotations_scored: pending.len(),
    })
}

fn load_structure(path: &Path) -> Result<Structure, EngineError> {
    PdbFile::read_from_path(path).map_err(|source| EngineError::StructureLoad {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads both partners, assigns charges if needed and centres them on the origin.
fn load_partners(settings: &RunSettings) -> Result<(Structure, Structure), EngineError> {
    let mut static_structure = load_structure(&settings.static_path)?;
    let mut mobile_structure = load_structure(&settings.mobile_path)?;
    info!(
        static_residues = static_structure.len(),
        static_atoms = static_structure.atom_count(),
        mobile_residues = mobile_structure.len(),
        mobile_atoms = mobile_structure.atom_count(),
        "Structures loaded."
    );
    if mobile_structure.len() > static_structure.len() {
        warn!(
            "The mobile partner has more residues than the static one; swapping them is usually faster."
        );
    }

    if settings.electrostatics {
        let charged = assign_charges(&mut static_structure) + assign_charges(&mut mobile_structure);
        debug!(charged, "Partial charges assigned.");
    }
    Ok((
        static_structure.translate_onto_origin(),
        mobile_structure.translate_onto_origin(),
    ))
}

fn prepare_static(
    structure: &Structure,
    geometry: GridGeometry,
    settings: &RunSettings,
) -> Result<CorrelationEngine, EngineError> {
    let mut shape = Grid::new(geometry)?;
    discretize(structure, &mut shape);
    surface(&mut shape, settings.surface_thickness, settings.internal_value);

    let field = if settings.electrostatics {
        let mut field = Grid::new(geometry)?;
        electric_field(structure, &mut field);
        zero_core(&mut field, &shape, settings.internal_value)?;
        Some(field)
    } else {
        None
    };
    CorrelationEngine::new(&shape, field.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::residue::Residue;
    use crate::engine::checkpoint::{PARAMETERS_FILE, SCORES_FILE};
    use crate::engine::config::DockingConfigBuilder;
    use crate::engine::selection::Displacement;
    use crate::engine::shard::ShardPlan;
    use nalgebra::Point3;
    use crate::core::grid::discretize::OCCUPIED;
    use std::collections::BTreeSet;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn write_structure(dir: &Path, name: &str, residues: &[(&str, &[(&str, [f64; 3])])]) -> PathBuf {
        let mut structure = Structure::new(name);
        let mut serial = 1;
        for (i, (res_name, atoms)) in residues.iter().enumerate() {
            let mut residue = Residue::new(&format!("{:>4} ", i + 1), res_name, 'A');
            for (atom_name, [x, y, z]) in atoms.iter() {
                residue.push_atom(Atom::new(serial, atom_name, Point3::new(*x, *y, *z)));
                serial += 1;
            }
            structure.push_residue(residue);
        }
        let path = dir.join(name);
        PdbFile::write_to_path(&structure, &path).unwrap();
        path
    }

    fn two_atom_pair(dir: &Path) -> (PathBuf, PathBuf) {
        let atoms: &[(&str, [f64; 3])] = &[(" CA ", [0.0, 0.0, 0.0]), (" CB ", [1.0, 0.0, 0.0])];
        (
            write_structure(dir, "static.pdb", &[("ALA", atoms)]),
            write_structure(dir, "mobile.pdb", &[("ALA", atoms)]),
        )
    }

    fn charged_pair(dir: &Path) -> (PathBuf, PathBuf) {
        let receptor = write_structure(
            dir,
            "receptor.pdb",
            &[
                ("GLY", &[(" N  ", [0.0, 0.0, 0.0]), (" O  ", [1.2, 0.8, 0.0])]),
                ("LYS", &[(" N  ", [2.4, 0.0, 0.5]), (" NZ ", [3.5, 1.5, 1.0])]),
                ("ASP", &[(" OD1", [4.0, -1.0, 0.0]), (" O  ", [5.0, 0.0, -0.5])]),
            ],
        );
        let ligand = write_structure(
            dir,
            "ligand.pdb",
            &[
                ("ARG", &[(" N  ", [0.0, 0.0, 0.0]), (" NH1", [1.5, 1.0, 0.0])]),
                ("GLU", &[(" OE1", [2.5, -0.5, 0.5]), (" O  ", [3.0, 0.5, 1.0])]),
            ],
        );
        (receptor, ligand)
    }

    /// A receptor made of two atoms 8 A apart and a ligand small enough to
    /// sit in the gap between them.
    fn dumbbell_pair(dir: &Path) -> (PathBuf, PathBuf) {
        (
            write_structure(
                dir,
                "receptor.pdb",
                &[("ALA", &[(" N  ", [-4.0, 0.0, 0.0]), (" C  ", [4.0, 0.0, 0.0])])],
            ),
            write_structure(
                dir,
                "ligand.pdb",
                &[("ALA", &[(" N  ", [10.0, 8.5, -3.0]), (" C  ", [10.0, 11.5, -3.0])])],
            ),
        )
    }

    /// Shape score of one translation, summed directly over the occupied
    /// mobile cells with periodic wrap-around.
    fn direct_score(static_shape: &Grid, mobile_cells: &[[i64; 3]], d: Displacement) -> f64 {
        let n = static_shape.geometry().size() as i64;
        let wrap = |c: i64, t: i32| (c + i64::from(t)).rem_euclid(n) as usize;
        mobile_cells
            .iter()
            .map(|&[x, y, z]| static_shape.get(wrap(x, d.x), wrap(y, d.y), wrap(z, d.z)))
            .sum()
    }

    fn recording_reporter(messages: &Mutex<Vec<String>>) -> ProgressReporter<'_> {
        ProgressReporter::with_callback(Box::new(move |event| {
            if let Progress::Message(text) = event {
                messages.lock().unwrap().push(text);
            }
        }))
    }

    fn builder(work: &TempDir, static_path: PathBuf, mobile_path: PathBuf) -> DockingConfigBuilder {
        DockingConfigBuilder::new()
            .static_path(static_path)
            .mobile_path(mobile_path)
            .output_path(work.path().join("ftdock_global.dat"))
            .work_dir(work.path().to_path_buf())
    }

    #[test]
    fn identical_pair_keeps_the_origin_translation() {
        let work = tempfile::tempdir().unwrap();
        let (s, m) = two_atom_pair(work.path());
        let config = builder(&work, s, m)
            .grid_size(64)
            .angle_step(360)
            .keep_per_rotation(1)
            .electrostatics(false)
            .build()
            .unwrap();

        let result = run(&config, &ProgressReporter::new()).unwrap();
        assert_eq!(result.rotations_scored, 1);
        assert_eq!(result.ranked.len(), 1);
        let best = result.ranked[0].entry;
        assert_eq!(best.displacement, Displacement::new(0, 0, 0));
        assert_eq!(best.angles, EulerAngles::new(0, 0, 0));
        assert!(work.path().join(PARAMETERS_FILE).exists());
        assert!(work.path().join(SCORES_FILE).exists());
        assert!(work.path().join("ftdock_global.dat").exists());
    }

    #[test]
    fn surface_contact_is_found_at_the_best_translation() {
        let work = tempfile::tempdir().unwrap();
        let (s, m) = dumbbell_pair(work.path());
        let config = builder(&work, s.clone(), m.clone())
            .grid_size(32)
            .angle_step(360)
            .keep_per_rotation(1)
            .electrostatics(false)
            .build()
            .unwrap();

        let result = run(&config, &ProgressReporter::new()).unwrap();
        let best = result.ranked[0].entry;
        assert!(best.score > 0, "no surface contact found: {:?}", best);
        assert_eq!(best.rotation, 1);
        assert_eq!(best.angles, EulerAngles::new(0, 0, 0));

        let params = &result.parameters;
        let geometry = GridGeometry::new(params.grid_size, params.total_span).unwrap();
        let receptor = PdbFile::read_from_path(&s).unwrap().translate_onto_origin();
        let ligand = PdbFile::read_from_path(&m).unwrap().translate_onto_origin();
        let mut static_shape = Grid::new(geometry).unwrap();
        discretize(&receptor, &mut static_shape);
        surface(&mut static_shape, params.surface_thickness, params.internal_value);
        let mut mobile_shape = Grid::new(geometry).unwrap();
        discretize(&ligand, &mut mobile_shape);

        let n = geometry.size();
        let mut mobile_cells = Vec::new();
        for x in 0..n {
            for y in 0..n {
                for z in 0..n {
                    if mobile_shape.get(x, y, z) == OCCUPIED {
                        mobile_cells.push([x as i64, y as i64, z as i64]);
                    }
                }
            }
        }
        assert!(!mobile_cells.is_empty());

        let mut best_direct = f64::MIN;
        for x in 0..n {
            for y in 0..n {
                for z in 0..n {
                    let d = Displacement::from_wrapped(x, y, z, n);
                    best_direct = best_direct.max(direct_score(&static_shape, &mobile_cells, d));
                }
            }
        }
        let at_best = direct_score(&static_shape, &mobile_cells, best.displacement);

        // Transform round-off can truncate an integer score by one.
        assert!(f64::from(best.score) <= at_best, "{} > {}", best.score, at_best);
        assert!(at_best <= f64::from(best.score) + 1.0);
        assert!(best_direct <= f64::from(best.score) + 1.0);
    }

    #[test]
    fn odd_grid_size_fails_before_any_file_is_written() {
        let work = tempfile::tempdir().unwrap();
        let (s, m) = two_atom_pair(work.path());
        let base = builder(&work, s, m).electrostatics(false);
        assert!(matches!(
            base.clone().grid_size(65).build(),
            Err(ConfigError::OddGridSize(65))
        ));

        let mut config = base.grid_size(64).build().unwrap();
        config.grid = GridSizing::Fixed(65);
        assert!(matches!(
            run(&config, &ProgressReporter::new()),
            Err(EngineError::Grid(_))
        ));
        assert!(!work.path().join(PARAMETERS_FILE).exists());
        assert!(!work.path().join(SCORES_FILE).exists());
        assert!(!work.path().join("ftdock_global.dat").exists());
    }

    #[test]
    fn rescue_resumes_to_the_same_result() {
        let first = tempfile::tempdir().unwrap();
        let (s, m) = charged_pair(first.path());
        let config = builder(&first, s, m)
            .grid_size(16)
            .angle_step(90)
            .keep_per_rotation(2)
            .build()
            .unwrap();
        let full = run(&config, &ProgressReporter::new()).unwrap();
        assert_eq!(full.rotations_scored, 24);
        let full_log = ScoreLog::read_all(&first.path().join(SCORES_FILE)).unwrap();
        let full_text = std::fs::read_to_string(first.path().join("ftdock_global.dat")).unwrap();

        let second = tempfile::tempdir().unwrap();
        std::fs::copy(
            first.path().join(PARAMETERS_FILE),
            second.path().join(PARAMETERS_FILE),
        )
        .unwrap();
        // Killed while writing rotation 10: one of its records made it to
        // disk, the next one only partly.
        let mut partial: Vec<ScoreEntry> =
            full_log.iter().copied().filter(|e| e.rotation <= 9).collect();
        partial.extend(full_log.iter().copied().find(|e| e.rotation == 10));
        let scores = second.path().join(SCORES_FILE);
        ScoreLog::create(&scores).unwrap().append(&partial).unwrap();
        let mut file = std::fs::OpenOptions::new().append(true).open(&scores).unwrap();
        write!(file, "G_DATA     10        0      ").unwrap();
        drop(file);

        let rescue = DockingConfigBuilder::new()
            .rescue(true)
            .work_dir(second.path().to_path_buf())
            .build()
            .unwrap();
        let messages = Mutex::new(Vec::new());
        let reporter = recording_reporter(&messages);
        let resumed = run(&rescue, &reporter).unwrap();
        drop(reporter);

        assert_eq!(resumed.rotations_scored, 15);
        assert_eq!(
            messages.into_inner().unwrap(),
            vec!["Resuming after rotation 9".to_string()]
        );
        assert_eq!(ScoreLog::read_all(&second.path().join(SCORES_FILE)).unwrap(), full_log);
        assert_eq!(resumed.ranked, full.ranked);
        let resumed_text = std::fs::read_to_string(first.path().join("ftdock_global.dat")).unwrap();
        let data = |text: &str| text.split_once("\nData\n").map(|(_, rows)| rows.to_string());
        assert_eq!(data(&resumed_text), data(&full_text));
        assert!(resumed_text.contains("(read from rescue file)"));
    }

    #[test]
    fn rescue_without_checkpoint_files_is_fatal() {
        let work = tempfile::tempdir().unwrap();
        let config = DockingConfigBuilder::new()
            .rescue(true)
            .work_dir(work.path().to_path_buf())
            .build()
            .unwrap();
        assert!(matches!(
            run(&config, &ProgressReporter::new()),
            Err(EngineError::Checkpoint(_))
        ));
    }

    #[test]
    fn shards_together_cover_the_full_scan() {
        let inputs = tempfile::tempdir().unwrap();
        let (s, m) = two_atom_pair(inputs.path());

        let mut covered = BTreeSet::new();
        let mut scored = 0;
        let messages = Mutex::new(Vec::new());
        for id in 1..=2 {
            let work = tempfile::tempdir().unwrap();
            let mut config = builder(&work, s.clone(), m.clone())
                .grid_size(16)
                .angle_step(90)
                .keep_per_rotation(1)
                .electrostatics(false)
                .build()
                .unwrap();
            config.shard = ShardPlan::new(2, id).unwrap();
            let result = run(&config, &recording_reporter(&messages)).unwrap();
            scored += result.rotations_scored;
            for entry in ScoreLog::read_all(&work.path().join(SCORES_FILE)).unwrap() {
                assert_eq!(entry.rotation % 2, id % 2);
                covered.insert(entry.rotation);
            }
        }
        assert_eq!(scored, 24);
        assert_eq!(covered, (1..=24).collect());
        assert_eq!(
            messages.into_inner().unwrap(),
            vec!["Scanning part 1 of 2".to_string(), "Scanning part 2 of 2".to_string()]
        );
    }

    #[test]
    fn progress_events_track_every_rotation() {
        let work = tempfile::tempdir().unwrap();
        let (s, m) = two_atom_pair(work.path());
        let config = builder(&work, s, m)
            .grid_size(16)
            .angle_step(90)
            .electrostatics(false)
            .build()
            .unwrap();

        let seen = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::RotationScored { rotation, .. } = event {
                seen.lock().unwrap().push(rotation);
            }
        }));
        run(&config, &reporter).unwrap();
        drop(reporter);
        assert_eq!(seen.into_inner().unwrap(), (1..=24).collect::<Vec<_>>());
    }
}
