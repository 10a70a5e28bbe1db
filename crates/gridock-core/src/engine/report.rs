use super::checkpoint::{CheckpointError, RunParameters};
use super::selection::{ScoreEntry, elec_percentage, most_favourable_elec, rank_entries};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// One line of the final result table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedEntry {
    /// 1-based position in the ranking.
    pub rank: usize,
    pub entry: ScoreEntry,
    /// Electrostatics as a percentage of the most favourable value logged.
    pub elec_percentage: f64,
}

/// Ranks every logged entry and rescales the electrostatics ratios.
///
/// The most favourable ratio is taken over all of `entries`, including
/// those beyond the ranking cap.
pub fn rank(mut entries: Vec<ScoreEntry>) -> Vec<RankedEntry> {
    let most_favourable = most_favourable_elec(&entries);
    rank_entries(&mut entries);
    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| RankedEntry {
            rank: i + 1,
            elec_percentage: elec_percentage(entry.elec, most_favourable),
            entry,
        })
        .collect()
}

pub fn write_results(
    writer: &mut impl Write,
    parameters: &RunParameters,
    ranked: &[RankedEntry],
) -> io::Result<()> {
    writeln!(writer, "FTDOCK data file")?;
    parameters.write_to(writer)?;
    writeln!(writer)?;
    writeln!(writer, "Data")?;
    writeln!(
        writer,
        "Type       ID    prvID    SCscore        ESratio         Coordinates            Angles"
    )?;
    writeln!(writer)?;
    for r in ranked {
        let e = &r.entry;
        writeln!(
            writer,
            "G_DATA {:6}   {:6}    {:7}       {:8.3}      {:4} {:4} {:4}      {:4}{:4}{:4}",
            r.rank,
            e.previous_id,
            e.score,
            r.elec_percentage,
            e.displacement.x,
            e.displacement.y,
            e.displacement.z,
            e.angles.z_twist,
            e.angles.theta,
            e.angles.phi,
        )?;
    }
    Ok(())
}

/// Writes the result file, replacing any previous one.
///
/// # Errors
///
/// Returns [`CheckpointError::Io`] if the file cannot be written.
pub fn write_results_to_path(
    path: &Path,
    parameters: &RunParameters,
    ranked: &[RankedEntry],
) -> Result<(), CheckpointError> {
    let to_error = |source| CheckpointError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = BufWriter::new(File::create(path).map_err(to_error)?);
    write_results(&mut writer, parameters, ranked)
        .and_then(|_| writer.flush())
        .map_err(to_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rotations::EulerAngles;
    use crate::engine::config::{ParameterSources, ValueSource};
    use crate::engine::selection::{Displacement, MAX_RANKED_ENTRIES};
    use std::path::PathBuf;

    fn entry(rotation: usize, score: i32, elec: f64) -> ScoreEntry {
        ScoreEntry {
            rotation,
            previous_id: 0,
            score,
            elec,
            displacement: Displacement::new(1, -2, 3),
            angles: EulerAngles::new(0, 12, 24),
        }
    }

    fn parameters() -> RunParameters {
        RunParameters {
            static_path: PathBuf::from("a.pdb"),
            mobile_path: PathBuf::from("b.pdb"),
            output_path: PathBuf::from("out.dat"),
            grid_size: 64,
            angle_step: 12,
            surface_thickness: 1.3,
            internal_value: -15.0,
            electrostatics: true,
            keep_per_rotation: 3,
            rotations: 9000,
            total_span: 40.0,
            cell_span: 0.625,
            sources: ParameterSources::all(ValueSource::Default),
        }
    }

    #[test]
    fn ranking_orders_and_numbers_entries() {
        let ranked = rank(vec![entry(1, 5, -0.2), entry(2, 9, -0.4), entry(3, 5, -0.3)]);
        let order: Vec<(usize, usize)> = ranked.iter().map(|r| (r.rank, r.entry.rotation)).collect();
        assert_eq!(order, vec![(1, 2), (2, 3), (3, 1)]);
        assert!((ranked[0].elec_percentage - 100.0).abs() < 1e-9);
        assert!((ranked[1].elec_percentage - 75.0).abs() < 1e-9);
        assert!((ranked[2].elec_percentage - 50.0).abs() < 1e-9);
    }

    #[test]
    fn percentages_are_zero_without_negative_electrostatics() {
        let ranked = rank(vec![entry(1, 5, 0.0), entry(2, 4, 0.0)]);
        assert!(ranked.iter().all(|r| r.elec_percentage == 0.0));
    }

    #[test]
    fn ranking_is_capped() {
        let entries = (1..=MAX_RANKED_ENTRIES + 5).map(|i| entry(i, 1, 0.0)).collect();
        let ranked = rank(entries);
        assert_eq!(ranked.len(), MAX_RANKED_ENTRIES);
        assert_eq!(ranked.last().map(|r| r.rank), Some(MAX_RANKED_ENTRIES));
    }

    #[test]
    fn result_file_has_header_and_fixed_width_rows() {
        let ranked = rank(vec![entry(7, 245, -0.5)]);
        let mut out = Vec::new();
        write_results(&mut out, &parameters(), &ranked).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("FTDOCK data file\n\nGlobal Scan\n"));
        assert!(text.contains("\nData\nType       ID    prvID"));
        assert!(text.ends_with(
            "G_DATA      1        0        245        100.000         1   -2    3         0  12  24\n"
        ));
    }

    #[test]
    fn result_file_is_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.dat");
        write_results_to_path(&path, &parameters(), &[]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Global rotations"));
        assert!(!text.contains("G_DATA"));
    }
}
