use crate::core::io::traits::StructureFile;
use crate::core::models::atom::Atom;
use crate::core::models::residue::Residue;
use crate::core::models::structure::Structure;
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
    #[error("No ATOM records found")]
    NoAtoms,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: &'static str, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: &'static str, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: &'static str },
}

/// A fixed-width column range, 0-based and end-exclusive, with its 1-based label.
struct Columns {
    start: usize,
    end: usize,
    label: &'static str,
}

const SERIAL: Columns = Columns { start: 6, end: 11, label: "7-11" };
const ATOM_NAME: Columns = Columns { start: 12, end: 16, label: "13-16" };
const RESIDUE_NAME: Columns = Columns { start: 17, end: 20, label: "18-20" };
const CHAIN_ID: Columns = Columns { start: 21, end: 22, label: "22" };
const RESIDUE_SEQ: Columns = Columns { start: 22, end: 27, label: "23-27" };
const X: Columns = Columns { start: 30, end: 38, label: "31-38" };
const Y: Columns = Columns { start: 38, end: 46, label: "39-46" };
const Z: Columns = Columns { start: 46, end: 54, label: "47-54" };
const OCCUPANCY: Columns = Columns { start: 54, end: 60, label: "55-60" };
const TEMP_FACTOR: Columns = Columns { start: 60, end: 66, label: "61-66" };
const ONE_LETTER_CODE: Columns = Columns { start: 80, end: 81, label: "81" };
const NEIGHBOR_COUNT: Columns = Columns { start: 82, end: 84, label: "83-84" };

// Lines shorter than a range yield whatever part of it exists.
fn raw<'a>(line: &'a str, cols: &Columns) -> &'a str {
    let end = cols.end.min(line.len());
    line.get(cols.start..end).unwrap_or("")
}

fn parse_float(line: &str, cols: &Columns, line_num: usize) -> Result<Option<f64>, PdbError> {
    let text = raw(line, cols).trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse().map(Some).map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: cols.label,
            value: text.into(),
        },
    })
}

fn parse_int(line: &str, cols: &Columns, line_num: usize) -> Result<Option<i32>, PdbError> {
    let text = raw(line, cols).trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse().map(Some).map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidInt {
            columns: cols.label,
            value: text.into(),
        },
    })
}

fn required_float(line: &str, cols: &Columns, line_num: usize) -> Result<f64, PdbError> {
    parse_float(line, cols, line_num)?.ok_or(PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::MissingRequiredField {
            columns: cols.label,
        },
    })
}

/// Reader and writer for the coordinate-bearing `ATOM` records of PDB files.
///
/// All other record types are ignored on input. A new residue starts whenever
/// the sequence-number-plus-insertion-code columns change.
pub struct PdbFile;

impl StructureFile for PdbFile {
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead, ident: &str) -> Result<Structure, Self::Error> {
        let mut structure = Structure::new(ident);
        let mut current: Option<Residue> = None;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            if !line.starts_with("ATOM") {
                continue;
            }

            let seq_plus_icode = format!("{:<5}", raw(&line, &RESIDUE_SEQ));
            let starts_new_residue = current
                .as_ref()
                .is_none_or(|r| r.seq_plus_icode != seq_plus_icode);
            if starts_new_residue {
                if let Some(done) = current.take() {
                    structure.push_residue(done);
                }
                let chain_id = raw(&line, &CHAIN_ID).chars().next().unwrap_or(' ');
                let mut residue =
                    Residue::new(&seq_plus_icode, raw(&line, &RESIDUE_NAME).trim(), chain_id);
                residue.one_letter_code = raw(&line, &ONE_LETTER_CODE).chars().next().unwrap_or(' ');
                residue.neighbor_count = parse_int(&line, &NEIGHBOR_COUNT, line_num)?.unwrap_or(0);
                current = Some(residue);
            }

            let position = Point3::new(
                required_float(&line, &X, line_num)?,
                required_float(&line, &Y, line_num)?,
                required_float(&line, &Z, line_num)?,
            );
            let serial = parse_int(&line, &SERIAL, line_num)?.unwrap_or(0);
            let name = format!("{:<4}", raw(&line, &ATOM_NAME));
            let mut atom = Atom::new(serial, &name, position);
            atom.occupancy = parse_float(&line, &OCCUPANCY, line_num)?.unwrap_or(1.0);
            atom.temp_factor = parse_float(&line, &TEMP_FACTOR, line_num)?.unwrap_or(0.0);

            if let Some(residue) = current.as_mut() {
                residue.push_atom(atom);
            }
        }

        if let Some(done) = current.take() {
            structure.push_residue(done);
        }
        if structure.atom_count() == 0 {
            return Err(PdbError::NoAtoms);
        }
        Ok(structure)
    }

    fn write_to(structure: &Structure, writer: &mut impl Write) -> Result<(), Self::Error> {
        for residue in structure.residues() {
            let has_trailer = residue.one_letter_code != ' ' || residue.neighbor_count != 0;
            for atom in residue.atoms() {
                write!(
                    writer,
                    "ATOM  {:>5} {:<4} {:<3} {}{:<5}   {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}",
                    atom.serial,
                    atom.name,
                    residue.name,
                    residue.chain_id,
                    residue.seq_plus_icode,
                    atom.position.x,
                    atom.position.y,
                    atom.position.z,
                    atom.occupancy,
                    atom.temp_factor,
                )?;
                if has_trailer {
                    write!(
                        writer,
                        "{:14}{} {:>2}",
                        "", residue.one_letter_code, residue.neighbor_count
                    )?;
                }
                writeln!(writer)?;
            }
        }
        writeln!(writer, "END")?;
        Ok(())
    }
}
