use crate::core::models::structure::Structure;
use phf::{Map, phf_map};

pub const BACKBONE_N_CHARGE: f64 = 0.55;
pub const PROLINE_N_CHARGE: f64 = -0.10;
pub const N_TERMINUS_CHARGE: f64 = 1.00;
pub const BACKBONE_O_CHARGE: f64 = -0.55;
pub const C_TERMINUS_CHARGE: f64 = -1.00;

/// Charged side-chain groups: residue name to (atom name prefix, charge).
#[rustfmt::skip]
static SIDE_CHAIN_CHARGES: Map<&'static str, (&'static str, f64)> = phf_map! {
    "ARG" => ("NH", 0.50),
    "ASP" => ("OD", -0.50),
    "GLU" => ("OE", -0.50),
    "LYS" => ("NZ", 1.00),
};

/// Looks up the partial charge of one atom.
///
/// `position` flags the first and last residue of the structure, whose
/// backbone nitrogen and oxygen carry the terminal charges.
pub fn charge_for(residue_name: &str, atom_name: &str, position: ResiduePosition) -> f64 {
    match atom_name {
        "N" => {
            if position.is_first {
                N_TERMINUS_CHARGE
            } else if residue_name == "PRO" {
                PROLINE_N_CHARGE
            } else {
                BACKBONE_N_CHARGE
            }
        }
        "O" => {
            if position.is_last {
                C_TERMINUS_CHARGE
            } else {
                BACKBONE_O_CHARGE
            }
        }
        _ => SIDE_CHAIN_CHARGES
            .get(residue_name)
            .filter(|(prefix, _)| atom_name.starts_with(prefix))
            .map_or(0.0, |&(_, charge)| charge),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResiduePosition {
    pub is_first: bool,
    pub is_last: bool,
}

/// Assigns a partial charge to every atom of `structure` from the fixed table.
///
/// Atoms the table does not name get 0. Returns the number of charged atoms.
pub fn assign_charges(structure: &mut Structure) -> usize {
    let last = structure.len().saturating_sub(1);
    let mut charged = 0;
    for (index, residue) in structure.residues_mut().iter_mut().enumerate() {
        let position = ResiduePosition {
            is_first: index == 0,
            is_last: index == last,
        };
        let residue_name = residue.name.clone();
        for atom in residue.atoms_mut() {
            atom.charge = charge_for(&residue_name, atom.trimmed_name(), position);
            if atom.charge != 0.0 {
                charged += 1;
            }
        }
    }
    charged
}

/// Sum of all partial charges.
pub fn net_charge(structure: &Structure) -> f64 {
    structure.atoms().map(|a| a.charge).sum()
}
