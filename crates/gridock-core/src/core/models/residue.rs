use super::atom::Atom;

/// A residue and the atoms it owns, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct Residue {
    /// Residue sequence number plus insertion code, exactly five columns wide.
    pub seq_plus_icode: String,
    /// Three-letter residue name (e.g., "ALA", "LYS").
    pub name: String,
    /// Chain identifier; a space when the source record has none.
    pub chain_id: char,
    /// One-letter residue code from the record trailer; a space when absent.
    pub one_letter_code: char,
    /// Neighbor count from the record trailer.
    pub neighbor_count: i32,
    atoms: Vec<Atom>,
}

impl Residue {
    pub fn new(seq_plus_icode: &str, name: &str, chain_id: char) -> Self {
        Self {
            seq_plus_icode: seq_plus_icode.to_string(),
            name: name.to_string(),
            chain_id,
            one_letter_code: ' ',
            neighbor_count: 0,
            atoms: Vec::new(),
        }
    }

    pub fn push_atom(&mut self, atom: Atom) {
        self.atoms.push(atom);
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atoms_mut(&mut self) -> &mut [Atom] {
        &mut self.atoms
    }

    pub fn size(&self) -> usize {
        self.atoms.len()
    }
}
