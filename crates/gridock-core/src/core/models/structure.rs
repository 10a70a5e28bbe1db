use super::atom::Atom;
use super::residue::Residue;
use crate::core::rotations::EulerAngles;
use crate::core::utils::geometry::{centroid, euler_rotation, max_distance_from_origin};
use nalgebra::{Point3, Vector3};

const COMPLEX_IDENT: &str = "Complex";

/// A molecular structure: an identifier and the residues it owns.
///
/// Every transforming operation (`translate`, `translate_onto_origin`,
/// `rotate`, `merge`) returns a new, independently owned `Structure` and
/// leaves the receiver untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Structure {
    /// Identifier of the structure, usually the path it was read from.
    pub ident: String,
    residues: Vec<Residue>,
}

impl Structure {
    /// Creates an empty structure with the given identifier.
    pub fn new(ident: &str) -> Self {
        Self {
            ident: ident.to_string(),
            residues: Vec::new(),
        }
    }

    /// Appends a residue to the end of the structure.
    pub fn push_residue(&mut self, residue: Residue) {
        self.residues.push(residue);
    }

    /// Returns the residues in file order.
    pub fn residues(&self) -> &[Residue] {
        &self.residues
    }

    /// Returns mutable access to the residues in file order.
    pub fn residues_mut(&mut self) -> &mut [Residue] {
        &mut self.residues
    }

    /// Returns the number of residues.
    pub fn len(&self) -> usize {
        self.residues.len()
    }

    /// Returns `true` when the structure holds no residues.
    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    /// Iterates over every atom of every residue, in file order.
    pub fn atoms(&self) -> impl Iterator<Item = &Atom> {
        self.residues.iter().flat_map(|r| r.atoms().iter())
    }

    /// Returns the total number of atoms.
    pub fn atom_count(&self) -> usize {
        self.residues.iter().map(Residue::size).sum()
    }

    /// Returns a deep, independent copy of this structure.
    pub fn duplicate(&self) -> Self {
        self.clone()
    }

    /// Returns the mean position of all atoms, or `None` for an atomless structure.
    pub fn centroid(&self) -> Option<Point3<f64>> {
        centroid(self.atoms().map(|a| a.position))
    }

    /// Returns a copy with every atom shifted by `shift`.
    pub fn translate(&self, shift: &Vector3<f64>) -> Self {
        self.map_positions(|p| p + shift)
    }

    /// Returns a copy recentred so that the atom centroid lies on the origin.
    ///
    /// An atomless structure is returned unchanged.
    pub fn translate_onto_origin(&self) -> Self {
        match self.centroid() {
            Some(c) => self.translate(&(-c.coords)),
            None => self.duplicate(),
        }
    }

    /// Returns a copy rotated about the origin by the given Euler triple.
    ///
    /// See [`euler_rotation`] for the order in which the three twists apply.
    pub fn rotate(&self, angles: EulerAngles) -> Self {
        let rotation = euler_rotation(angles.z_twist, angles.theta, angles.phi);
        self.map_positions(|p| rotation * p)
    }

    /// Concatenates the residues of `self` and `other` into a new structure.
    pub fn merge(&self, other: &Structure) -> Self {
        let mut residues = Vec::with_capacity(self.len() + other.len());
        residues.extend(self.residues.iter().cloned());
        residues.extend(other.residues.iter().cloned());
        Self {
            ident: COMPLEX_IDENT.to_string(),
            residues,
        }
    }

    /// Returns the largest distance between the origin and any atom.
    pub fn radius(&self) -> f64 {
        max_distance_from_origin(self.atoms().map(|a| a.position))
    }

    fn map_positions(&self, f: impl Fn(&Point3<f64>) -> Point3<f64>) -> Self {
        let mut moved = self.duplicate();
        for residue in &mut moved.residues {
            for atom in residue.atoms_mut() {
                atom.position = f(&atom.position);
            }
        }
        moved
    }
}

/// Returns the physical edge length of a grid that holds both partners at any
/// relative orientation: `1 + 2 * (radius_static + radius_mobile)`.
///
/// Both structures are expected to be centred on the origin already.
pub fn total_span(static_structure: &Structure, mobile_structure: &Structure) -> f64 {
    1.0 + 2.0 * (static_structure.radius() + mobile_structure.radius())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_atom_structure(ident: &str, a: Point3<f64>, b: Point3<f64>) -> Structure {
        let mut residue = Residue::new("    1", "ALA", 'A');
        residue.push_atom(Atom::new(1, " N  ", a));
        residue.push_atom(Atom::new(2, " CA ", b));
        let mut structure = Structure::new(ident);
        structure.push_residue(residue);
        structure
    }

    fn positions(s: &Structure) -> Vec<Point3<f64>> {
        s.atoms().map(|a| a.position).collect()
    }

    fn assert_all_close(a: &[Point3<f64>], b: &[Point3<f64>]) {
        assert_eq!(a.len(), b.len());
        for (p, q) in a.iter().zip(b) {
            assert!((p - q).norm() < 1e-9, "{:?} != {:?}", p, q);
        }
    }

    #[test]
    fn translate_moves_every_atom_and_keeps_original() {
        let s = two_atom_structure("s", Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0));
        let moved = s.translate(&Vector3::new(1.0, 2.0, 3.0));

        assert_all_close(
            &positions(&moved),
            &[Point3::new(1.0, 2.0, 3.0), Point3::new(2.0, 2.0, 3.0)],
        );
        assert_all_close(
            &positions(&s),
            &[Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)],
        );
    }

    #[test]
    fn translate_onto_origin_then_restoring_centroid_round_trips() {
        let s = two_atom_structure("s", Point3::new(3.0, -1.0, 2.5), Point3::new(7.5, 4.0, -8.0));
        let centre = s.centroid().unwrap();

        let centred = s.translate_onto_origin();
        let c = centred.centroid().unwrap();
        assert!(c.coords.norm() < 1e-9);

        let restored = centred.translate(&centre.coords);
        assert_all_close(&positions(&restored), &positions(&s));
    }

    #[test]
    fn rotate_by_zero_is_identity() {
        let s = two_atom_structure("s", Point3::new(3.0, -1.0, 2.5), Point3::new(7.5, 4.0, -8.0));
        let rotated = s.rotate(EulerAngles::new(0, 0, 0));
        assert_all_close(&positions(&rotated), &positions(&s));
    }

    #[test]
    fn rotate_preserves_distance_from_origin() {
        let s = two_atom_structure("s", Point3::new(3.0, -1.0, 2.5), Point3::new(7.5, 4.0, -8.0));
        let rotated = s.rotate(EulerAngles::new(36, 72, 108));
        assert!((rotated.radius() - s.radius()).abs() < 1e-9);
    }

    #[test]
    fn duplicate_is_independent() {
        let s = two_atom_structure("s", Point3::origin(), Point3::new(1.0, 0.0, 0.0));
        let mut copy = s.duplicate();
        copy.residues_mut()[0].atoms_mut()[0].position = Point3::new(9.0, 9.0, 9.0);
        assert_eq!(s.atoms().next().unwrap().position, Point3::origin());
    }

    #[test]
    fn merge_concatenates_residues_under_complex_ident() {
        let a = two_atom_structure("a", Point3::origin(), Point3::new(1.0, 0.0, 0.0));
        let b = two_atom_structure("b", Point3::new(5.0, 0.0, 0.0), Point3::new(6.0, 0.0, 0.0));
        let complex = a.merge(&b);

        assert_eq!(complex.ident, "Complex");
        assert_eq!(complex.len(), 2);
        assert_eq!(complex.atom_count(), 4);
        assert_eq!(complex.residues()[1], b.residues()[0]);
    }

    #[test]
    fn radius_and_total_span_follow_docking_heuristic() {
        let a = two_atom_structure("a", Point3::new(-0.5, 0.0, 0.0), Point3::new(0.5, 0.0, 0.0));
        let b = two_atom_structure("b", Point3::new(0.0, -2.0, 0.0), Point3::new(0.0, 2.0, 0.0));
        assert!((a.radius() - 0.5).abs() < 1e-12);
        assert!((b.radius() - 2.0).abs() < 1e-12);
        assert!((total_span(&a, &b) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn empty_structure_has_no_centroid_and_zero_radius() {
        let s = Structure::new("empty");
        assert!(s.is_empty());
        assert!(s.centroid().is_none());
        assert_eq!(s.radius(), 0.0);
        assert_eq!(s.translate_onto_origin(), s);
    }
}
