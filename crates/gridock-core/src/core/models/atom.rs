use nalgebra::Point3;

/// Represents a single atom read from a coordinate record.
///
/// The atom name is kept exactly as it appears in columns 13-16 of the source
/// record (including its padding), because charge assignment and file output
/// both depend on the column-exact form.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The atom serial number from the source file.
    pub serial: i32,
    /// The raw four-character atom name (e.g., " CA ", " OD1").
    pub name: String,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
    /// The occupancy value from the source record.
    pub occupancy: f64,
    /// The temperature factor from the source record.
    pub temp_factor: f64,
    /// The partial charge in elementary charge units, zero until assigned.
    pub charge: f64,
}

impl Atom {
    /// Creates a new `Atom` with unit occupancy and no charge.
    ///
    /// # Arguments
    ///
    /// * `serial` - The serial number of the atom.
    /// * `name` - The raw atom name.
    /// * `position` - The 3D coordinates of the atom.
    pub fn new(serial: i32, name: &str, position: Point3<f64>) -> Self {
        Self {
            serial,
            name: name.to_string(),
            position,
            occupancy: 1.0,
            temp_factor: 0.0,
            charge: 0.0,
        }
    }

    /// Returns the atom name with its column padding removed.
    pub fn trimmed_name(&self) -> &str {
        self.name.trim()
    }
}
