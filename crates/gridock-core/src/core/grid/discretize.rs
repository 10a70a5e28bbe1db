use super::Grid;
use crate::core::models::structure::Structure;
use nalgebra::Point3;

/// Radius in Angstroms of the solid core painted around every atom.
pub const CORE_RADIUS: f64 = 1.8;

/// Value of a voxel that lies inside the core of at least one atom.
pub const OCCUPIED: f64 = 1.0;

/// Rasterizes `structure` onto `grid`.
///
/// The grid is cleared first. Every voxel whose centre lies strictly closer
/// than [`CORE_RADIUS`] to an atom is set to [`OCCUPIED`]; everything else is 0.
/// Atoms outside the grid only paint the voxels that fall inside it.
pub fn discretize(structure: &Structure, grid: &mut Grid) {
    grid.clear();
    let geometry = *grid.geometry();
    let n = geometry.size() as i64;
    let reach = (CORE_RADIUS / geometry.cell_span() + 1.5) as i64;
    let radius_sq = CORE_RADIUS * CORE_RADIUS;

    for atom in structure.atoms() {
        let p = atom.position;
        let ox = geometry.ordinate(p.x);
        let oy = geometry.ordinate(p.y);
        let oz = geometry.ordinate(p.z);

        let (x_lo, x_hi) = axis_window(ox, reach, n);
        let (y_lo, y_hi) = axis_window(oy, reach, n);
        let (z_lo, z_hi) = axis_window(oz, reach, n);

        for x in x_lo..=x_hi {
            let cx = geometry.centre(x);
            for y in y_lo..=y_hi {
                let cy = geometry.centre(y);
                for z in z_lo..=z_hi {
                    let centre = Point3::new(cx, cy, geometry.centre(z));
                    if (centre - p).norm_squared() < radius_sq {
                        grid.set(x, y, z, OCCUPIED);
                    }
                }
            }
        }
    }
}

// Empty windows come back as (1, 0) so the inclusive loops above never run.
fn axis_window(ordinate: i64, reach: i64, n: i64) -> (usize, usize) {
    let lo = (ordinate - reach).max(0);
    let hi = (ordinate + reach).min(n - 1);
    if lo > hi { (1, 0) } else { (lo as usize, hi as usize) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::GridGeometry;
    use crate::core::models::atom::Atom;
    use crate::core::models::residue::Residue;

    fn single_atom(position: Point3<f64>) -> Structure {
        let mut residue = Residue::new("    1", "GLY", 'A');
        residue.push_atom(Atom::new(1, " CA ", position));
        let mut s = Structure::new("one");
        s.push_residue(residue);
        s
    }

    #[test]
    fn atom_at_origin_fills_a_sphere_of_core_radius() {
        let geometry = GridGeometry::new(20, 10.0).unwrap();
        let mut grid = Grid::new(geometry).unwrap();
        discretize(&single_atom(Point3::origin()), &mut grid);

        let mut expected = 0;
        for x in 0..20 {
            for y in 0..20 {
                for z in 0..20 {
                    let c = Point3::new(geometry.centre(x), geometry.centre(y), geometry.centre(z));
                    let inside = c.coords.norm() < CORE_RADIUS;
                    assert_eq!(grid.get(x, y, z) == OCCUPIED, inside);
                    expected += inside as usize;
                }
            }
        }
        assert!(expected > 0);
        assert_eq!(grid.count_equal(OCCUPIED), expected);
    }

    #[test]
    fn previous_contents_are_cleared() {
        let geometry = GridGeometry::new(8, 8.0).unwrap();
        let mut grid = Grid::new(geometry).unwrap();
        grid.data_mut().fill(7.0);
        discretize(&Structure::new("empty"), &mut grid);
        assert_eq!(grid.count_equal(0.0), geometry.len());
    }

    #[test]
    fn atoms_outside_the_grid_are_clipped_without_panicking() {
        let geometry = GridGeometry::new(8, 8.0).unwrap();
        let mut grid = Grid::new(geometry).unwrap();
        discretize(&single_atom(Point3::new(4.5, 0.0, 0.0)), &mut grid);
        assert!(grid.count_equal(OCCUPIED) > 0);
        assert_eq!(grid.get(0, 4, 4), 0.0);

        discretize(&single_atom(Point3::new(100.0, 0.0, 0.0)), &mut grid);
        assert_eq!(grid.count_equal(OCCUPIED), 0);
    }
}
