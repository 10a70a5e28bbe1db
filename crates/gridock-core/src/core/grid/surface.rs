use super::Grid;
use super::discretize::OCCUPIED;

/// Value of a voxel in the surface shell around the core.
pub const SURFACE: f64 = 1.0;

// Stand-in for "no occupied voxel on this line"; large enough to dominate any
// real squared distance without overflowing the envelope arithmetic.
const FAR: f64 = 1e20;

/// Turns a discretized grid into a shape-complementarity potential.
///
/// Every empty voxel whose centre lies strictly closer than `thickness`
/// Angstroms to the centre of an occupied voxel becomes [`SURFACE`]. Every
/// occupied voxel receives `internal_value`. All other voxels stay 0.
///
/// Distances come from an exact Euclidean distance transform, so the cost is
/// linear in the number of voxels regardless of `thickness`.
pub fn surface(grid: &mut Grid, thickness: f64, internal_value: f64) {
    let geometry = *grid.geometry();
    let cell = geometry.cell_span();
    let limit = (thickness / cell).powi(2);

    let distances = squared_distance_to_core(grid);
    for (value, d2) in grid.data_mut().iter_mut().zip(distances) {
        *value = if *value == OCCUPIED {
            internal_value
        } else if d2 < limit {
            SURFACE
        } else {
            0.0
        };
    }
}

/// Number of surface-shell voxels in a surfaced grid.
pub fn shell_voxel_count(grid: &Grid) -> usize {
    grid.count_equal(SURFACE)
}

/// Squared distance, in cell units, from every voxel to the nearest occupied one.
fn squared_distance_to_core(grid: &Grid) -> Vec<f64> {
    let n = grid.geometry().size();
    let mut dist: Vec<f64> = grid
        .data()
        .iter()
        .map(|&v| if v == OCCUPIED { 0.0 } else { FAR })
        .collect();

    let mut envelope = Envelope::new(n);
    // Separable: z lines, then y lines, then x lines.
    for x in 0..n {
        for y in 0..n {
            envelope.run_line(&mut dist, (x * n + y) * n, 1);
        }
    }
    for x in 0..n {
        for z in 0..n {
            envelope.run_line(&mut dist, x * n * n + z, n);
        }
    }
    for y in 0..n {
        for z in 0..n {
            envelope.run_line(&mut dist, y * n + z, n * n);
        }
    }
    dist
}

/// Lower envelope of parabolas for the 1D squared distance transform.
struct Envelope {
    line: Vec<f64>,
    sites: Vec<usize>,
    bounds: Vec<f64>,
}

impl Envelope {
    fn new(n: usize) -> Self {
        Self {
            line: vec![0.0; n],
            sites: vec![0; n],
            bounds: vec![0.0; n + 1],
        }
    }

    fn run_line(&mut self, dist: &mut [f64], base: usize, stride: usize) {
        let n = self.line.len();
        for k in 0..n {
            self.line[k] = dist[base + k * stride];
        }
        let f = &self.line;

        let mut k = 0usize;
        self.sites[0] = 0;
        self.bounds[0] = f64::NEG_INFINITY;
        self.bounds[1] = f64::INFINITY;
        for q in 1..n {
            let mut s = intersection(f, q, self.sites[k]);
            while s <= self.bounds[k] {
                k -= 1;
                s = intersection(f, q, self.sites[k]);
            }
            k += 1;
            self.sites[k] = q;
            self.bounds[k] = s;
            self.bounds[k + 1] = f64::INFINITY;
        }

        k = 0;
        for q in 0..n {
            while self.bounds[k + 1] < q as f64 {
                k += 1;
            }
            let p = self.sites[k];
            let d = q as f64 - p as f64;
            dist[base + q * stride] = d * d + f[p];
        }
    }
}

fn intersection(f: &[f64], q: usize, p: usize) -> f64 {
    let (qf, pf) = (q as f64, p as f64);
    ((f[q] + qf * qf) - (f[p] + pf * pf)) / (2.0 * qf - 2.0 * pf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::GridGeometry;
    use crate::core::grid::discretize::discretize;
    use crate::core::models::atom::Atom;
    use crate::core::models::residue::Residue;
    use crate::core::models::structure::Structure;
    use nalgebra::Point3;

    fn structure(points: &[Point3<f64>]) -> Structure {
        let mut residue = Residue::new("    1", "ALA", 'A');
        for (i, p) in points.iter().enumerate() {
            residue.push_atom(Atom::new(i as i32 + 1, " CA ", *p));
        }
        let mut s = Structure::new("test");
        s.push_residue(residue);
        s
    }

    fn brute_force_surface(core: &Grid, thickness: f64, internal: f64) -> Vec<f64> {
        let g = *core.geometry();
        let n = g.size();
        let mut out = vec![0.0; g.len()];
        for x in 0..n {
            for y in 0..n {
                for z in 0..n {
                    let i = g.index(x, y, z);
                    if core.data()[i] == OCCUPIED {
                        out[i] = internal;
                        continue;
                    }
                    let c = Point3::new(g.centre(x), g.centre(y), g.centre(z));
                    let near = (0..n).any(|a| {
                        (0..n).any(|b| {
                            (0..n).any(|d| {
                                core.get(a, b, d) == OCCUPIED
                                    && (Point3::new(g.centre(a), g.centre(b), g.centre(d)) - c)
                                        .norm()
                                        < thickness
                            })
                        })
                    });
                    if near {
                        out[i] = SURFACE;
                    }
                }
            }
        }
        out
    }

    #[test]
    fn surface_matches_brute_force_dilation() {
        let geometry = GridGeometry::new(12, 12.0).unwrap();
        let mut grid = Grid::new(geometry).unwrap();
        discretize(
            &structure(&[Point3::new(-1.2, 0.3, 0.0), Point3::new(1.4, -0.6, 0.9)]),
            &mut grid,
        );
        let expected = brute_force_surface(&grid, 1.7, -15.0);

        surface(&mut grid, 1.7, -15.0);
        assert_eq!(grid.data(), expected.as_slice());
    }

    #[test]
    fn core_voxels_receive_the_internal_value() {
        let geometry = GridGeometry::new(16, 16.0).unwrap();
        let mut grid = Grid::new(geometry).unwrap();
        discretize(&structure(&[Point3::origin()]), &mut grid);
        let core = grid.count_equal(OCCUPIED);

        surface(&mut grid, 1.3, -15.0);
        assert_eq!(grid.count_equal(-15.0), core);
        assert!(shell_voxel_count(&grid) > 0);
    }

    #[test]
    fn thicker_shells_never_shrink() {
        let geometry = GridGeometry::new(24, 18.0).unwrap();
        let s = structure(&[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.5, 1.0, -0.5),
            Point3::new(-3.0, 2.0, 1.5),
        ]);

        let mut previous = 0;
        for tenths in 0..=40 {
            let mut grid = Grid::new(geometry).unwrap();
            discretize(&s, &mut grid);
            surface(&mut grid, f64::from(tenths) * 0.1, -15.0);
            let count = shell_voxel_count(&grid);
            assert!(count >= previous, "thickness {} shrank the shell", tenths);
            previous = count;
        }
        assert!(previous > 0);
    }

    #[test]
    fn empty_grid_stays_empty() {
        let geometry = GridGeometry::new(8, 8.0).unwrap();
        let mut grid = Grid::new(geometry).unwrap();
        surface(&mut grid, 3.0, -15.0);
        assert_eq!(grid.count_equal(0.0), geometry.len());
    }
}
