use nalgebra::{Point3, Rotation3, Vector3};

/// Degree-to-radian factor shared by rotation matrices and angle sampling.
/// Rotation counts and matrices in existing score logs depend on this exact
/// value, so it is not `f64::to_radians`.
pub const DEG_TO_RAD: f64 = 0.017453293;

fn radians(degrees: i32) -> f64 {
    f64::from(degrees) * DEG_TO_RAD
}

/// Builds the rigid rotation for an integer Euler triple in degrees.
///
/// The composition applies a twist about z by `z_twist`, then a tilt in the
/// x-z plane by `theta`, then a second twist about z by `phi`:
/// `R = Rz(phi) * Ry(theta) * Rz(z_twist)`.
pub fn euler_rotation(z_twist: i32, theta: i32, phi: i32) -> Rotation3<f64> {
    let z_axis = Vector3::z_axis();
    let y_axis = Vector3::y_axis();

    let twist = Rotation3::from_axis_angle(&z_axis, radians(z_twist));
    let tilt = Rotation3::from_axis_angle(&y_axis, radians(theta));
    let spin = Rotation3::from_axis_angle(&z_axis, radians(phi));

    spin * tilt * twist
}

pub fn centroid(points: impl IntoIterator<Item = Point3<f64>>) -> Option<Point3<f64>> {
    let mut sum = Vector3::zeros();
    let mut count = 0usize;
    for p in points {
        sum += p.coords;
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some(Point3::from(sum / count as f64))
    }
}

pub fn max_distance_from_origin(points: impl IntoIterator<Item = Point3<f64>>) -> f64 {
    points
        .into_iter()
        .map(|p| p.coords.norm_squared())
        .fold(0.0, f64::max)
        .sqrt()
}
