use nalgebra::{Matrix3, Point3, Vector3};
use std::f64::consts::PI;

/// Orthorhombic periodic cell. An infinite edge length disables wrapping along that axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicBox {
    lengths: Vector3<f64>,
}

impl PeriodicBox {
    pub fn new(lengths: Vector3<f64>) -> Self {
        Self { lengths }
    }

    pub fn cubic(length: f64) -> Self {
        Self::new(Vector3::repeat(length))
    }

    pub fn non_periodic() -> Self {
        Self::new(Vector3::repeat(f64::INFINITY))
    }

    pub fn lengths(&self) -> &Vector3<f64> {
        &self.lengths
    }

    pub fn min_image(&self, v: Vector3<f64>) -> Vector3<f64> {
        v.zip_map(&self.lengths, |d, l| {
            if l.is_finite() {
                d - l * (d / l).round()
            } else {
                d
            }
        })
    }

    pub fn wrap(&self, p: Point3<f64>) -> Point3<f64> {
        Point3::from(p.coords.zip_map(&self.lengths, |x, l| {
            if l.is_finite() {
                x - l * (x / l).floor()
            } else {
                x
            }
        }))
    }

    pub fn wrap_all(&self, positions: &mut [Point3<f64>]) {
        for p in positions.iter_mut() {
            *p = self.wrap(*p);
        }
    }

    #[inline]
    pub fn dist_sq(&self, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
        self.min_image(a - b).norm_squared()
    }

    /// Angle at `vertex` formed with `a` and `c`, in radians.
    pub fn angle(&self, a: &Point3<f64>, vertex: &Point3<f64>, c: &Point3<f64>) -> f64 {
        let u = self.min_image(a - vertex);
        let w = self.min_image(c - vertex);
        u.angle(&w)
    }
}

/// Local growth frame anchored on the focus atom.
///
/// The z axis points from the focus towards `prev`, so the polar angle of a
/// new atom equals the bond angle `prev-focus-atom`. The x axis lies in the
/// plane of `prevprev`, putting a dihedral of zero in the cis position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Basis {
    origin: Point3<f64>,
    axes: Matrix3<f64>,
}

impl Basis {
    pub fn from_anchors(
        focus: Point3<f64>,
        prev: Option<Point3<f64>>,
        prevprev: Option<Point3<f64>>,
        sim_box: &PeriodicBox,
    ) -> Self {
        let Some(prev) = prev else {
            return Self {
                origin: focus,
                axes: Matrix3::identity(),
            };
        };

        let z = sim_box.min_image(prev - focus).normalize();
        let in_plane = prevprev
            .map(|pp| sim_box.min_image(pp - prev))
            .map(|r| r - z * z.dot(&r))
            .filter(|r| r.norm_squared() > 1e-20)
            .unwrap_or_else(|| reference_perpendicular(&z));
        let x = in_plane.normalize();
        let y = z.cross(&x);

        Self {
            origin: focus,
            axes: Matrix3::from_columns(&[x, y, z]),
        }
    }

    pub fn origin(&self) -> &Point3<f64> {
        &self.origin
    }

    /// Cartesian position for spherical coordinates in this frame.
    pub fn to_world(&self, bond: f64, theta: f64, phi: f64) -> Point3<f64> {
        let (sin_t, cos_t) = theta.sin_cos();
        let (sin_p, cos_p) = phi.sin_cos();
        let local = Vector3::new(sin_t * cos_p, sin_t * sin_p, cos_t) * bond;
        self.origin + self.axes * local
    }

    /// Spherical `(r, theta, phi)` of `p` in this frame, with `phi` in `[0, 2π)`.
    pub fn to_local(&self, p: &Point3<f64>, sim_box: &PeriodicBox) -> (f64, f64, f64) {
        let local = self.axes.transpose() * sim_box.min_image(p - self.origin);
        let r = local.norm();
        let theta = if r > 0.0 {
            (local.z / r).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        };
        let mut phi = local.y.atan2(local.x);
        if phi < 0.0 {
            phi += 2.0 * PI;
        }
        (r, theta, phi)
    }
}

fn reference_perpendicular(z: &Vector3<f64>) -> Vector3<f64> {
    let seed = if z.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    seed - z * z.dot(&seed)
}

/// Squared 1-3 distance across a bond angle (law of cosines).
#[inline]
pub fn angle_dist_sq(b1: f64, b2: f64, theta: f64) -> f64 {
    b1 * b1 + b2 * b2 - 2.0 * b1 * b2 * theta.cos()
}

/// Squared 1-4 distance along `prevprev-prev-focus-atom`.
///
/// `b0`, `b1`, `b2` are the three bond lengths in chain order, `theta1` the
/// angle at `prev`, `theta2` the angle at `focus`, and `phi` the dihedral.
pub fn dihedral_dist_sq(b0: f64, b1: f64, b2: f64, theta1: f64, theta2: f64, phi: f64) -> f64 {
    let (s1, c1) = theta1.sin_cos();
    let (s2, c2) = theta2.sin_cos();
    let (sp, cp) = phi.sin_cos();
    let dx = b0 * s1 - b2 * s2 * cp;
    let dy = b2 * s2 * sp;
    let dz = b1 - b0 * c1 - b2 * c2;
    dx * dx + dy * dy + dz * dz
}
