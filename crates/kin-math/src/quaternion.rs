//! Unit quaternions for device orientation.
//!
//! Follows the device-orientation convention: intrinsic Z-X-Y rotation
//! order with alpha about z, beta about x and gamma about y, angles in
//! degrees as the legacy events deliver them.

use crate::vec::Vec3;

const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;

/// A rotation stored as `[x, y, z, w]` components.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    /// No rotation.
    pub const IDENTITY: Quaternion = Quaternion {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Builds the orientation quaternion from device Euler angles in
    /// degrees, composed in Z-X-Y order.
    pub fn from_euler(alpha: f64, beta: f64, gamma: f64) -> Self {
        let half_z = alpha * DEG_TO_RAD / 2.0;
        let half_x = beta * DEG_TO_RAD / 2.0;
        let half_y = gamma * DEG_TO_RAD / 2.0;
        let (sx, cx) = half_x.sin_cos();
        let (sy, cy) = half_y.sin_cos();
        let (sz, cz) = half_z.sin_cos();
        Self {
            x: sx * cy * cz - cx * sy * sz,
            y: cx * sy * cz + sx * cy * sz,
            z: cx * cy * sz + sx * sy * cz,
            w: cx * cy * cz - sx * sy * sz,
        }
    }

    /// Hamilton product `self * other`; applies `other` first.
    pub fn multiply(&self, other: &Quaternion) -> Self {
        Self {
            x: self.w * other.x + self.x * other.w + self.y * other.z - self.z * other.y,
            y: self.w * other.y - self.x * other.z + self.y * other.w + self.z * other.x,
            z: self.w * other.z + self.x * other.y - self.y * other.x + self.z * other.w,
            w: self.w * other.w - self.x * other.x - self.y * other.y - self.z * other.z,
        }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    /// Returns the normalized quaternion, or identity when the magnitude
    /// is zero so downstream transforms never see NaN components.
    pub fn normalize(&self) -> Self {
        let magnitude = self.magnitude();
        if magnitude == 0.0 {
            return Self::IDENTITY;
        }
        Self {
            x: self.x / magnitude,
            y: self.y / magnitude,
            z: self.z / magnitude,
            w: self.w / magnitude,
        }
    }

    /// Rotates by `angle` radians about `axis` and renormalizes the result.
    pub fn rotate_axis_angle(&self, axis: [f64; 3], angle: f64) -> Self {
        let half = angle / 2.0;
        let s = half.sin();
        let rotation = Quaternion {
            x: axis[0] * s,
            y: axis[1] * s,
            z: axis[2] * s,
            w: half.cos(),
        };
        self.multiply(&rotation).normalize()
    }

    /// Applies the rotation to a vector.
    pub fn rotate_vec(&self, v: Vec3) -> Vec3 {
        let u = Vec3::new(self.x, self.y, self.z);
        let t = u.cross(&v).add(&v.scale(self.w));
        v.add(&u.cross(&t).scale(2.0))
    }

    /// Writes the rotation into a caller-allocated 4x4 column-major matrix.
    pub fn write_matrix(&self, out: &mut [f64; 16]) {
        let (x, y, z, w) = (self.x, self.y, self.z, self.w);
        out[0] = 1.0 - 2.0 * (y * y + z * z);
        out[1] = 2.0 * (x * y + w * z);
        out[2] = 2.0 * (x * z - w * y);
        out[3] = 0.0;
        out[4] = 2.0 * (x * y - w * z);
        out[5] = 1.0 - 2.0 * (x * x + z * z);
        out[6] = 2.0 * (y * z + w * x);
        out[7] = 0.0;
        out[8] = 2.0 * (x * z + w * y);
        out[9] = 2.0 * (y * z - w * x);
        out[10] = 1.0 - 2.0 * (x * x + y * y);
        out[11] = 0.0;
        out[12] = 0.0;
        out[13] = 0.0;
        out[14] = 0.0;
        out[15] = 1.0;
    }

    pub fn components(&self) -> [f64; 4] {
        [self.x, self.y, self.z, self.w]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "expected {b}, got {a}");
    }

    fn assert_quat_close(a: &Quaternion, b: &Quaternion) {
        assert_close(a.x, b.x);
        assert_close(a.y, b.y);
        assert_close(a.z, b.z);
        assert_close(a.w, b.w);
    }

    #[test]
    fn zero_angles_give_identity() {
        assert_quat_close(&Quaternion::from_euler(0.0, 0.0, 0.0), &Quaternion::IDENTITY);
    }

    #[test]
    fn from_euler_always_unit_length() {
        for &(alpha, beta, gamma) in &[
            (0.0, 0.0, 0.0),
            (90.0, 0.0, 0.0),
            (123.0, -45.0, 77.0),
            (359.0, 89.0, -89.0),
            (720.0, 180.0, 360.0),
        ] {
            let q = Quaternion::from_euler(alpha, beta, gamma);
            assert_close(q.magnitude(), 1.0);
        }
    }

    #[test]
    fn from_euler_composes_z_then_x_then_y() {
        let composed = Quaternion::from_euler(30.0, 0.0, 0.0)
            .multiply(&Quaternion::from_euler(0.0, 40.0, 0.0))
            .multiply(&Quaternion::from_euler(0.0, 0.0, 50.0));
        let direct = Quaternion::from_euler(30.0, 40.0, 50.0);
        assert_quat_close(&composed, &direct);
    }

    #[test]
    fn alpha_rotates_about_z() {
        let q = Quaternion::from_euler(90.0, 0.0, 0.0);
        let v = q.rotate_vec(Vec3::new(0.0, 1.0, 0.0));
        assert_close(v.x, -1.0);
        assert_close(v.y, 0.0);
        assert_close(v.z, 0.0);
    }

    #[test]
    fn beta_rotates_about_x() {
        let q = Quaternion::from_euler(0.0, 90.0, 0.0);
        let v = q.rotate_vec(Vec3::new(0.0, 1.0, 0.0));
        assert_close(v.x, 0.0);
        assert_close(v.y, 0.0);
        assert_close(v.z, 1.0);
    }

    #[test]
    fn gamma_rotates_about_y() {
        let q = Quaternion::from_euler(0.0, 0.0, 90.0);
        let v = q.rotate_vec(Vec3::new(0.0, 0.0, 1.0));
        assert_close(v.x, 1.0);
        assert_close(v.y, 0.0);
        assert_close(v.z, 0.0);
    }

    #[test]
    fn rotate_axis_angle_stays_unit_length() {
        let q = Quaternion::from_euler(10.0, 20.0, 30.0);
        let rotated = q.rotate_axis_angle([0.0, 0.0, 1.0], -1.234);
        assert_close(rotated.magnitude(), 1.0);
    }

    #[test]
    fn rotate_axis_angle_by_zero_is_identity_rotation() {
        let q = Quaternion::from_euler(10.0, 20.0, 30.0);
        let rotated = q.rotate_axis_angle([0.0, 0.0, 1.0], 0.0);
        assert_quat_close(&rotated, &q);
    }

    #[test]
    fn degenerate_quaternion_normalizes_to_identity() {
        let zero = Quaternion::new(0.0, 0.0, 0.0, 0.0);
        assert_quat_close(&zero.normalize(), &Quaternion::IDENTITY);
        let rotated = zero.rotate_axis_angle([0.0, 0.0, 1.0], 1.0);
        assert_close(rotated.magnitude(), 1.0);
    }

    #[test]
    fn identity_matrix_for_identity_quaternion() {
        let mut m = [f64::NAN; 16];
        Quaternion::IDENTITY.write_matrix(&mut m);
        for row in 0..4 {
            for col in 0..4 {
                let expected = if row == col { 1.0 } else { 0.0 };
                assert_close(m[col * 4 + row], expected);
            }
        }
    }

    #[test]
    fn matrix_columns_match_rotated_basis_vectors() {
        let q = Quaternion::from_euler(30.0, 40.0, 50.0);
        let mut m = [0.0; 16];
        q.write_matrix(&mut m);
        let ex = q.rotate_vec(Vec3::new(1.0, 0.0, 0.0));
        let ey = q.rotate_vec(Vec3::new(0.0, 1.0, 0.0));
        let ez = q.rotate_vec(Vec3::new(0.0, 0.0, 1.0));
        assert_close(m[0], ex.x);
        assert_close(m[1], ex.y);
        assert_close(m[2], ex.z);
        assert_close(m[4], ey.x);
        assert_close(m[5], ey.y);
        assert_close(m[6], ey.z);
        assert_close(m[8], ez.x);
        assert_close(m[9], ez.y);
        assert_close(m[10], ez.z);
    }
}
