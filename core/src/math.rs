//! Math type aliases and helper functions.
//!
//! All rendering math is `f32` and column-major, matching what graphics APIs
//! expect when a matrix is uploaded as a flat array.

pub use nalgebra;

/// 2D vector (f32).
pub type Vec2 = nalgebra::Vector2<f32>;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// 4D vector (f32).
pub type Vec4 = nalgebra::Vector4<f32>;

/// 4x4 matrix (f32).
pub type Mat4 = nalgebra::Matrix4<f32>;

/// Build a translation matrix.
pub fn mat4_from_translation(translation: Vec3) -> Mat4 {
    Mat4::new_translation(&translation)
}

/// Build a right-handed perspective projection with depth range [-1, 1] (OpenGL convention).
pub fn perspective_rh_gl(yfov: f32, aspect: f32, znear: f32, zfar: f32) -> Mat4 {
    let f = 1.0 / (yfov / 2.0).tan();
    let nf = 1.0 / (znear - zfar);
    #[rustfmt::skip]
    let result = Mat4::new(
        f / aspect, 0.0, 0.0,                   0.0,
        0.0,        f,   0.0,                   0.0,
        0.0,        0.0, (zfar + znear) * nf,   2.0 * zfar * znear * nf,
        0.0,        0.0, -1.0,                  0.0,
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_is_column_major() {
        let m = mat4_from_translation(Vec3::new(1.0, 2.0, 3.0));
        // Translation lives in the last column, i.e. elements 12..15 of the flat slice.
        assert_eq!(&m.as_slice()[12..15], &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_perspective_maps_near_plane() {
        let p = perspective_rh_gl(std::f32::consts::FRAC_PI_2, 1.0, 1.0, 100.0);
        let clip = p * Vec4::new(0.0, 0.0, -1.0, 1.0);
        assert!((clip.z / clip.w + 1.0).abs() < 1e-5);
    }
}
