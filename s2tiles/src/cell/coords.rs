//! Coordinate systems of the cube-sphere.
//!
//! Every point can be expressed in several frames:
//!
//! ```text
//! (face, i, j)   integer leaf grid, [0, 2^30)
//!      │ ij_to_st / st_to_ij
//! (face, s, t)   area-equalised parametric space, [0, 1]
//!      │ st_to_uv / uv_to_st   (quadratic warp)
//! (face, u, v)   cube face plane, [-1, 1]
//!      │ face_uv_to_xyz / xyz_to_face_uv
//! (x, y, z)      point in R^3 (not necessarily unit length)
//!      │ xyz_to_lon_lat / lon_lat_to_xyz
//! (lon, lat)     degrees
//! ```

use super::MAX_LEVEL;

/// A point in R^3.
pub type Xyz = [f64; 3];

/// Number of leaf cells along one edge of a face.
pub const MAX_SIZE: u32 = 1 << MAX_LEVEL;

/// Converts an S or T value to the matching U or V value.
#[inline]
pub fn st_to_uv(s: f64) -> f64 {
    if s >= 0.5 {
        (1.0 / 3.0) * (4.0 * s * s - 1.0)
    } else {
        (1.0 / 3.0) * (1.0 - 4.0 * (1.0 - s) * (1.0 - s))
    }
}

/// Inverse of [`st_to_uv`].
#[inline]
pub fn uv_to_st(u: f64) -> f64 {
    if u >= 0.0 {
        0.5 * (1.0 + 3.0 * u).sqrt()
    } else {
        1.0 - 0.5 * (1.0 - 3.0 * u).sqrt()
    }
}

/// Leaf-level grid coordinate containing `s`, clamped to the face.
#[inline]
pub fn st_to_ij(s: f64) -> u32 {
    let scaled = (MAX_SIZE as f64 * s).floor();
    scaled.max(0.0).min((MAX_SIZE - 1) as f64) as u32
}

/// S or T value of the lower edge of leaf `i`.
#[inline]
pub fn ij_to_st(i: u32) -> f64 {
    i as f64 / MAX_SIZE as f64
}

/// Converts a half-leaf coordinate (`si = 2 * i + delta`) to S or T.
#[inline]
pub fn siti_to_st(si: u64) -> f64 {
    si as f64 / (1u64 << (MAX_LEVEL + 1)) as f64
}

/// Places face-local `(u, v)` on the cube surface.
#[inline]
pub fn face_uv_to_xyz(face: u8, u: f64, v: f64) -> Xyz {
    match face {
        0 => [1.0, u, v],
        1 => [-u, 1.0, v],
        2 => [-u, -v, 1.0],
        3 => [-1.0, -v, -u],
        4 => [v, -1.0, -u],
        5 => [v, u, -1.0],
        _ => panic!("invalid cube face {face}"),
    }
}

/// Projects `xyz` onto `face`. The point must be in that face's hemisphere.
#[inline]
pub fn face_xyz_to_uv(face: u8, xyz: Xyz) -> (f64, f64) {
    let [x, y, z] = xyz;
    match face {
        0 => (y / x, z / x),
        1 => (-x / y, z / y),
        2 => (-x / z, -y / z),
        3 => (z / x, y / x),
        4 => (z / y, -x / y),
        5 => (-y / z, -x / z),
        _ => panic!("invalid cube face {face}"),
    }
}

/// Face whose axis has the largest absolute component of `xyz`.
#[inline]
pub fn xyz_to_face(xyz: Xyz) -> u8 {
    let [ax, ay, az] = xyz.map(f64::abs);
    let mut face: u8 = if ax > ay {
        if ax > az {
            0
        } else {
            2
        }
    } else if ay > az {
        1
    } else {
        2
    };
    if xyz[face as usize] < 0.0 {
        face += 3;
    }
    face
}

#[inline]
pub fn xyz_to_face_uv(xyz: Xyz) -> (u8, f64, f64) {
    let face = xyz_to_face(xyz);
    let (u, v) = face_xyz_to_uv(face, xyz);
    (face, u, v)
}

/// Longitude/latitude in degrees of `xyz`.
pub fn xyz_to_lon_lat(xyz: Xyz) -> (f64, f64) {
    let [x, y, z] = xyz;
    let lon = y.atan2(x).to_degrees();
    let lat = z.atan2((x * x + y * y).sqrt()).to_degrees();
    (lon, lat)
}

/// Unit vector for a longitude/latitude in degrees.
pub fn lon_lat_to_xyz(lon: f64, lat: f64) -> Xyz {
    let (lon, lat) = (lon.to_radians(), lat.to_radians());
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}

pub(crate) fn normalize(xyz: Xyz) -> Xyz {
    let len = (xyz[0] * xyz[0] + xyz[1] * xyz[1] + xyz[2] * xyz[2]).sqrt();
    if len == 0.0 {
        return xyz;
    }
    xyz.map(|c| c / len)
}
