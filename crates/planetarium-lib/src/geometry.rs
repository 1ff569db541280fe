//! Utility functions for sky coordinate conversions and angular distances
//!
//! Catalog directions are Cartesian vectors in the equatorial frame (+X toward the vernal
//! equinox, +Z toward the north celestial pole). The spatial index works on a geographic
//! representation of the same sphere: latitude = declination, longitude = right ascension,
//! both in radians. Geographic points use `geo::Point` with `x = longitude` and `y = latitude`.

use geo::{Coord, LineString, Point, Polygon};
use nalgebra::Vector3;
use std::f64::consts::{PI, TAU};

/// Vectors shorter than this cannot be normalized into a direction
const MIN_NORM: f64 = 1e-12;

/// Normalize a direction vector, returning `None` for a zero or non-finite vector
#[inline]
pub fn normalize(v: &Vector3<f64>) -> Option<Vector3<f64>> {
    let norm = v.norm();
    if !norm.is_finite() || norm < MIN_NORM {
        return None;
    }
    Some(v / norm)
}

/// Convert a Cartesian direction to (latitude, longitude) in radians
///
/// The vector does not need to be unit length. Returns `None` for a zero vector.
/// Latitude is `asin(z)` in [-π/2, π/2] and longitude is `atan2(y, x)` in (-π, π].
#[inline]
pub fn cartesian_to_lat_lon(v: &Vector3<f64>) -> Option<(f64, f64)> {
    let unit = normalize(v)?;
    let lat = unit.z.clamp(-1.0, 1.0).asin();
    let lon = unit.y.atan2(unit.x);
    Some((lat, lon))
}

/// Convert (latitude, longitude) in radians to a unit Cartesian direction
#[inline]
pub fn lat_lon_to_cartesian(lat: f64, lon: f64) -> Vector3<f64> {
    let cos_lat = lat.cos();
    Vector3::new(cos_lat * lon.cos(), cos_lat * lon.sin(), lat.sin())
}

/// Convert right ascension (hours) and declination (degrees) to a unit direction
#[inline]
pub fn ra_dec_to_cartesian(ra_hours: f64, dec_deg: f64) -> Vector3<f64> {
    lat_lon_to_cartesian(dec_deg.to_radians(), (ra_hours * 15.0).to_radians())
}

/// Euclidean distance between two unit direction vectors
#[inline]
pub fn chord_distance(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    (a - b).norm()
}

/// Convert a unit-sphere chord length to the great-circle angle it subtends, in radians
#[inline]
pub fn chord_to_angle(chord: f64) -> f64 {
    2.0 * (chord / 2.0).clamp(0.0, 1.0).asin()
}

/// Exact angular separation between two directions in radians
///
/// Both inputs are normalized first; returns `None` if either is a zero vector.
#[inline]
pub fn angular_separation(a: &Vector3<f64>, b: &Vector3<f64>) -> Option<f64> {
    let a = normalize(a)?;
    let b = normalize(b)?;
    Some(chord_to_angle(chord_distance(&a, &b)))
}

/// Wrap a longitude in radians into [-π, π)
#[inline]
pub fn wrap_longitude(lon: f64) -> f64 {
    (lon + PI).rem_euclid(TAU) - PI
}

/// Build a geographic point from latitude and longitude in radians
#[inline(always)]
pub fn lat_lon_point(lat: f64, lon: f64) -> Point<f64> {
    Point::new(lon, lat)
}

/// Build a closed polygon from viewport corners given as geographic points
///
/// Longitudes are unwrapped so that a viewport straddling the ±π meridian becomes a
/// contiguous planar polygon; the resulting longitudes may exceed π.
pub fn viewport_polygon(corners: &[Point<f64>]) -> Polygon<f64> {
    let mut coords: Vec<Coord<f64>> = corners.iter().map(|p| p.0).collect();

    let min_lon = coords.iter().map(|c| c.x).fold(f64::INFINITY, f64::min);
    let max_lon = coords.iter().map(|c| c.x).fold(f64::NEG_INFINITY, f64::max);
    if max_lon - min_lon > PI {
        for coord in &mut coords {
            if coord.x < 0.0 {
                coord.x += TAU;
            }
        }
    }

    Polygon::new(LineString::from(coords), vec![])
}
