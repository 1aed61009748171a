//! Spatial math for great-circle distances, headings and projections.

/// Mean earth radius in feet.
pub const EARTH_RADIUS_FT: f64 = 20_925_524.9;

/// Feet per nautical mile.
pub const NMI_TO_FT: f64 = 6_076.115_49;

/// Feet-per-second per knot.
pub const KT_TO_FPS: f64 = 1.687_809_86;

/// Great-circle distance between two points in feet.
///
/// The sphere radius is inflated by the given altitude so that distances
/// flown at cruise level are slightly longer than surface distances.
///
/// # Arguments
/// * `lat1`, `lon1` - First point coordinates in decimal degrees
/// * `lat2`, `lon2` - Second point coordinates in decimal degrees
/// * `alt_ft` - Altitude above the surface in feet
///
/// # Returns
/// Distance in feet
pub fn distance_gc(lat1: f64, lon1: f64, lat2: f64, lon2: f64, alt_ft: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * (EARTH_RADIUS_FT + alt_ft) * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Initial great-circle heading from point 1 to point 2.
/// Returns degrees in [0, 360), 0 = north, 90 = east.
pub fn heading_gc(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let x = delta_lambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    let mut heading = x.atan2(y).to_degrees();
    while heading < 0.0 {
        heading += 360.0;
    }
    while heading >= 360.0 {
        heading -= 360.0;
    }
    heading
}

/// Point at the given distance along the given heading from a start point.
///
/// # Arguments
/// * `lat`, `lon` - Starting position in degrees
/// * `distance_ft` - Distance in feet
/// * `heading_deg` - Heading in degrees, 0 = north, 90 = east
/// * `alt_ft` - Altitude in feet, consistent with [`distance_gc`]
///
/// # Returns
/// (new_lat, new_lon) in degrees
pub fn location_gc(lat: f64, lon: f64, distance_ft: f64, heading_deg: f64, alt_ft: f64) -> (f64, f64) {
    if distance_ft.abs() <= f64::EPSILON {
        return (lat, lon);
    }

    let lat1 = lat.to_radians();
    let lon1 = lon.to_radians();
    let bearing_rad = heading_deg.to_radians();
    let angular_distance = distance_ft / (EARTH_RADIUS_FT + alt_ft);

    let sin_lat1 = lat1.sin();
    let cos_lat1 = lat1.cos();
    let sin_ad = angular_distance.sin();
    let cos_ad = angular_distance.cos();

    let sin_lat2 = sin_lat1 * cos_ad + cos_lat1 * sin_ad * bearing_rad.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();

    let y = bearing_rad.sin() * sin_ad * cos_lat1;
    let x = cos_ad - sin_lat1 * sin_lat2;
    let mut lon2 = lon1 + y.atan2(x);
    lon2 =
        (lon2 + std::f64::consts::PI).rem_euclid(2.0 * std::f64::consts::PI) - std::f64::consts::PI;

    (lat2.to_degrees(), lon2.to_degrees())
}

/// Signed turn angle in degrees between two consecutive headings,
/// normalized to (-180, 180].
pub fn turn_angle_deg(heading_from_deg: f64, heading_to_deg: f64) -> f64 {
    let mut dtheta = heading_to_deg - heading_from_deg;
    while dtheta > 180.0 {
        dtheta -= 360.0;
    }
    while dtheta <= -180.0 {
        dtheta += 360.0;
    }
    dtheta
}
