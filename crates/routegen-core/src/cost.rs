//! Transit cost functions: great-circle distance, wind-optimal time, and
//! the search heuristic.
//!
//! Wind-optimal costs integrate ground speed along the great-circle link:
//! the link is divided into sub-segments of roughly [`CostConfig::integration_step_nmi`]
//! nautical miles; each sub-segment samples the wind at its midpoint,
//! resolves it into along-track and cross-track components relative to the
//! link's initial heading, and accumulates `segment_length / ground_speed`.

use crate::error::CostError;
use crate::spatial::{distance_gc, heading_gc, location_gc, KT_TO_FPS, NMI_TO_FT};
use crate::wind::WindField;
use serde::{Deserialize, Serialize};

/// Tunables for the cost functions. The defaults are operationally tuned
/// values, not derived ones.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CostConfig {
    /// Integration step along a link, in nautical miles.
    pub integration_step_nmi: f64,
    /// Scale applied to the maximum wind magnitude in the heuristic
    /// denominator.
    pub heuristic_wind_scale: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            integration_step_nmi: 3.0,
            heuristic_wind_scale: 1.0,
        }
    }
}

/// Great-circle distance cost in feet at the mean of the two altitudes.
/// Ignores speed and wind.
pub fn great_circle_cost(
    lat1: f64,
    lon1: f64,
    lat2: f64,
    lon2: f64,
    alt_ft: f64,
) -> f64 {
    distance_gc(lat1, lon1, lat2, lon2, alt_ft)
}

/// Transit time in seconds along the link under the given wind snapshot.
///
/// `airspeed_kt` is the cruise true airspeed. Fails when the cross-track
/// wind exceeds the airspeed (no crab angle exists) or the resolved ground
/// speed is not positive; callers treat either as an unflyable edge.
pub fn wind_optimal_cost<W: WindField>(
    lat1: f64,
    lon1: f64,
    lat2: f64,
    lon2: f64,
    alt_ft: f64,
    airspeed_kt: f64,
    wind: &W,
    config: &CostConfig,
) -> Result<f64, CostError> {
    segment_times(lat1, lon1, lat2, lon2, alt_ft, airspeed_kt, config, |_elapsed| {
        wind
    })
}

/// Per-epoch transit times: one total per starting forecast epoch.
///
/// For the entry at starting epoch `k`, the wind for a sub-segment reached
/// after `t` seconds is sampled from epoch `(k + floor(t / 3600)) mod n`,
/// so a long flight cycles through the available forecasts rather than
/// indexing out of range.
pub fn wind_optimal_cost_per_epoch<W: WindField>(
    lat1: f64,
    lon1: f64,
    lat2: f64,
    lon2: f64,
    alt_ft: f64,
    airspeed_kt: f64,
    epochs: &[W],
    config: &CostConfig,
) -> Result<Vec<f64>, CostError> {
    let n = epochs.len();
    let mut totals = Vec::with_capacity(n);
    for k in 0..n {
        let total = segment_times(lat1, lon1, lat2, lon2, alt_ft, airspeed_kt, config, |elapsed| {
            let advance = (elapsed / 3_600.0).floor().max(0.0) as usize;
            &epochs[(k + advance) % n]
        })?;
        totals.push(total);
    }
    Ok(totals)
}

/// Optimistic transit-time lower bound: distance over airspeed plus the
/// scaled maximum wind magnitude. A practical approximation, not a proven
/// admissible bound.
pub fn wind_optimal_heuristic(
    lat1: f64,
    lon1: f64,
    lat2: f64,
    lon2: f64,
    alt_ft: f64,
    airspeed_kt: f64,
    max_wind_kt: f64,
    config: &CostConfig,
) -> f64 {
    let distance_ft = distance_gc(lat1, lon1, lat2, lon2, alt_ft);
    let v_fps = (airspeed_kt + config.heuristic_wind_scale * max_wind_kt) * KT_TO_FPS;
    distance_ft / v_fps
}

/// Shared integration loop. `wind_at` selects the snapshot for a
/// sub-segment given the elapsed time when it is reached.
fn segment_times<'w, W, F>(
    lat1: f64,
    lon1: f64,
    lat2: f64,
    lon2: f64,
    alt_ft: f64,
    airspeed_kt: f64,
    config: &CostConfig,
    wind_at: F,
) -> Result<f64, CostError>
where
    W: WindField + 'w,
    F: Fn(f64) -> &'w W,
{
    let airspeed_fps = airspeed_kt * KT_TO_FPS;
    let total_ft = distance_gc(lat1, lon1, lat2, lon2, alt_ft);
    if total_ft <= 0.0 {
        return Ok(0.0);
    }

    let step_ft = config.integration_step_nmi * NMI_TO_FT;
    let n = (total_ft / step_ft).ceil().max(1.0);
    let d = total_ft / n;

    let heading = heading_gc(lat1, lon1, lat2, lon2);
    let heading_rad = heading.to_radians();

    let mut total_secs = 0.0;
    let mut s = d / 2.0;

    for _ in 0..n as usize {
        let (lat_mid, lon_mid) = location_gc(lat1, lon1, s, heading, alt_ft);
        let sample = wind_at(total_secs).sample(lat_mid, lon_mid, alt_ft);

        let w_at = (sample.north_kt * heading_rad.cos() + sample.east_kt * heading_rad.sin())
            * KT_TO_FPS;
        let w_ct = (sample.north_kt * heading_rad.sin() - sample.east_kt * heading_rad.cos())
            * KT_TO_FPS;

        // crab angle between ground track and heading
        let sin_beta = -w_ct / airspeed_fps;
        if sin_beta.abs() > 1.0 {
            return Err(CostError::CrosswindExceedsAirspeed);
        }
        let beta = sin_beta.asin();

        let ground_speed_fps = airspeed_fps * beta.cos() + w_at;
        if ground_speed_fps <= 0.0 {
            return Err(CostError::NoForwardProgress);
        }

        total_secs += d / ground_speed_fps;
        s += d;
    }

    Ok(total_secs)
}
