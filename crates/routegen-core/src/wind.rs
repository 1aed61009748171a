//! Wind field access for the cost functions.
//!
//! Forecast data is loaded once by the (out of scope) ingest stage and is
//! read-only for the remainder of a run, so implementations need no interior
//! locking. A forecast is either a single snapshot or an ordered list of
//! per-epoch snapshots, one per forecast hour.

use serde::{Deserialize, Serialize};

/// Wind at a sampled point, in knots.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WindSample {
    pub north_kt: f64,
    pub east_kt: f64,
}

impl WindSample {
    pub fn new(north_kt: f64, east_kt: f64) -> Self {
        Self { north_kt, east_kt }
    }

    pub fn magnitude_kt(&self) -> f64 {
        (self.north_kt * self.north_kt + self.east_kt * self.east_kt).sqrt()
    }
}

/// A wind forecast snapshot.
pub trait WindField {
    /// Wind components at the given position and altitude.
    fn sample(&self, lat: f64, lon: f64, alt_ft: f64) -> WindSample;

    /// The largest wind magnitude anywhere in this snapshot, in knots.
    /// Feeds the optimistic search heuristic.
    fn max_magnitude_kt(&self) -> f64;
}

/// The largest wind magnitude across a list of per-epoch snapshots.
pub fn max_magnitude_kt<W: WindField>(epochs: &[W]) -> f64 {
    epochs
        .iter()
        .map(|w| w.max_magnitude_kt())
        .fold(0.0, f64::max)
}

/// A spatially uniform wind, mostly useful for tests and dry runs.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UniformWind {
    pub wind: WindSample,
}

impl UniformWind {
    pub fn new(north_kt: f64, east_kt: f64) -> Self {
        Self {
            wind: WindSample::new(north_kt, east_kt),
        }
    }

    pub fn calm() -> Self {
        Self::default()
    }
}

impl WindField for UniformWind {
    fn sample(&self, _lat: f64, _lon: f64, _alt_ft: f64) -> WindSample {
        self.wind
    }

    fn max_magnitude_kt(&self) -> f64 {
        self.wind.magnitude_kt()
    }
}

/// A regular lat/lon grid of wind samples with nearest-cell lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridWind {
    pub lat0: f64,
    pub lon0: f64,
    pub dlat: f64,
    pub dlon: f64,
    pub cols: usize,
    /// Row-major samples, `rows * cols` entries.
    pub samples: Vec<WindSample>,
    max_magnitude_kt: f64,
}

impl GridWind {
    pub fn new(
        lat0: f64,
        lon0: f64,
        dlat: f64,
        dlon: f64,
        cols: usize,
        samples: Vec<WindSample>,
    ) -> Self {
        let max_magnitude_kt = samples
            .iter()
            .map(WindSample::magnitude_kt)
            .fold(0.0, f64::max);
        Self {
            lat0,
            lon0,
            dlat,
            dlon,
            cols,
            samples,
            max_magnitude_kt,
        }
    }

    fn rows(&self) -> usize {
        if self.cols == 0 {
            0
        } else {
            self.samples.len() / self.cols
        }
    }
}

impl WindField for GridWind {
    fn sample(&self, lat: f64, lon: f64, _alt_ft: f64) -> WindSample {
        let rows = self.rows();
        if rows == 0 || self.cols == 0 {
            return WindSample::default();
        }
        let row = (((lat - self.lat0) / self.dlat).round().max(0.0) as usize).min(rows - 1);
        let col = (((lon - self.lon0) / self.dlon).round().max(0.0) as usize).min(self.cols - 1);
        self.samples[row * self.cols + col]
    }

    fn max_magnitude_kt(&self) -> f64 {
        self.max_magnitude_kt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_wind_is_everywhere() {
        let wind = UniformWind::new(10.0, -5.0);
        let s = wind.sample(40.0, -100.0, 35_000.0);
        assert_eq!(s.north_kt, 10.0);
        assert_eq!(s.east_kt, -5.0);
    }

    #[test]
    fn grid_lookup_picks_nearest_cell() {
        let samples = vec![
            WindSample::new(0.0, 0.0),
            WindSample::new(0.0, 10.0),
            WindSample::new(10.0, 0.0),
            WindSample::new(10.0, 10.0),
        ];
        let grid = GridWind::new(30.0, -110.0, 1.0, 1.0, 2, samples);
        let s = grid.sample(30.1, -109.05, 0.0);
        assert_eq!(s.east_kt, 10.0);
        assert_eq!(s.north_kt, 0.0);
        assert!((grid.max_magnitude_kt() - (200.0_f64).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn epoch_max_magnitude() {
        let epochs = vec![UniformWind::new(3.0, 4.0), UniformWind::new(6.0, 8.0)];
        assert!((max_magnitude_kt(&epochs) - 10.0).abs() < 1e-9);
    }
}
