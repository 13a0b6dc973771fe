//! Interpolation kernels for grid remapping.
//!
//! Native axes are located once per remap ([`AxisLocator`]); every target
//! cell then draws on the four native nodes that bracket its centre.
//! Missing native nodes are dropped from the stencil instead of poisoning
//! it, and a cell is only reported missing when none of its bracketing nodes
//! hold data.

use ocean_common::{HarmonizeError, HarmonizeResult};

/// Position of a coordinate between two native nodes.
///
/// `lo` is the native index of the node with the smaller coordinate, `hi` the
/// one with the larger coordinate; `frac` is the weight of `hi` (0..=1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub lo: usize,
    pub hi: usize,
    pub frac: f64,
}

/// Locates coordinates on a strictly monotonic native axis.
#[derive(Debug, Clone)]
pub struct AxisLocator {
    /// Coordinates sorted ascending.
    sorted: Vec<f64>,
    /// Native axis runs from high to low values.
    descending: bool,
    /// Longitude axis: coordinates are angles modulo 360.
    periodic: bool,
    /// Longitude axis covering the whole globe (seam is interpolated).
    global: bool,
}

impl AxisLocator {
    /// Build a locator for a latitude axis.
    pub fn latitude(coords: &[f64], field: &str) -> HarmonizeResult<Self> {
        Self::new(coords, false, "latitude", field)
    }

    /// Build a locator for a longitude axis.
    pub fn longitude(coords: &[f64], field: &str) -> HarmonizeResult<Self> {
        Self::new(coords, true, "longitude", field)
    }

    fn new(coords: &[f64], periodic: bool, axis: &str, field: &str) -> HarmonizeResult<Self> {
        if coords.len() < 2 {
            return Err(HarmonizeError::grid_mismatch(
                field,
                format!("{} axis needs at least 2 points, got {}", axis, coords.len()),
            ));
        }
        if let Some(idx) = coords.iter().position(|c| !c.is_finite()) {
            return Err(HarmonizeError::grid_mismatch(
                field,
                format!("{} coordinate {} is not finite", axis, idx),
            ));
        }

        let descending = coords[0] > coords[1];
        let monotonic = coords.windows(2).all(|w| {
            if descending {
                w[0] > w[1]
            } else {
                w[0] < w[1]
            }
        });
        if !monotonic {
            return Err(HarmonizeError::grid_mismatch(
                field,
                format!("{} axis is not strictly monotonic", axis),
            ));
        }

        let mut sorted = coords.to_vec();
        if descending {
            sorted.reverse();
        }

        let span = sorted[sorted.len() - 1] - sorted[0];
        if periodic && span >= 360.0 {
            return Err(HarmonizeError::grid_mismatch(
                field,
                format!("longitude axis spans {} degrees, more than a full circle", span),
            ));
        }
        let max_step = sorted
            .windows(2)
            .map(|w| w[1] - w[0])
            .fold(0.0_f64, f64::max);
        let global = periodic && 360.0 - span <= max_step * (1.0 + 1e-9);

        Ok(Self {
            sorted,
            descending,
            periodic,
            global,
        })
    }

    /// Number of native nodes.
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Whether a longitude axis wraps around the globe.
    pub fn is_global(&self) -> bool {
        self.global
    }

    /// Find the native nodes bracketing `x`, or `None` outside the coverage.
    pub fn locate(&self, x: f64) -> Option<Bracket> {
        if !x.is_finite() {
            return None;
        }
        let n = self.sorted.len();
        let first = self.sorted[0];
        let last = self.sorted[n - 1];

        let x = if self.periodic {
            first + (x - first).rem_euclid(360.0)
        } else {
            x
        };

        if x < first {
            return None;
        }
        if x > last {
            if !self.global {
                return None;
            }
            // Between the last node and the first node + 360.
            let frac = (x - last) / (first + 360.0 - last);
            return Some(Bracket {
                lo: self.native_index(n - 1),
                hi: self.native_index(0),
                frac: frac.clamp(0.0, 1.0),
            });
        }

        let hi = self.sorted.partition_point(|&v| v <= x).clamp(1, n - 1);
        let lo = hi - 1;
        let frac = (x - self.sorted[lo]) / (self.sorted[hi] - self.sorted[lo]);

        Some(Bracket {
            lo: self.native_index(lo),
            hi: self.native_index(hi),
            frac: frac.clamp(0.0, 1.0),
        })
    }

    #[inline]
    fn native_index(&self, sorted_index: usize) -> usize {
        if self.descending {
            self.sorted.len() - 1 - sorted_index
        } else {
            sorted_index
        }
    }
}

/// Values and bilinear weights of the four bracketing nodes, ordered
/// south-west, south-east, north-west, north-east. Missing values are NaN.
pub type Corners = [(f64, f64); 4];

/// Build the corner stencil from a latitude and a longitude bracket.
///
/// `value_at(lat_index, lon_index)` returns the native value, NaN if missing.
#[inline]
pub fn corners<F>(lat: Bracket, lon: Bracket, value_at: F) -> Corners
where
    F: Fn(usize, usize) -> f64,
{
    let (fy, fx) = (lat.frac, lon.frac);
    [
        (value_at(lat.lo, lon.lo), (1.0 - fy) * (1.0 - fx)),
        (value_at(lat.lo, lon.hi), (1.0 - fy) * fx),
        (value_at(lat.hi, lon.lo), fy * (1.0 - fx)),
        (value_at(lat.hi, lon.hi), fy * fx),
    ]
}

/// Nearest valid node.
///
/// Picks the valid corner with the largest bilinear weight; equal weights go
/// to the earlier corner in SW, SE, NW, NE order. Returns NaN when no corner
/// with a positive weight is valid.
pub fn nearest_interpolate(corners: &Corners) -> f64 {
    let mut best: Option<(f64, f64)> = None;
    for &(value, weight) in corners {
        if weight <= 0.0 || value.is_nan() {
            continue;
        }
        match best {
            Some((_, w)) if w >= weight => {}
            _ => best = Some((value, weight)),
        }
    }
    best.map(|(value, _)| value).unwrap_or(f64::NAN)
}

/// Bilinear interpolation with missing nodes dropped.
///
/// The weights of the remaining valid corners are renormalised. Returns NaN
/// when no corner with a positive weight is valid.
pub fn bilinear_interpolate(corners: &Corners) -> f64 {
    let mut sum = 0.0;
    let mut weight_sum = 0.0;
    for &(value, weight) in corners {
        if weight <= 0.0 || value.is_nan() {
            continue;
        }
        sum += value * weight;
        weight_sum += weight;
    }

    if weight_sum > 0.0 {
        sum / weight_sum
    } else {
        f64::NAN
    }
}
