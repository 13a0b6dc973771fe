//! Target grid specification.

use crate::error::{HarmonizeError, HarmonizeResult};
use crate::BoundingBox;
use serde::{Deserialize, Serialize};

/// Specification of a regular lat/lon lattice that every source is
/// resampled onto.
///
/// Cell `(row, col)` has its centre at
/// `(first_lon + col * dlon, first_lat + row * dlat)`. Rows run south to
/// north, columns west to east, so arrays on this grid have shape
/// `(ny, nx)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of columns (longitude direction)
    pub nx: usize,
    /// Number of rows (latitude direction)
    pub ny: usize,
    /// Longitude spacing in degrees, positive
    pub dlon: f64,
    /// Latitude spacing in degrees, positive
    pub dlat: f64,
    /// Longitude of the centre of cell (0, 0)
    pub first_lon: f64,
    /// Latitude of the centre of cell (0, 0)
    pub first_lat: f64,
}

impl GridSpec {
    /// Create a new grid specification.
    pub fn new(nx: usize, ny: usize, dlon: f64, dlat: f64, first_lon: f64, first_lat: f64) -> Self {
        Self {
            nx,
            ny,
            dlon,
            dlat,
            first_lon,
            first_lat,
        }
    }

    /// The 85x85 one-degree regional grid used by the bias-correction model.
    pub fn regional_85() -> Self {
        Self::new(85, 85, 1.0, 1.0, 30.0, -30.0)
    }

    /// Check that the grid is usable as an interpolation target.
    pub fn validate(&self) -> HarmonizeResult<()> {
        let label = "target grid";
        if self.nx == 0 || self.ny == 0 {
            return Err(HarmonizeError::grid_mismatch(
                label,
                format!("grid has zero cells ({}x{})", self.ny, self.nx),
            ));
        }
        if !(self.dlon.is_finite() && self.dlon > 0.0 && self.dlat.is_finite() && self.dlat > 0.0)
        {
            return Err(HarmonizeError::grid_mismatch(
                label,
                format!("resolution must be positive, got dlon={} dlat={}", self.dlon, self.dlat),
            ));
        }
        if !(self.first_lon.is_finite() && self.first_lat.is_finite()) {
            return Err(HarmonizeError::grid_mismatch(label, "origin is not finite"));
        }
        let last_lat = self.first_lat + (self.ny - 1) as f64 * self.dlat;
        if self.first_lat < -90.0 || last_lat > 90.0 {
            return Err(HarmonizeError::grid_mismatch(
                label,
                format!("latitudes {}..{} leave the globe", self.first_lat, last_lat),
            ));
        }
        Ok(())
    }

    /// Array shape `(ny, nx)` of a single field on this grid.
    pub fn shape(&self) -> (usize, usize) {
        (self.ny, self.nx)
    }

    /// Centre of a cell as `(lon, lat)`.
    pub fn cell_center(&self, row: usize, col: usize) -> Option<(f64, f64)> {
        if row >= self.ny || col >= self.nx {
            return None;
        }
        Some((self.lon_at(col), self.lat_at(row)))
    }

    /// Longitude of a column centre.
    pub fn lon_at(&self, col: usize) -> f64 {
        self.first_lon + col as f64 * self.dlon
    }

    /// Latitude of a row centre.
    pub fn lat_at(&self, row: usize) -> f64 {
        self.first_lat + row as f64 * self.dlat
    }

    /// All column-centre longitudes.
    pub fn lons(&self) -> Vec<f64> {
        (0..self.nx).map(|col| self.lon_at(col)).collect()
    }

    /// All row-centre latitudes.
    pub fn lats(&self) -> Vec<f64> {
        (0..self.ny).map(|row| self.lat_at(row)).collect()
    }

    /// Bounding box of the cell centres.
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(
            self.first_lon,
            self.first_lat,
            self.lon_at(self.nx.saturating_sub(1)),
            self.lat_at(self.ny.saturating_sub(1)),
        )
    }

    /// Convert coordinates to the nearest cell as `(row, col)`.
    pub fn coord_to_index(&self, lon: f64, lat: f64) -> Option<(usize, usize)> {
        let col = ((lon - self.first_lon) / self.dlon).round() as isize;
        let row = ((lat - self.first_lat) / self.dlat).round() as isize;

        if col < 0 || row < 0 || col >= self.nx as isize || row >= self.ny as isize {
            return None;
        }

        Some((row as usize, col as usize))
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    /// Check if grid is empty.
    pub fn is_empty(&self) -> bool {
        self.nx == 0 || self.ny == 0
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self::regional_85()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regional_grid_shape() {
        let grid = GridSpec::regional_85();
        assert_eq!(grid.shape(), (85, 85));
        assert_eq!(grid.len(), 7225);
        assert!(grid.validate().is_ok());
    }

    #[test]
    fn test_cell_center_and_index() {
        let grid = GridSpec::regional_85();
        let (lon, lat) = grid.cell_center(0, 0).unwrap();
        assert_eq!((lon, lat), (30.0, -30.0));

        let (lon, lat) = grid.cell_center(84, 84).unwrap();
        assert_eq!((lon, lat), (114.0, 54.0));
        assert!(grid.cell_center(85, 0).is_none());

        assert_eq!(grid.coord_to_index(40.2, -19.6), Some((10, 10)));
        assert_eq!(grid.coord_to_index(0.0, 0.0), None);
    }

    #[test]
    fn test_bbox() {
        let bbox = GridSpec::new(3, 2, 0.5, 0.25, 10.0, 20.0).bbox();
        assert_eq!(bbox, BoundingBox::new(10.0, 20.0, 11.0, 20.25));
    }

    #[test]
    fn test_validate_rejects_bad_grids() {
        assert!(GridSpec::new(0, 10, 1.0, 1.0, 0.0, 0.0).validate().is_err());
        assert!(GridSpec::new(10, 10, 0.0, 1.0, 0.0, 0.0).validate().is_err());
        assert!(GridSpec::new(10, 10, 1.0, -1.0, 0.0, 0.0).validate().is_err());
        assert!(GridSpec::new(10, 200, 1.0, 1.0, 0.0, -90.0).validate().is_err());
    }
}
