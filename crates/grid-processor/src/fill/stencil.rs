//! Precomputed neighbour ordering for the distance-stencil fill.
//!
//! Rings are square (Chebyshev distance `r`). Each ring is walked clockwise
//! starting due north, where north is `+row` (rows run south to north on the
//! target grid). The order is fixed so the weighted sum is bit-reproducible.

/// One neighbour of the cell being filled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StencilOffset {
    pub d_row: isize,
    pub d_col: isize,
    /// Inverse Euclidean distance in cell units.
    pub weight: f64,
}

impl StencilOffset {
    fn new(d_row: isize, d_col: isize) -> Self {
        let dist = ((d_row * d_row + d_col * d_col) as f64).sqrt();
        Self {
            d_row,
            d_col,
            weight: 1.0 / dist,
        }
    }

    /// Apply the offset to `(row, col)`, `None` outside a `(ny, nx)` grid.
    #[inline]
    pub fn apply(&self, row: usize, col: usize, ny: usize, nx: usize) -> Option<(usize, usize)> {
        let r = row.checked_add_signed(self.d_row)?;
        let c = col.checked_add_signed(self.d_col)?;
        (r < ny && c < nx).then_some((r, c))
    }
}

/// Ring offsets for radii `1..=max_radius`.
#[derive(Debug, Clone, PartialEq)]
pub struct StencilTable {
    rings: Vec<Vec<StencilOffset>>,
}

impl StencilTable {
    pub fn new(max_radius: usize) -> Self {
        let rings = (1..=max_radius as isize).map(ring).collect();
        Self { rings }
    }

    pub fn max_radius(&self) -> usize {
        self.rings.len()
    }

    /// Offsets of the ring at Chebyshev distance `radius` (1-based).
    pub fn ring(&self, radius: usize) -> &[StencilOffset] {
        radius
            .checked_sub(1)
            .and_then(|i| self.rings.get(i))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Rings in search order, paired with their radius.
    pub fn rings(&self) -> impl Iterator<Item = (usize, &[StencilOffset])> {
        self.rings
            .iter()
            .enumerate()
            .map(|(i, ring)| (i + 1, ring.as_slice()))
    }
}

/// The `8r` cells at Chebyshev distance `r`, clockwise from north.
fn ring(r: isize) -> Vec<StencilOffset> {
    let mut cells = Vec::with_capacity(8 * r as usize);
    // North edge, centre to north-east corner.
    cells.extend((0..=r).map(|dc| StencilOffset::new(r, dc)));
    // East edge, going south.
    cells.extend((-r..r).rev().map(|dr| StencilOffset::new(dr, r)));
    // South edge, going west.
    cells.extend((-r..r).rev().map(|dc| StencilOffset::new(-r, dc)));
    // West edge, going north.
    cells.extend((-r + 1..=r).map(|dr| StencilOffset::new(dr, -r)));
    // North edge, north-west corner back towards centre.
    cells.extend((-r + 1..0).map(|dc| StencilOffset::new(r, dc)));
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn offsets(table: &StencilTable, radius: usize) -> Vec<(isize, isize)> {
        table
            .ring(radius)
            .iter()
            .map(|o| (o.d_row, o.d_col))
            .collect()
    }

    #[test]
    fn test_ring_one_is_clockwise_from_north() {
        let table = StencilTable::new(1);
        assert_eq!(
            offsets(&table, 1),
            vec![
                (1, 0),
                (1, 1),
                (0, 1),
                (-1, 1),
                (-1, 0),
                (-1, -1),
                (0, -1),
                (1, -1),
            ]
        );
    }

    #[test]
    fn test_rings_cover_square_shell_once() {
        let table = StencilTable::new(5);
        assert_eq!(table.max_radius(), 5);
        for (r, ring) in table.rings() {
            assert_eq!(ring.len(), 8 * r);
            let unique: HashSet<_> = ring.iter().map(|o| (o.d_row, o.d_col)).collect();
            assert_eq!(unique.len(), ring.len());
            for o in ring {
                assert_eq!(o.d_row.abs().max(o.d_col.abs()) as usize, r);
            }
            assert_eq!((ring[0].d_row, ring[0].d_col), (r as isize, 0));
        }
    }

    #[test]
    fn test_table_is_deterministic() {
        assert_eq!(StencilTable::new(4), StencilTable::new(4));
        assert_eq!(offsets(&StencilTable::new(4), 2), offsets(&StencilTable::new(2), 2));
    }

    #[test]
    fn test_weights_are_inverse_distance() {
        let table = StencilTable::new(2);
        let ring = table.ring(2);
        let corner = ring.iter().find(|o| (o.d_row, o.d_col) == (2, 2)).unwrap();
        assert!((corner.weight - 1.0 / 8.0_f64.sqrt()).abs() < 1e-15);
        assert_eq!(ring[0].weight, 0.5);
    }

    #[test]
    fn test_out_of_range_ring_is_empty() {
        let table = StencilTable::new(2);
        assert!(table.ring(0).is_empty());
        assert!(table.ring(3).is_empty());
    }

    #[test]
    fn test_apply_clips_to_grid() {
        let o = StencilOffset::new(-1, 1);
        assert_eq!(o.apply(1, 1, 3, 3), Some((0, 2)));
        assert_eq!(o.apply(0, 1, 3, 3), None);
        assert_eq!(o.apply(1, 2, 3, 3), None);
    }
}
