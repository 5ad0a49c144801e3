//! Topology represents an N-dimensional grid through a list of dimensions and corresponding stride values.
//! It converts between linear indices and coordinates in this grid, and iterates over the
//! neighborhood of an index: every index within a radius along each dimension (Chebyshev distance).
//!
//! The column space of a region is such a grid. Local inhibition asks the topology which columns
//! surround a competitor, and the region builder uses the input grid to place receptive fields.
//! With wrapping enabled the grid behaves like a torus, otherwise neighborhoods are clipped at the edges.

use crate::error::{Result, SpatialPoolerError};
use serde::{Deserialize, Serialize};

/// The shape of an N-dimensional space, along with precomputed strides for
/// linear index conversions. Strides are the cumulative products of the trailing dimension sizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    dims: Vec<usize>,
    strides: Vec<usize>,
    wrapping: bool,
}

impl Topology {
    /// Creates a new `Topology`. Fails when no dimension is given or a dimension is zero.
    pub fn new(dimensions: &[usize], wrapping: bool) -> Result<Self> {
        if dimensions.is_empty() {
            return Err(SpatialPoolerError::invalid(
                "dimensions",
                "a topology needs at least one dimension",
            ));
        }
        if let Some(pos) = dimensions.iter().position(|&d| d == 0) {
            return Err(SpatialPoolerError::invalid(
                "dimensions",
                format!("dimension {pos} has size zero"),
            ));
        }

        let dims = dimensions.to_vec();
        let strides = Self::strides(&dims);

        Ok(Self {
            dims,
            strides,
            wrapping,
        })
    }

    /// A one-dimensional line of `len` elements.
    pub fn line(len: usize, wrapping: bool) -> Result<Self> {
        Self::new(&[len], wrapping)
    }

    fn strides(dims: &[usize]) -> Vec<usize> {
        let mut strides = vec![1; dims.len()];

        for i in (0..dims.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * dims[i + 1];
        }

        strides
    }

    /// Extent of every dimension.
    #[inline]
    pub fn dimensions(&self) -> &[usize] {
        &self.dims
    }

    #[inline]
    pub fn is_wrapping(&self) -> bool {
        self.wrapping
    }

    /// Total number of elements in the grid.
    #[inline]
    pub fn size(&self) -> usize {
        self.dims.iter().product()
    }

    /// Converts a linear index into one coordinate per dimension, in order.
    #[inline]
    pub fn coordinates(&self, index: usize) -> Vec<usize> {
        let mut remainder = index;

        self.strides
            .iter()
            .map(|&stride| {
                let coord = remainder / stride;
                remainder %= stride;
                coord
            })
            .collect()
    }

    /// Converts coordinates back into a linear index.
    #[inline]
    pub fn index_from_coordinates(&self, coords: &[usize]) -> usize {
        coords.iter().zip(&self.strides).map(|(&c, &s)| c * s).sum()
    }

    /// Iterates over every index within `radius` of `center` along each dimension, `center` included.
    ///
    /// With wrapping, a dimension contributes `min(2 * radius + 1, dim)` distinct positions, so no
    /// index is yielded twice even when the radius exceeds the grid.
    #[inline]
    pub fn neighborhood(&self, center: usize, radius: usize) -> NeighborhoodIter<'_> {
        let bounds: Vec<(isize, isize)> = self
            .coordinates(center)
            .iter()
            .zip(&self.dims)
            .map(|(&c, &dim)| {
                let c = c as isize;
                let dim = dim as isize;
                let radius = radius.min(dim as usize) as isize;

                if self.wrapping {
                    let span = (2 * radius + 1).min(dim);
                    (c - radius, c - radius + span)
                } else {
                    ((c - radius).max(0), (c + radius + 1).min(dim))
                }
            })
            .collect();

        let current = bounds.iter().map(|&(low, _)| low).collect();

        NeighborhoodIter {
            topology: self,
            bounds,
            current: Some(current),
        }
    }
}

/// Yields all indices of a neighborhood in row-major order.
pub struct NeighborhoodIter<'a> {
    topology: &'a Topology,
    bounds: Vec<(isize, isize)>,
    current: Option<Vec<isize>>,
}

impl Iterator for NeighborhoodIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current.as_mut()?;

        let index = current
            .iter()
            .zip(&self.topology.dims)
            .zip(&self.topology.strides)
            .map(|((&val, &dim), &stride)| val.rem_euclid(dim as isize) as usize * stride)
            .sum();

        // Odometer step: bump the last dimension, carry into the previous ones.
        for i in (0..current.len()).rev() {
            if current[i] + 1 < self.bounds[i].1 {
                current[i] += 1;
                for (j, item) in current.iter_mut().enumerate().skip(i + 1) {
                    *item = self.bounds[j].0;
                }
                return Some(index);
            }
        }

        self.current = None;
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(iter: NeighborhoodIter<'_>) -> Vec<usize> {
        let mut v: Vec<usize> = iter.collect();
        v.sort_unstable();
        v
    }

    #[test]
    fn test_coordinates_roundtrip() {
        let topo = Topology::new(&[3, 4], false).unwrap();
        assert_eq!(topo.coordinates(7), vec![1, 3]);
        assert_eq!(topo.index_from_coordinates(&[1, 3]), 7);
        assert_eq!(topo.size(), 12);
    }

    #[test]
    fn test_line_neighborhood_clipped() {
        let topo = Topology::line(10, false).unwrap();
        assert_eq!(sorted(topo.neighborhood(0, 2)), vec![0, 1, 2]);
        assert_eq!(sorted(topo.neighborhood(5, 1)), vec![4, 5, 6]);
        assert_eq!(sorted(topo.neighborhood(9, 3)), vec![6, 7, 8, 9]);
    }

    #[test]
    fn test_line_neighborhood_wrapping() {
        let topo = Topology::line(10, true).unwrap();
        assert_eq!(sorted(topo.neighborhood(0, 2)), vec![0, 1, 2, 8, 9]);
    }

    #[test]
    fn test_wrapping_radius_larger_than_grid_has_no_duplicates() {
        let topo = Topology::line(4, true).unwrap();
        assert_eq!(sorted(topo.neighborhood(1, 10)), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_grid_neighborhood() {
        let topo = Topology::new(&[3, 3], false).unwrap();
        assert_eq!(sorted(topo.neighborhood(0, 1)), vec![0, 1, 3, 4]);
        assert_eq!(sorted(topo.neighborhood(4, 1)), (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn test_radius_zero_is_center_only() {
        let topo = Topology::new(&[3, 3], true).unwrap();
        assert_eq!(sorted(topo.neighborhood(4, 0)), vec![4]);
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(Topology::new(&[], false).is_err());
        assert!(Topology::new(&[4, 0], false).is_err());
    }
}
