//! A `Region` is the fixed, ordered collection of columns a spatial pooler works on, together with
//! the topology of the column space. Column indices are stable for the lifetime of the region,
//! and the topology answers the neighbor lookups local inhibition needs.
//!
//! Regions are usually wired by `RegionBuilder`, which:
//! - maps every column to a "center" in the input space, proportionally to its coordinates,
//! - samples a fraction of the input bits within a potential radius of that center,
//! - gives each sampled bit a proximal synapse with a random permanence around the connected threshold.
//!
//! Wiring is reproducible: the builder draws from a seeded `StdRng`.
//!
//! Once built, the only column state callers can change is the boost (`Region::set_boost`). Overlaps
//! and permanences are written by the spatial pooler alone.

use super::{
    column::{Column, DEFAULT_CELLS_PER_COLUMN},
    synapses::Synapse,
    topology::Topology,
};
use crate::error::{Result, SpatialPoolerError};
use log::info;
use rand::{rngs::StdRng, seq::IteratorRandom, Rng, SeedableRng};

#[derive(Debug, Clone)]
pub struct Region {
    columns: Vec<Column>,
    topology: Topology,
}

impl Region {
    /// Creates a region from explicitly wired columns.
    ///
    /// Fails when the region is empty, when the topology does not describe exactly
    /// `columns.len()` positions, or when a column's index does not match its position.
    pub fn new(columns: Vec<Column>, topology: Topology) -> Result<Self> {
        if columns.is_empty() {
            return Err(SpatialPoolerError::invalid(
                "columns",
                "a region needs at least one column",
            ));
        }
        if topology.size() != columns.len() {
            return Err(SpatialPoolerError::invalid(
                "topology",
                format!(
                    "topology {:?} describes {} columns, region has {}",
                    topology.dimensions(),
                    topology.size(),
                    columns.len()
                ),
            ));
        }
        if let Some((pos, col)) = columns
            .iter()
            .enumerate()
            .find(|(pos, col)| col.index() != *pos)
        {
            return Err(SpatialPoolerError::invalid(
                "columns",
                format!("column at position {pos} carries index {}", col.index()),
            ));
        }

        Ok(Self { columns, topology })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Shape of the column space.
    #[inline]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// All columns, ordered by index.
    #[inline]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[inline]
    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    /// The column at `index`, if there is one.
    #[inline]
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    #[inline]
    pub(crate) fn column_mut(&mut self, index: usize) -> Option<&mut Column> {
        self.columns.get_mut(index)
    }

    /// Sets the boost of the column at `index`.
    pub fn set_boost(&mut self, index: usize, boost: f32) -> Result<()> {
        let len = self.columns.len();
        let column = self
            .columns
            .get_mut(index)
            .ok_or(SpatialPoolerError::UnknownColumn { column: index, len })?;
        column.set_boost(boost);
        Ok(())
    }

    /// Indices of the columns within `radius` of `column` in the column topology, excluding `column` itself.
    /// Empty if `column` is not part of the region.
    #[inline]
    pub fn neighbors(&self, column: usize, radius: usize) -> impl Iterator<Item = usize> + '_ {
        (column < self.len())
            .then(|| self.topology.neighborhood(column, radius))
            .into_iter()
            .flatten()
            .filter(move |&n| n != column)
    }
}

/// Wires a region's proximal synapses into an input space.
#[derive(Debug, Clone)]
pub struct RegionBuilder {
    /// The shape of the input space.
    pub input_dimensions: Vec<usize>,

    /// The shape of the column grid.
    pub column_dimensions: Vec<usize>,

    /// Number of cells every column is built with.
    pub cells_per_column: usize,

    /// Radius (in input space) around a column's center from which potential synapses are drawn.
    /// `None` uses the entire input space.
    pub potential_radius: Option<usize>,

    /// Fraction of the input bits within the potential radius that become potential synapses.
    pub potential_percentage: f64,

    /// Fraction of each column's synapses that initially start out above the connected threshold.
    pub init_connected_percentage: f32,

    /// Connected threshold the initial permanences are spread around.
    pub connected: f32,

    /// Whether both the input and the column space wrap around their edges.
    pub wrap_around: bool,

    /// Seed of the random generator used for sampling and permanences.
    pub seed: u64,
}

impl RegionBuilder {
    pub fn new(input_dimensions: Vec<usize>, column_dimensions: Vec<usize>) -> Self {
        Self {
            input_dimensions,
            column_dimensions,
            cells_per_column: DEFAULT_CELLS_PER_COLUMN,
            potential_radius: None,
            potential_percentage: 0.5,
            init_connected_percentage: 0.5,
            connected: 0.2,
            wrap_around: true,
            seed: 42,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.cells_per_column == 0 {
            return Err(SpatialPoolerError::invalid(
                "cells_per_column",
                "a column needs at least one cell",
            ));
        }
        if !(self.potential_percentage > 0.0 && self.potential_percentage <= 1.0) {
            return Err(SpatialPoolerError::invalid(
                "potential_percentage",
                format!("must lie in (0, 1], got {}", self.potential_percentage),
            ));
        }
        if !(0.0..=1.0).contains(&self.init_connected_percentage) {
            return Err(SpatialPoolerError::invalid(
                "init_connected_percentage",
                format!("must lie in [0, 1], got {}", self.init_connected_percentage),
            ));
        }
        if !(0.0..=1.0).contains(&self.connected) {
            return Err(SpatialPoolerError::invalid(
                "connected",
                format!("must lie in [0, 1], got {}", self.connected),
            ));
        }
        if self.input_dimensions.len() != self.column_dimensions.len() {
            return Err(SpatialPoolerError::invalid(
                "column_dimensions",
                format!(
                    "input space has {} dimensions, column space has {}",
                    self.input_dimensions.len(),
                    self.column_dimensions.len()
                ),
            ));
        }
        Ok(())
    }

    /// Samples the receptive field of every column and builds the region.
    pub fn build(&self) -> Result<Region> {
        self.validate()?;

        let input_topology = Topology::new(&self.input_dimensions, self.wrap_around)?;
        let column_topology = Topology::new(&self.column_dimensions, self.wrap_around)?;
        let num_inputs = input_topology.size();
        let num_columns = column_topology.size();
        let radius = self.potential_radius.unwrap_or(num_inputs);

        let mut rng = StdRng::seed_from_u64(self.seed);

        let columns = (0..num_columns)
            .map(|index| {
                let center = self.map_column(&column_topology, &input_topology, index);
                let neighborhood: Vec<usize> =
                    input_topology.neighborhood(center, radius).collect();
                let amount = self.potential_synapses(neighborhood.len());
                let mut potential = neighborhood.into_iter().choose_multiple(&mut rng, amount);
                potential.sort_unstable();

                let synapses = potential
                    .into_iter()
                    .map(|input_index| Synapse::new(input_index, self.init_permanence(&mut rng)))
                    .collect();

                Column::new(index, self.cells_per_column, synapses)
            })
            .collect();

        let region = Region::new(columns, column_topology)?;

        info!(
            "built region: {} columns over {} inputs, potential radius {}, {} cells per column",
            num_columns, num_inputs, radius, self.cells_per_column
        );

        Ok(region)
    }

    /// Maps a column index to its center in the input space:
    /// - proportionally maps the column's coordinates to the input grid coordinates,
    /// - offsets by half a column's share of the input,
    /// - clamps the result to the valid input range.
    pub fn map_column(&self, columns: &Topology, inputs: &Topology, column: usize) -> usize {
        let coords: Vec<usize> = columns
            .coordinates(column)
            .into_iter()
            .zip(columns.dimensions())
            .zip(inputs.dimensions())
            .map(|((index, &col_dim), &in_dim)| {
                let scale = in_dim as f32 / col_dim as f32;
                let mapped = (index as f32 * scale + scale * 0.5) as usize;
                mapped.min(in_dim - 1)
            })
            .collect();
        inputs.index_from_coordinates(&coords)
    }

    /// How many potential synapses a column gets out of a neighborhood of `input_size` bits.
    pub fn potential_synapses(&self, input_size: usize) -> usize {
        ((input_size as f64 * self.potential_percentage) + 0.5) as usize
    }

    /// Draws an initial permanence: above the connected threshold with probability
    /// `init_connected_percentage`, below it otherwise.
    fn init_permanence<R: Rng>(&self, rng: &mut R) -> f32 {
        let random = if rng.random::<f32>() <= self.init_connected_percentage {
            self.connected + (1.0 - self.connected) * rng.random::<f32>()
        } else {
            self.connected * rng.random::<f32>()
        };

        (random * 100_000.0).round() / 100_000.0
    }
}
