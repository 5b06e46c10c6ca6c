//! Five-axis result tensor
//!
//! Cells are stored flat in row-major order over
//! `(dataset, algorithm, proportion, gap_width, replicate)`. Replicate is the
//! innermost axis, so every replicate of one condition and algorithm is a
//! contiguous slice.

use std::sync::Arc;

use serde::Serialize;

use crate::algorithm::AlgorithmId;
use crate::experiment::{Condition, ExperimentKey};
use crate::series::DatasetId;
use crate::{Error, Result};

/// Named tensor axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Ground-truth dataset
    Dataset,
    /// Imputation algorithm
    Algorithm,
    /// Proportion missing
    Proportion,
    /// Gap width
    GapWidth,
    /// Replicate number
    Replicate,
}

impl Axis {
    /// Axes in storage order, outermost first.
    pub const ALL: [Self; 5] = [
        Self::Dataset,
        Self::Algorithm,
        Self::Proportion,
        Self::GapWidth,
        Self::Replicate,
    ];
}

/// Extent of each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Shape {
    /// Datasets
    pub datasets: usize,
    /// Algorithms
    pub algorithms: usize,
    /// Proportions
    pub proportions: usize,
    /// Gap widths
    pub gap_widths: usize,
    /// Replicates
    pub replicates: usize,
}

impl Shape {
    /// Total number of cells.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.datasets * self.algorithms * self.proportions * self.gap_widths * self.replicates
    }

    /// Whether any axis is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Extent of one axis.
    #[must_use]
    pub const fn extent(&self, axis: Axis) -> usize {
        match axis {
            Axis::Dataset => self.datasets,
            Axis::Algorithm => self.algorithms,
            Axis::Proportion => self.proportions,
            Axis::GapWidth => self.gap_widths,
            Axis::Replicate => self.replicates,
        }
    }

    /// Flat offset of `index`, or `None` when out of bounds.
    #[must_use]
    pub fn offset(&self, index: CellIndex) -> Option<usize> {
        let mut offset = 0;
        for axis in Axis::ALL {
            let position = index.get(axis);
            let extent = self.extent(axis);
            if position >= extent {
                return None;
            }
            offset = offset * extent + position;
        }
        Some(offset)
    }

    /// Index of the cell stored at `offset`.
    ///
    /// `offset` must be below [`Shape::len`].
    #[must_use]
    pub const fn index(&self, offset: usize) -> CellIndex {
        let replicate = offset % self.replicates;
        let rest = offset / self.replicates;
        let gap_width = rest % self.gap_widths;
        let rest = rest / self.gap_widths;
        let proportion = rest % self.proportions;
        let rest = rest / self.proportions;
        let algorithm = rest % self.algorithms;
        let dataset = rest / self.algorithms;
        CellIndex {
            dataset,
            algorithm,
            proportion,
            gap_width,
            replicate,
        }
    }
}

/// Position of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CellIndex {
    /// Dataset position
    pub dataset: usize,
    /// Algorithm position (registry order)
    pub algorithm: usize,
    /// Proportion position
    pub proportion: usize,
    /// Gap width position
    pub gap_width: usize,
    /// Replicate number
    pub replicate: usize,
}

impl CellIndex {
    /// Coordinate along `axis`.
    #[must_use]
    pub const fn get(&self, axis: Axis) -> usize {
        match axis {
            Axis::Dataset => self.dataset,
            Axis::Algorithm => self.algorithm,
            Axis::Proportion => self.proportion,
            Axis::GapWidth => self.gap_width,
            Axis::Replicate => self.replicate,
        }
    }
}

/// Axis labels shared by every tensor produced from one grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridAxes {
    /// Dataset names
    pub datasets: Vec<DatasetId>,
    /// Algorithm ids in registry order
    pub algorithms: Vec<AlgorithmId>,
    /// Proportions missing
    pub proportions: Vec<f64>,
    /// Gap widths
    pub gap_widths: Vec<usize>,
    /// Replicates per condition
    pub replicates: usize,
}

impl GridAxes {
    /// Tensor shape implied by the labels.
    #[must_use]
    pub fn shape(&self) -> Shape {
        Shape {
            datasets: self.datasets.len(),
            algorithms: self.algorithms.len(),
            proportions: self.proportions.len(),
            gap_widths: self.gap_widths.len(),
            replicates: self.replicates,
        }
    }

    /// Condition at the given coordinates.
    #[must_use]
    pub fn condition(&self, dataset: usize, proportion: usize, gap_width: usize) -> Condition {
        Condition {
            dataset: self.datasets[dataset].clone(),
            proportion: self.proportions[proportion],
            gap_width: self.gap_widths[gap_width],
        }
    }

    /// Replicate key of a cell.
    #[must_use]
    pub fn key(&self, index: CellIndex) -> ExperimentKey {
        ExperimentKey {
            dataset: self.datasets[index.dataset].clone(),
            proportion: self.proportions[index.proportion],
            gap_width: self.gap_widths[index.gap_width],
            replicate: index.replicate,
        }
    }
}

/// Dense tensor of per-cell results with labelled axes.
#[derive(Debug, Clone)]
pub struct ResultTensor<T> {
    axes: Arc<GridAxes>,
    cells: Vec<T>,
}

impl<T> ResultTensor<T> {
    /// Wrap cells already laid out in storage order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the cell count does not match the
    /// shape of `axes`.
    pub fn from_cells(axes: Arc<GridAxes>, cells: Vec<T>) -> Result<Self> {
        let expected = axes.shape().len();
        if cells.len() != expected {
            return Err(Error::InvalidInput(format!(
                "tensor shape holds {expected} cells, got {}",
                cells.len()
            )));
        }
        Ok(Self { axes, cells })
    }

    /// Axis labels.
    #[must_use]
    pub fn axes(&self) -> &GridAxes {
        &self.axes
    }

    /// Axis extents.
    #[must_use]
    pub fn shape(&self) -> Shape {
        self.axes.shape()
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the tensor has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell at `index`.
    #[must_use]
    pub fn get(&self, index: CellIndex) -> Option<&T> {
        self.shape().offset(index).map(|offset| &self.cells[offset])
    }

    /// Every replicate of one condition for one algorithm.
    ///
    /// # Panics
    ///
    /// Panics if any coordinate is out of bounds.
    #[must_use]
    pub fn replicates(
        &self,
        dataset: usize,
        algorithm: usize,
        proportion: usize,
        gap_width: usize,
    ) -> &[T] {
        let shape = self.shape();
        let first = CellIndex {
            dataset,
            algorithm,
            proportion,
            gap_width,
            replicate: 0,
        };
        let start = shape
            .offset(first)
            .unwrap_or_else(|| panic!("cell {first:?} outside tensor shape {shape:?}"));
        &self.cells[start..start + shape.replicates]
    }

    /// Cells with their indices, in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (CellIndex, &T)> + '_ {
        let shape = self.shape();
        self.cells
            .iter()
            .enumerate()
            .map(move |(offset, cell)| (shape.index(offset), cell))
    }

    /// Same-shaped tensor with `f` applied to every cell.
    #[must_use]
    pub fn map<U, F>(&self, mut f: F) -> ResultTensor<U>
    where
        F: FnMut(CellIndex, &T) -> U,
    {
        let cells = self.iter().map(|(index, cell)| f(index, cell)).collect();
        ResultTensor {
            axes: Arc::clone(&self.axes),
            cells,
        }
    }

    /// Cells in storage order.
    #[must_use]
    pub fn into_cells(self) -> Vec<T> {
        self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axes() -> Arc<GridAxes> {
        Arc::new(GridAxes {
            datasets: vec!["a".into(), "b".into()],
            algorithms: vec!["x".into(), "y".into(), "z".into()],
            proportions: vec![0.1, 0.2],
            gap_widths: vec![1, 5, 10],
            replicates: 4,
        })
    }

    fn labelled() -> ResultTensor<usize> {
        let axes = axes();
        let len = axes.shape().len();
        ResultTensor::from_cells(axes, (0..len).collect()).unwrap()
    }

    #[test]
    fn test_shape_len() {
        assert_eq!(axes().shape().len(), 2 * 3 * 2 * 3 * 4);
    }

    #[test]
    fn test_offset_index_inverse() {
        let shape = axes().shape();
        for offset in 0..shape.len() {
            assert_eq!(shape.offset(shape.index(offset)), Some(offset));
        }
    }

    #[test]
    fn test_offset_out_of_bounds() {
        let shape = axes().shape();
        let index = CellIndex {
            dataset: 0,
            algorithm: 3,
            proportion: 0,
            gap_width: 0,
            replicate: 0,
        };
        assert!(shape.offset(index).is_none());
    }

    #[test]
    fn test_replicates_are_contiguous() {
        let tensor = labelled();
        let slice = tensor.replicates(1, 2, 1, 0);
        assert_eq!(slice.len(), 4);
        for (r, &value) in slice.iter().enumerate() {
            let index = tensor.shape().index(value);
            assert_eq!(index.replicate, r);
            assert_eq!((index.dataset, index.algorithm), (1, 2));
            assert_eq!((index.proportion, index.gap_width), (1, 0));
        }
    }

    #[test]
    fn test_map_preserves_axes() {
        let tensor = labelled();
        let doubled = tensor.map(|_, &v| v * 2);
        assert_eq!(doubled.shape(), tensor.shape());
        assert_eq!(doubled.axes().algorithms[2].as_ref(), "z");
        assert_eq!(doubled.into_cells()[5], 10);
    }

    #[test]
    fn test_from_cells_rejects_wrong_count() {
        assert!(ResultTensor::from_cells(axes(), vec![0_u8; 3]).is_err());
    }

    #[test]
    fn test_axes_labels() {
        let axes = axes();
        let key = axes.key(CellIndex {
            dataset: 1,
            algorithm: 0,
            proportion: 1,
            gap_width: 2,
            replicate: 3,
        });
        assert_eq!(key.dataset.as_ref(), "b");
        assert_eq!((key.proportion, key.gap_width, key.replicate), (0.2, 10, 3));
        assert_eq!(axes.condition(0, 0, 1).gap_width, 5);
    }
}
