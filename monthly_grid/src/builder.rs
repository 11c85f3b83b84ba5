pub use crate::config::*;
use crate::Grid;

use log::debug;

/// A builder for filling a grid from labelled rows.
///
/// Input files and prompts do not necessarily follow the order of the layout.
/// The builder matches the column headers with the regions and the first cell
/// of every row with the metrics. Cells that are never provided stay empty.
///
/// ```
/// use monthly_grid::builder::GridBuilder;
/// use monthly_grid::{is_complete, Cell, Layout};
/// # use monthly_grid::GridError;
///
/// let layout = Layout::new(&["Drivers".to_string()], &["East".to_string(), "West".to_string()])?;
/// let mut builder = GridBuilder::new(&layout)
///     .header(&["West".to_string(), "East".to_string()])?;
///
/// builder.add_row_simple("Drivers", &["4", "12"])?;
///
/// let grid = builder.build();
/// assert_eq!(grid.cell("Drivers", "East"), Some(&Cell::Number(12.0)));
/// assert!(is_complete(&grid));
/// # Ok::<(), GridError>(())
/// ```
pub struct Builder {
    pub(crate) _grid: Grid,
    // For each input column, the index of the region in the layout.
    // None for the columns without a header, which are ignored.
    pub(crate) _columns: Vec<Option<usize>>,
    pub(crate) _seen_metrics: Vec<bool>,
}

pub type GridBuilder = Builder;

impl Builder {
    /// A builder whose value columns follow the region order of the layout.
    pub fn new(layout: &Layout) -> Builder {
        Builder {
            _grid: Grid::empty(layout),
            _columns: (0..layout.regions().len()).map(Some).collect(),
            _seen_metrics: vec![false; layout.metrics().len()],
        }
    }

    /// Sets the region labels of the value columns.
    ///
    /// Blank labels mark columns to ignore. Unknown and repeated labels are
    /// errors.
    pub fn header(self, labels: &[String]) -> Result<Builder, GridError> {
        let layout = self._grid.layout();
        let mut columns: Vec<Option<usize>> = Vec::with_capacity(labels.len());
        for label in labels {
            let l = label.trim();
            if l.is_empty() {
                columns.push(None);
                continue;
            }
            let idx = layout
                .region_index(l)
                .ok_or_else(|| GridError::UnknownRegion(l.to_string()))?;
            if columns.contains(&Some(idx)) {
                return Err(GridError::DuplicateLabel(l.to_string()));
            }
            columns.push(Some(idx));
        }
        debug!("Builder::header: columns {:?}", columns);
        Ok(Builder {
            _grid: self._grid,
            _columns: columns,
            _seen_metrics: self._seen_metrics,
        })
    }

    /// Adds the values of a metric, one per value column.
    ///
    /// A row with a blank metric name and no value is skipped. Values in
    /// columns without a header must be empty.
    pub fn add_row(&mut self, metric: &str, values: &[Cell]) -> Result<(), GridError> {
        let m = metric.trim();
        if m.is_empty() && values.iter().all(|c| c.is_empty()) {
            return Ok(());
        }
        let m_idx = self
            ._grid
            .layout()
            .metric_index(m)
            .ok_or_else(|| GridError::UnknownMetric(m.to_string()))?;
        if self._seen_metrics[m_idx] {
            return Err(GridError::DuplicateLabel(m.to_string()));
        }

        // The whole row is checked before the grid is touched.
        let mut updates: Vec<(usize, &Cell)> = Vec::with_capacity(values.len());
        for (col, cell) in values.iter().enumerate() {
            match self._columns.get(col).copied().flatten() {
                Some(r_idx) => updates.push((r_idx, cell)),
                None if cell.is_empty() => {}
                None => return Err(GridError::ShapeMismatch),
            }
        }
        for (r_idx, cell) in updates {
            self._grid.set(m_idx, r_idx, cell.clone())?;
        }
        self._seen_metrics[m_idx] = true;
        Ok(())
    }

    /// Adds a row of raw text values.
    pub fn add_row_simple(&mut self, metric: &str, values: &[&str]) -> Result<(), GridError> {
        let cells: Vec<Cell> = values.iter().map(|s| Cell::parse(s)).collect();
        self.add_row(metric, &cells)
    }

    pub fn build(self) -> Grid {
        self._grid
    }
}
