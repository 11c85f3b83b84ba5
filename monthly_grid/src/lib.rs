pub mod builder;
mod config;
pub mod manual;

use log::{debug, info, warn};

use std::collections::{BTreeSet, HashSet};

pub use crate::config::*;

// **** Table ****

/// The full history of all the periods, in long form (one record per fact).
///
/// Records are kept in insertion order. There is no index: every lookup is a
/// scan, which is fine for a table that grows by a few dozen rows a month.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Table {
    records: Vec<Record>,
}

impl Table {
    pub fn new() -> Table {
        Table::default()
    }

    pub fn from_records(records: Vec<Record>) -> Table {
        Table { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    /// All the records of one period, in table order.
    pub fn rows_for(&self, key: PeriodKey) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(move |r| r.period == key)
    }

    /// The distinct periods present in the table, sorted.
    pub fn periods(&self) -> BTreeSet<PeriodKey> {
        self.records.iter().map(|r| r.period).collect()
    }
}

// **** Grid ****

/// A dense metric × region matrix for one period.
///
/// Rows follow the metric order of the layout, columns the region order.
#[derive(PartialEq, Debug, Clone)]
pub struct Grid {
    layout: Layout,
    // Row-major: cell (m, r) is at m * num_regions + r.
    cells: Vec<Cell>,
}

impl Grid {
    /// A grid with every cell unset.
    pub fn empty(layout: &Layout) -> Grid {
        Grid {
            layout: layout.clone(),
            cells: vec![Cell::Empty; layout.num_cells()],
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    fn index(&self, metric_idx: usize, region_idx: usize) -> Option<usize> {
        cell_index(&self.layout, metric_idx, region_idx)
    }

    pub fn get(&self, metric_idx: usize, region_idx: usize) -> Option<&Cell> {
        self.index(metric_idx, region_idx).map(|i| &self.cells[i])
    }

    pub fn set(&mut self, metric_idx: usize, region_idx: usize, cell: Cell) -> Result<(), GridError> {
        let i = self
            .index(metric_idx, region_idx)
            .ok_or(GridError::ShapeMismatch)?;
        self.cells[i] = cell;
        Ok(())
    }

    pub fn cell(&self, metric: &str, region: &str) -> Option<&Cell> {
        let m = self.layout.metric_index(metric)?;
        let r = self.layout.region_index(region)?;
        self.get(m, r)
    }

    pub fn set_by_label(&mut self, metric: &str, region: &str, cell: Cell) -> Result<(), GridError> {
        let m = self
            .layout
            .metric_index(metric)
            .ok_or_else(|| GridError::UnknownMetric(metric.to_string()))?;
        let r = self
            .layout
            .region_index(region)
            .ok_or_else(|| GridError::UnknownRegion(region.to_string()))?;
        self.set(m, r, cell)
    }

    /// The rows of the grid, each with its metric name.
    pub fn rows(&self) -> impl Iterator<Item = (&String, &[Cell])> {
        self.layout
            .metrics()
            .iter()
            .zip(self.cells.chunks(self.layout.regions().len()))
    }

    /// Every cell with its labels, in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (&str, &str, &Cell)> {
        let regions = self.layout.regions();
        self.rows().flat_map(move |(metric, row)| {
            regions
                .iter()
                .zip(row.iter())
                .map(move |(region, cell)| (metric.as_str(), region.as_str(), cell))
        })
    }
}

/// A grid in which every cell holds a number. Only produced by [validate_grid].
#[derive(PartialEq, Debug, Clone)]
pub struct CheckedGrid {
    layout: Layout,
    values: Vec<f64>,
}

impl CheckedGrid {
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn value(&self, metric_idx: usize, region_idx: usize) -> Option<f64> {
        cell_index(&self.layout, metric_idx, region_idx).map(|i| self.values[i])
    }
}

/// Row-major position of a cell, if the indices are within the layout.
fn cell_index(layout: &Layout, metric_idx: usize, region_idx: usize) -> Option<usize> {
    let num_regions = layout.regions().len();
    if metric_idx < layout.metrics().len() && region_idx < num_regions {
        Some(metric_idx * num_regions + region_idx)
    } else {
        None
    }
}

// **** Pivot ****

/// Projects the records of one period onto a grid.
///
/// Cells without a matching record are left empty, whether or not the period
/// has other records. Records with a metric or region outside the layout are
/// skipped. Two records for the same cell cannot be placed and are an error.
pub fn project(table: &Table, key: PeriodKey, layout: &Layout) -> Result<Grid, GridError> {
    let mut grid = Grid::empty(layout);
    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    let mut num_rows = 0;
    for rec in table.rows_for(key) {
        num_rows += 1;
        let (m, r) = match (layout.metric_index(&rec.metric), layout.region_index(&rec.region)) {
            (Some(m), Some(r)) => (m, r),
            _ => {
                debug!(
                    "project: period {}: skipping record outside the layout: {:?}",
                    key, rec
                );
                continue;
            }
        };
        if !seen.insert((m, r)) {
            return Err(GridError::DuplicateEntry {
                period: key,
                metric: rec.metric.clone(),
                region: rec.region.clone(),
            });
        }
        grid.set(m, r, Cell::Number(rec.value))?;
    }
    debug!(
        "project: period {}: {} records, {} cells filled out of {}",
        key,
        num_rows,
        seen.len(),
        layout.num_cells()
    );
    Ok(grid)
}

// **** Validation ****

/// True when every cell has some content, numeric or not.
pub fn is_complete(grid: &Grid) -> bool {
    grid.cells.iter().all(|c| !c.is_empty())
}

/// Checks that a grid can be persisted: no empty cell, and every cell numeric.
///
/// All the empty cells are reported at once. The numeric check only runs on a
/// complete grid and stops at the first offending cell.
pub fn validate_grid(grid: &Grid) -> Result<CheckedGrid, GridError> {
    let missing: Vec<(String, String)> = grid
        .cells()
        .filter(|(_, _, c)| c.is_empty())
        .map(|(m, r, _)| (m.to_string(), r.to_string()))
        .collect();
    if !missing.is_empty() {
        debug!("validate_grid: {} empty cells", missing.len());
        return Err(GridError::Incomplete(missing));
    }

    let mut values: Vec<f64> = Vec::with_capacity(grid.cells.len());
    for (metric, region, cell) in grid.cells() {
        match cell.as_number() {
            Some(x) => values.push(x),
            None => {
                return Err(GridError::NotNumeric {
                    metric: metric.to_string(),
                    region: region.to_string(),
                    content: cell.to_string(),
                });
            }
        }
    }
    Ok(CheckedGrid {
        layout: grid.layout.clone(),
        values,
    })
}

// **** Un-pivot and merge ****

/// Turns a checked grid back into records for the given period.
///
/// The records are grouped by region (all the metrics of the first region,
/// then the second region, and so on).
pub fn unpivot(grid: &CheckedGrid, key: PeriodKey) -> Vec<Record> {
    let layout = grid.layout();
    let mut res: Vec<Record> = Vec::with_capacity(layout.num_cells());
    let num_regions = layout.regions().len();
    for (r, region) in layout.regions().iter().enumerate() {
        for (m, metric) in layout.metrics().iter().enumerate() {
            res.push(Record {
                period: key,
                metric: metric.clone(),
                region: region.clone(),
                value: grid.values[m * num_regions + r],
            });
        }
    }
    res
}

/// Removes every record of the period, then appends the new ones.
pub fn replace_period(table: Table, key: PeriodKey, records: Vec<Record>) -> Table {
    let before = table.len();
    let mut kept: Vec<Record> = table
        .into_records()
        .into_iter()
        .filter(|r| r.period != key)
        .collect();
    let removed = before - kept.len();
    if records.iter().any(|r| r.period != key) {
        warn!(
            "replace_period: some of the new records are not for period {}",
            key
        );
    }
    info!(
        "Period {}: replacing {} records with {} records",
        key,
        removed,
        records.len()
    );
    kept.extend(records);
    Table::from_records(kept)
}

/// Validates the grid and replaces the whole period with its content.
///
/// On error the given table is dropped. Nothing has been persisted at that
/// point, so callers reload it from their store.
pub fn merge_grid(table: Table, key: PeriodKey, grid: &Grid) -> Result<Table, GridError> {
    let checked = validate_grid(grid)?;
    let records = unpivot(&checked, key);
    Ok(replace_period(table, key, records))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn jan_2024() -> PeriodKey {
        Period::new(2024, Month::January).key()
    }

    fn rec(period: u32, metric: &str, region: &str, value: f64) -> Record {
        Record {
            period: PeriodKey(period),
            metric: metric.to_string(),
            region: region.to_string(),
            value,
        }
    }

    fn filled(layout: &Layout, value: f64) -> Grid {
        let mut g = Grid::empty(layout);
        for m in 0..layout.metrics().len() {
            for r in 0..layout.regions().len() {
                g.set(m, r, Cell::Number(value)).unwrap();
            }
        }
        g
    }

    fn triples(table: &Table, key: PeriodKey) -> Vec<(String, String, f64)> {
        let mut v: Vec<(String, String, f64)> = table
            .rows_for(key)
            .map(|r| (r.metric.clone(), r.region.clone(), r.value))
            .collect();
        v.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
        v
    }

    #[test]
    fn period_key_pads_month() {
        assert_eq!(Period::new(2024, Month::January).key(), PeriodKey(202401));
        assert_eq!(Period::new(2020, Month::December).key(), PeriodKey(202012));
        assert_eq!(PeriodKey(202401).to_string(), "202401");
    }

    #[test]
    fn month_parsing() {
        assert_eq!("March".parse::<Month>(), Ok(Month::March));
        assert_eq!("sep".parse::<Month>(), Ok(Month::September));
        assert_eq!("11".parse::<Month>(), Ok(Month::November));
        assert!("13".parse::<Month>().is_err());
        assert!("Ma".parse::<Month>().is_err());
    }

    #[test]
    fn layout_rejects_duplicates() {
        let m = vec!["A".to_string(), "A".to_string()];
        let r = vec!["East".to_string()];
        assert!(matches!(
            Layout::new(&m, &r),
            Err(GridError::InvalidLayout(_))
        ));
        assert!(Layout::new(&[], &r).is_err());
    }

    #[test]
    fn layout_rejects_padded_labels() {
        let m = vec!["Drivers".to_string()];
        for bad in [" East", "East ", "\tEast"] {
            assert!(matches!(
                Layout::new(&m, &[bad.to_string()]),
                Err(GridError::InvalidLayout(_))
            ));
            assert!(matches!(
                Layout::new(&[bad.to_string()], &m),
                Err(GridError::InvalidLayout(_))
            ));
        }
        assert!(Layout::new(&m, &["North East".to_string()]).is_ok());
    }

    #[test]
    fn unknown_period_projects_empty_grid() {
        init();
        let layout = Layout::default();
        let table = Table::from_records(vec![rec(202312, "Drivers", "East", 3.0)]);
        let grid = project(&table, jan_2024(), &layout).unwrap();
        assert!(grid.cells().all(|(_, _, c)| c.is_empty()));
        assert_eq!(grid.cells().count(), 24);
    }

    #[test]
    fn partial_period_leaves_missing_cells_empty() {
        init();
        let layout = Layout::default();
        let table = Table::from_records(vec![
            rec(202401, "Drivers", "East", 3.0),
            rec(202401, "Nonsense", "East", 7.0),
        ]);
        let grid = project(&table, jan_2024(), &layout).unwrap();
        assert_eq!(grid.cell("Drivers", "East"), Some(&Cell::Number(3.0)));
        assert_eq!(grid.cell("Drivers", "West"), Some(&Cell::Empty));
        assert!(!is_complete(&grid));
    }

    #[test]
    fn duplicate_records_are_rejected() {
        let layout = Layout::default();
        let table = Table::from_records(vec![
            rec(202401, "Units", "TMX", 1.0),
            rec(202401, "Units", "TMX", 2.0),
        ]);
        assert!(matches!(
            project(&table, jan_2024(), &layout),
            Err(GridError::DuplicateEntry { .. })
        ));
    }

    #[test]
    fn completeness_ignores_content_type() {
        let layout = Layout::default();
        let mut grid = filled(&layout, 1.0);
        assert!(is_complete(&grid));
        grid.set_by_label("Trips", "West", Cell::Text("lots".to_string()))
            .unwrap();
        assert!(is_complete(&grid));
        grid.set_by_label("Trips", "West", Cell::Empty).unwrap();
        assert!(!is_complete(&grid));
    }

    #[test]
    fn validation_reports_every_empty_cell() {
        let layout = Layout::default();
        let mut grid = filled(&layout, 1.0);
        grid.set(0, 0, Cell::Empty).unwrap();
        grid.set(5, 3, Cell::Empty).unwrap();
        match validate_grid(&grid) {
            Err(GridError::Incomplete(cells)) => assert_eq!(
                cells,
                vec![
                    ("Contract Miles".to_string(), "East".to_string()),
                    ("WPL Miles".to_string(), "TMX".to_string())
                ]
            ),
            x => panic!("unexpected result {:?}", x),
        }
    }

    #[test]
    fn validation_rejects_text() {
        let layout = Layout::default();
        let mut grid = filled(&layout, 1.0);
        grid.set_by_label("Units", "Midwest", Cell::Text("n/a".to_string()))
            .unwrap();
        assert!(matches!(
            validate_grid(&grid),
            Err(GridError::NotNumeric { .. })
        ));
        grid.set_by_label("Units", "Midwest", Cell::Text(" 12.5 ".to_string()))
            .unwrap();
        let checked = validate_grid(&grid).unwrap();
        assert_eq!(checked.value(4, 1), Some(12.5));
        assert_eq!(checked.value(6, 0), None);
        assert_eq!(checked.value(0, 4), None);
    }

    #[test]
    fn validation_rejects_non_finite_numbers() {
        let layout = Layout::default();
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut grid = filled(&layout, 1.0);
            grid.set_by_label("Trips", "East", Cell::Number(bad)).unwrap();
            assert!(is_complete(&grid));
            assert!(matches!(
                validate_grid(&grid),
                Err(GridError::NotNumeric { ref metric, ref region, .. })
                    if metric == "Trips" && region == "East"
            ));
        }
        assert_eq!(Cell::Number(f64::NAN).as_number(), None);
        assert_eq!(Cell::parse("NaN"), Cell::Text("NaN".to_string()));
    }

    #[test]
    fn unpivot_is_grouped_by_region() {
        let layout = Layout::default();
        let checked = validate_grid(&filled(&layout, 2.0)).unwrap();
        let rows = unpivot(&checked, jan_2024());
        assert_eq!(rows.len(), 24);
        assert_eq!(rows[0].metric, "Contract Miles");
        assert_eq!(rows[0].region, "East");
        assert_eq!(rows[5].metric, "WPL Miles");
        assert_eq!(rows[6].region, "Midwest");
    }

    #[test]
    fn all_tens_scenario() {
        init();
        let layout = Layout::default();
        let table = Table::from_records(vec![rec(202312, "Drivers", "East", 3.0)]);
        let table = merge_grid(table, jan_2024(), &filled(&layout, 10.0)).unwrap();
        let rows: Vec<&Record> = table.rows_for(jan_2024()).collect();
        assert_eq!(rows.len(), 24);
        assert!(rows.iter().all(|r| r.value == 10.0));
        assert_eq!(table.len(), 25);

        let grid = project(&table, jan_2024(), &layout).unwrap();
        assert!(grid.cells().all(|(_, _, c)| *c == Cell::Number(10.0)));
    }

    #[test]
    fn round_trip_is_lossless() {
        let layout = Layout::default();
        let mut records = Vec::new();
        for m in layout.metrics() {
            for r in layout.regions() {
                records.push(rec(202401, m, r, records.len() as f64 * 1.5));
            }
        }
        let table = Table::from_records(records);
        let grid = project(&table, jan_2024(), &layout).unwrap();
        let merged = merge_grid(table.clone(), jan_2024(), &grid).unwrap();
        assert_eq!(triples(&table, jan_2024()), triples(&merged, jan_2024()));
    }

    #[test]
    fn resubmitting_is_idempotent() {
        let layout = Layout::default();
        let grid = filled(&layout, 4.0);
        let once = merge_grid(Table::new(), jan_2024(), &grid).unwrap();
        let twice = merge_grid(once.clone(), jan_2024(), &grid).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn submission_replaces_the_whole_period() {
        let layout = Layout::default();
        let table = Table::from_records(vec![
            rec(202401, "Drivers", "East", 1.0),
            rec(202401, "Drivers", "East", 1.0),
            rec(202401, "Legacy", "North", 9.0),
            rec(202402, "Drivers", "East", 5.0),
        ]);
        let merged = merge_grid(table, jan_2024(), &filled(&layout, 7.0)).unwrap();
        assert_eq!(merged.rows_for(jan_2024()).count(), 24);
        assert!(merged.rows_for(jan_2024()).all(|r| r.value == 7.0));
        assert_eq!(merged.rows_for(PeriodKey(202402)).count(), 1);
        // Untouched periods keep their position at the front.
        assert_eq!(merged.records()[0].period, PeriodKey(202402));
    }

    #[test]
    fn invalid_grid_leaves_no_trace() {
        let layout = Layout::default();
        let grid = Grid::empty(&layout);
        let res = merge_grid(Table::new(), jan_2024(), &grid);
        assert!(matches!(res, Err(GridError::Incomplete(ref v)) if v.len() == 24));
    }

    #[test]
    fn periods_are_sorted() {
        let table = Table::from_records(vec![
            rec(202402, "Drivers", "East", 1.0),
            rec(202401, "Drivers", "East", 1.0),
            rec(202402, "Units", "East", 1.0),
        ]);
        let p: Vec<PeriodKey> = table.periods().into_iter().collect();
        assert_eq!(p, vec![PeriodKey(202401), PeriodKey(202402)]);
    }
}
