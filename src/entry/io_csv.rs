// Reading a grid from a CSV file.

use monthly_grid::builder::GridBuilder;

use crate::entry::*;

/// Reads a grid laid out like the grid display: a header row with the region
/// names, then one row per metric with the metric name first.
pub fn read_csv_grid(path: &str, layout: &Layout) -> EntryResult<Grid> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut records = rdr.into_records();

    let header = match records.next() {
        Some(r) => r.context(CsvLineParseSnafu { path, lineno: 1u64 })?,
        None => whatever!("{}: the file is empty", path),
    };
    let regions: Vec<String> = header.iter().skip(1).map(|s| s.to_string()).collect();
    debug!("read_csv_grid: header: {:?}", regions);
    let mut builder = GridBuilder::new(layout)
        .header(&regions)
        .context(GridInputSnafu { path, lineno: 1u64 })?;

    for (idx, line_r) in records.enumerate() {
        let lineno = (idx + 2) as u64;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        debug!("read_csv_grid: lineno: {:?} row: {:?}", lineno, line);
        let metric = line.get(0).unwrap_or("");
        let values: Vec<Cell> = line.iter().skip(1).map(Cell::parse).collect();
        builder
            .add_row(metric, &values)
            .context(GridInputSnafu { path, lineno })?;
    }
    Ok(builder.build())
}
