// Reading a grid from an Excel workbook.

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};
use monthly_grid::builder::GridBuilder;

use crate::entry::*;

pub fn read_excel_grid(path: &str, worksheet: Option<&str>, layout: &Layout) -> EntryResult<Grid> {
    let wrange = get_range(path, worksheet)?;
    let mut rows = wrange.rows();

    let header = rows.next().context(EmptyExcelSnafu { path })?;
    let regions: Vec<String> = header.iter().skip(1).map(read_label).collect();
    debug!("read_excel_grid: header: {:?}", regions);
    let mut builder = GridBuilder::new(layout)
        .header(&regions)
        .context(GridInputSnafu { path, lineno: 1u64 })?;

    for (idx, row) in rows.enumerate() {
        let lineno = (idx + 2) as u64;
        debug!("read_excel_grid: lineno: {:?} row: {:?}", lineno, row);
        let metric = row.first().map(read_label).unwrap_or_default();
        let mut values: Vec<Cell> = Vec::new();
        for (col, elt) in row.iter().enumerate().skip(1) {
            let cell = read_cell(elt).context(ExcelWrongCellTypeSnafu {
                path,
                lineno,
                col: col + 1,
                content: format!("{:?}", elt),
            })?;
            values.push(cell);
        }
        builder
            .add_row(&metric, &values)
            .context(GridInputSnafu { path, lineno })?;
    }
    Ok(builder.build())
}

fn get_range(path: &str, worksheet: Option<&str>) -> EntryResult<Range<DataType>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match worksheet {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { name, path })?
            .context(OpeningExcelSnafu { path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?,
    };
    Ok(wrange)
}

fn read_label(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.trim().to_string(),
        DataType::Empty => "".to_string(),
        x => x.to_string(),
    }
}

/// Numbers are taken as is, strings go through the same parsing as typed input.
/// Booleans, dates and formula errors are not accepted.
fn read_cell(cell: &DataType) -> Option<Cell> {
    match cell {
        DataType::Float(f) => Some(Cell::Number(*f)),
        DataType::Int(i) => Some(Cell::Number(*i as f64)),
        DataType::String(s) => Some(Cell::parse(s)),
        DataType::Empty => Some(Cell::Empty),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells() {
        assert_eq!(read_cell(&DataType::Float(2.5)), Some(Cell::Number(2.5)));
        assert_eq!(read_cell(&DataType::Int(7)), Some(Cell::Number(7.0)));
        assert_eq!(
            read_cell(&DataType::String(" 12 ".to_string())),
            Some(Cell::Number(12.0))
        );
        assert_eq!(read_cell(&DataType::String("".to_string())), Some(Cell::Empty));
        assert_eq!(read_cell(&DataType::Empty), Some(Cell::Empty));
        assert_eq!(read_cell(&DataType::Bool(true)), None);
    }

    #[test]
    fn labels() {
        assert_eq!(read_label(&DataType::String(" East ".to_string())), "East");
        assert_eq!(read_label(&DataType::Empty), "");
        assert_eq!(read_label(&DataType::Int(2024)), "2024");
    }

    #[test]
    fn missing_workbook() {
        assert!(matches!(
            read_excel_grid("/nonexistent/grid.xlsx", None, &Layout::default()),
            Err(EntryError::OpeningExcel { .. })
        ));
    }

    const WORKBOOK: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/grid.xlsx");

    #[test]
    fn first_worksheet_by_default() {
        let grid = read_excel_grid(WORKBOOK, None, &Layout::default()).unwrap();
        assert!(is_complete(&grid));
        // The columns of the sheet are West, East, TMX, Midwest.
        assert_eq!(grid.cell("Contract Miles", "East"), Some(&Cell::Number(1.0)));
        assert_eq!(grid.cell("Contract Miles", "Midwest"), Some(&Cell::Number(2.0)));
        assert_eq!(grid.cell("Drivers", "West"), Some(&Cell::Number(103.0)));
        assert_eq!(grid.cell("WPL Miles", "TMX"), Some(&Cell::Number(504.0)));
        assert_eq!(grid.cell("Trips", "East"), Some(&Cell::Number(12.0)));
        assert_eq!(
            grid,
            read_excel_grid(WORKBOOK, Some("January"), &Layout::default()).unwrap()
        );
    }

    #[test]
    fn wrong_cell_type_names_the_position() {
        match read_excel_grid(WORKBOOK, Some("Broken"), &Layout::default()) {
            Err(EntryError::ExcelWrongCellType { lineno, col, .. }) => {
                assert_eq!(lineno, 3);
                assert_eq!(col, 3);
            }
            x => panic!("unexpected result {:?}", x),
        }
    }

    #[test]
    fn missing_worksheet() {
        assert!(matches!(
            read_excel_grid(WORKBOOK, Some("February"), &Layout::default()),
            Err(EntryError::MissingWorksheet { ref name, .. }) if name == "February"
        ));
    }
}
