use log::{debug, info, warn};

use monthly_grid::*;
use snafu::{prelude::*, Snafu};

use std::path::Path;

use text_diff::print_diff;

use crate::args::{Args, Command, PeriodArgs};
use crate::entry::config_reader::*;
use crate::entry::io_common::{render_grid, render_table};
use crate::entry::store::TableStore;

mod config_reader;
mod io_common;
mod io_csv;
mod io_xlsx;
mod prompt;
mod store;

#[derive(Debug, Snafu)]
pub enum EntryError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet in {path}"))]
    EmptyExcel { path: String },
    #[snafu(display("Worksheet {name:?} not found in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("{path}: row {lineno}, column {col}: could not understand cell {content}"))]
    ExcelWrongCellType {
        path: String,
        lineno: u64,
        col: usize,
        content: String,
    },
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing configuration file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: u64,
    },
    #[snafu(display("Line {lineno} of {path}: {content:?} is not a period (YYYYMM)"))]
    CsvBadPeriod {
        path: String,
        lineno: u64,
        content: String,
    },
    #[snafu(display("Line {lineno} of {path}: {value} is not a valid value"))]
    CsvBadValue {
        path: String,
        lineno: u64,
        value: f64,
    },
    #[snafu(display("Error writing file {path}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("Error writing file {path}"))]
    Writing {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error replacing file {path}"))]
    Persisting {
        source: tempfile::PersistError,
        path: String,
    },
    #[snafu(display("Invalid grid in {path}, line {lineno}"))]
    GridInput {
        source: GridError,
        path: String,
        lineno: u64,
    },
    #[snafu(display("Invalid grid"))]
    Grid { source: GridError },
    #[snafu(display("Invalid period"))]
    InvalidPeriod { source: GridError },
    #[snafu(display("Invalid configuration"))]
    InvalidSettings { source: GridError },
    #[snafu(display("Error while prompting"))]
    Prompt { source: dialoguer::Error },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type EntryResult<T> = Result<T, EntryError>;

/// The outcome of a submission.
#[derive(Debug)]
pub enum Submission {
    /// The grid was not valid. Nothing was written.
    Rejected(GridError),
    /// The period has been replaced and the data file rewritten.
    Saved {
        /// The grid of the period before the submission, if it could be projected.
        previous: Option<Grid>,
        /// The grid of the period, as read back from the data file.
        current: Grid,
    },
}

/// An editing session over one data file.
///
/// The table is never cached: every operation reads the file again, so that
/// the view always reflects what is on disk. Writes assume that nobody else
/// is writing the same file at the same time.
pub struct Session<'a> {
    store: &'a TableStore,
    layout: Layout,
}

impl<'a> Session<'a> {
    pub fn new(store: &'a TableStore, layout: &Layout) -> Session<'a> {
        Session {
            store,
            layout: layout.clone(),
        }
    }

    pub fn table(&self) -> EntryResult<Table> {
        self.store.load()
    }

    /// The current grid of a period.
    pub fn view(&self, period: &Period) -> EntryResult<Grid> {
        let table = self.store.load()?;
        project(&table, period.key(), &self.layout).context(GridSnafu {})
    }

    /// Validates the grid and, if valid, replaces the period in the data file.
    pub fn submit(&self, period: &Period, grid: &Grid) -> EntryResult<Submission> {
        let key = period.key();
        if grid.layout() != &self.layout {
            return Err(GridError::ShapeMismatch).context(GridSnafu {});
        }
        let table = self.store.load()?;
        let previous = match project(&table, key, &self.layout) {
            Ok(g) => Some(g),
            Err(e) => {
                warn!("Period {}: the current data cannot be shown: {}", key, e);
                None
            }
        };
        let merged = match merge_grid(table, key, grid) {
            Ok(t) => t,
            Err(e) => {
                info!("Period {}: submission rejected: {}", key, e);
                return Ok(Submission::Rejected(e));
            }
        };
        self.store.save(&merged)?;
        let current = self.view(period)?;
        Ok(Submission::Saved { previous, current })
    }
}

fn load_settings(args: &Args) -> EntryResult<Settings> {
    let config = match &args.config {
        Some(p) => read_config(p)?,
        None => EntryConfig::default(),
    };
    let root = args.config.as_ref().and_then(|p| Path::new(p).parent());
    let settings = config.settings(root, args.data.clone())?;
    debug!("settings: {:?}", settings);
    Ok(settings)
}

/// Reads the period from the command line. Both the year and the month must be
/// given, or none of them.
fn resolve_period(settings: &Settings, pargs: &PeriodArgs) -> EntryResult<Option<Period>> {
    match (pargs.year, &pargs.month) {
        (Some(year), Some(month)) => {
            let m: Month = month.parse().context(InvalidPeriodSnafu {})?;
            settings.period(year, m).map(Some)
        }
        (None, None) => Ok(None),
        (Some(_), None) => whatever!("A month is required with --year"),
        (None, Some(_)) => whatever!("A year is required with --month"),
    }
}

fn require_period(settings: &Settings, pargs: &PeriodArgs) -> EntryResult<Period> {
    match resolve_period(settings, pargs)? {
        Some(p) => Ok(p),
        None => whatever!("Both --year and --month are required"),
    }
}

pub fn run(args: &Args) -> EntryResult<()> {
    let settings = load_settings(args)?;
    let store = TableStore::new(&settings.data_path);
    info!("Data file: {}", store.path().display());
    let session = Session::new(&store, &settings.layout);
    match &args.command {
        Command::Show { period } => {
            let p = resolve_period(&settings, period)?;
            run_show(&session, p.as_ref())
        }
        Command::View { period } => {
            let p = require_period(&settings, period)?;
            run_view(&session, &p)
        }
        Command::Submit {
            period,
            input,
            input_type,
            excel_worksheet_name,
        } => {
            let p = require_period(&settings, period)?;
            let grid = read_grid_input(
                input,
                input_type.as_deref(),
                excel_worksheet_name.as_deref(),
                &settings.layout,
            )?;
            run_submit(&session, &p, &grid)
        }
        Command::Edit { period } => {
            let p = match resolve_period(&settings, period)? {
                Some(p) => p,
                None => prompt::select_period(&settings)?,
            };
            run_edit(&session, &p)
        }
    }
}

fn read_grid_input(
    path: &str,
    input_type: Option<&str>,
    worksheet: Option<&str>,
    layout: &Layout,
) -> EntryResult<Grid> {
    info!("Attempting to read grid file {:?}", path);
    match input_type.unwrap_or("csv") {
        "csv" => io_csv::read_csv_grid(path, layout),
        "xlsx" | "excel" => io_xlsx::read_excel_grid(path, worksheet, layout),
        x => whatever!("Input type not implemented {:?}", x),
    }
}

fn run_show(session: &Session, period: Option<&Period>) -> EntryResult<()> {
    let table = session.table()?;
    let records: Vec<Record> = match period {
        Some(p) => table.rows_for(p.key()).cloned().collect(),
        None => table.records().to_vec(),
    };
    if records.is_empty() {
        println!("No data.");
    } else {
        print!("{}", render_table(&records));
    }
    Ok(())
}

fn run_view(session: &Session, period: &Period) -> EntryResult<()> {
    let grid = session.view(period)?;
    println!("Data for {}", period);
    print!("{}", render_grid(&grid));
    Ok(())
}

fn report_saved(period: &Period, previous: &Option<Grid>, current: &Grid) {
    println!("Data for {} has been updated.", period);
    let new_s = render_grid(current);
    match previous {
        Some(prev) if prev.cells().any(|(_, _, c)| !c.is_empty()) => {
            let prev_s = render_grid(prev);
            if prev_s != new_s {
                print_diff(prev_s.as_str(), new_s.as_str(), "\n");
                return;
            }
        }
        _ => {}
    }
    print!("{}", new_s);
}

fn run_submit(session: &Session, period: &Period, grid: &Grid) -> EntryResult<()> {
    match session.submit(period, grid)? {
        Submission::Rejected(e) => Err(e).context(GridSnafu {}),
        Submission::Saved { previous, current } => {
            report_saved(period, &previous, &current);
            Ok(())
        }
    }
}

fn run_edit(session: &Session, period: &Period) -> EntryResult<()> {
    let mut grid = session.view(period)?;
    println!("Enter data for {}", period);
    print!("{}", render_grid(&grid));
    loop {
        grid = prompt::edit_grid(&grid)?;
        print!("{}", render_grid(&grid));
        if !prompt::confirm_submit(period)? {
            println!("Nothing was saved.");
            return Ok(());
        }
        match session.submit(period, &grid)? {
            Submission::Rejected(e) => {
                eprintln!("{}", e);
            }
            Submission::Saved { previous, current } => {
                report_saved(period, &previous, &current);
                return Ok(());
            }
        }
    }
}
