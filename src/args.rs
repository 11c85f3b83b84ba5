use clap::{Parser, Subcommand};

/// This is the LEER monthly data entry program.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file with the location of the data file and the names of
    /// the metrics and regions. For more information about the file format, read the manual.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The CSV file holding all the entered values. Setting this option overrides
    /// the path that may be specified with the --config option. Defaults to data.csv.
    #[clap(short, long, value_parser)]
    pub data: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard error.
    #[clap(long, takes_value = false)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

/// The year and month of the period to work on.
#[derive(clap::Args, Debug, Clone)]
pub struct PeriodArgs {
    /// (number) The year, among the years offered by the configuration (2020 to 2025 by default).
    #[clap(short, long, value_parser)]
    pub year: Option<u16>,

    /// (month name or number) The month, for example 'January', 'jan' or '1'.
    #[clap(short, long, value_parser)]
    pub month: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Prints the content of the data file, or only the rows of one period.
    Show {
        #[clap(flatten)]
        period: PeriodArgs,
    },
    /// Prints the grid of one period.
    View {
        #[clap(flatten)]
        period: PeriodArgs,
    },
    /// Replaces the values of one period with the grid read from a file.
    Submit {
        #[clap(flatten)]
        period: PeriodArgs,

        /// (file path) The grid to submit. The first row holds the region names and the first
        /// column the metric names.
        #[clap(short, long, value_parser)]
        input: String,

        /// (default csv) The type of the input: csv or xlsx.
        #[clap(long, value_parser)]
        input_type: Option<String>,

        /// (default: first worksheet) When using an Excel file, indicates the name of the
        /// worksheet to use.
        #[clap(long, value_parser)]
        excel_worksheet_name: Option<String>,
    },
    /// Enters the values of one period interactively.
    Edit {
        #[clap(flatten)]
        period: PeriodArgs,
    },
}
