// ********* Period keys ***********

use std::error::Error;
use std::fmt::Display;
use std::str::FromStr;

/// The twelve calendar months, in order.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Month {
    January = 1,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// The month number, between 1 and 12.
    pub fn number(&self) -> u32 {
        *self as u32
    }

    pub fn name(&self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }

    pub fn from_number(n: u32) -> Option<Month> {
        if (1..=12).contains(&n) {
            Some(Month::ALL[(n - 1) as usize])
        } else {
            None
        }
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Month {
    type Err = GridError;

    /// Accepts the full English name, its three-letter abbreviation (both case
    /// insensitive) or the month number.
    fn from_str(s: &str) -> Result<Month, GridError> {
        let t = s.trim();
        if let Ok(n) = t.parse::<u32>() {
            return Month::from_number(n).ok_or_else(|| GridError::UnknownMonth(s.to_string()));
        }
        let lower = t.to_lowercase();
        Month::ALL
            .iter()
            .find(|m| {
                let name = m.name().to_lowercase();
                name == lower || (lower.len() == 3 && name.starts_with(&lower))
            })
            .copied()
            .ok_or_else(|| GridError::UnknownMonth(s.to_string()))
    }
}

/// The integer YYYYMM identifying a period in the table.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct PeriodKey(pub u32);

impl Display for PeriodKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06}", self.0)
    }
}

/// A year and month selection.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct Period {
    pub year: u16,
    pub month: Month,
}

impl Period {
    pub fn new(year: u16, month: Month) -> Period {
        Period { year, month }
    }

    /// The year followed by the zero-padded month number: March 2024 is 202403.
    pub fn key(&self) -> PeriodKey {
        PeriodKey(self.year as u32 * 100 + self.month.number())
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.month, self.year)
    }
}

// ********* Layout **********

/// The fixed row (metric) and column (region) labels of every grid.
///
/// Both lists are closed for the lifetime of a session. Their order is the
/// display order of the grid.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Layout {
    metrics: Vec<String>,
    regions: Vec<String>,
}

impl Layout {
    pub const DEFAULT_METRICS: [&'static str; 6] = [
        "Contract Miles",
        "Drivers",
        "Tractors",
        "Trips",
        "Units",
        "WPL Miles",
    ];

    pub const DEFAULT_REGIONS: [&'static str; 4] = ["East", "Midwest", "West", "TMX"];

    /// Builds a layout, checking that the labels are non-empty, unique and
    /// without surrounding spaces.
    pub fn new(metrics: &[String], regions: &[String]) -> Result<Layout, GridError> {
        check_labels("metric", metrics)?;
        check_labels("region", regions)?;
        Ok(Layout {
            metrics: metrics.to_vec(),
            regions: regions.to_vec(),
        })
    }

    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn metric_index(&self, metric: &str) -> Option<usize> {
        self.metrics.iter().position(|m| m == metric)
    }

    pub fn region_index(&self, region: &str) -> Option<usize> {
        self.regions.iter().position(|r| r == region)
    }

    /// Number of cells in a grid of this layout.
    pub fn num_cells(&self) -> usize {
        self.metrics.len() * self.regions.len()
    }
}

impl Default for Layout {
    fn default() -> Layout {
        Layout {
            metrics: Layout::DEFAULT_METRICS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            regions: Layout::DEFAULT_REGIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

fn check_labels(kind: &'static str, labels: &[String]) -> Result<(), GridError> {
    if labels.is_empty() {
        return Err(GridError::InvalidLayout(format!("no {} defined", kind)));
    }
    for (idx, label) in labels.iter().enumerate() {
        if label.trim().is_empty() {
            return Err(GridError::InvalidLayout(format!(
                "empty {} name at position {}",
                kind,
                idx + 1
            )));
        }
        if label.trim() != label.as_str() {
            return Err(GridError::InvalidLayout(format!(
                "{} name {:?} has leading or trailing spaces",
                kind, label
            )));
        }
        if labels[..idx].contains(label) {
            return Err(GridError::InvalidLayout(format!(
                "duplicate {} name: {}",
                kind, label
            )));
        }
    }
    Ok(())
}

// ******** Rows and cells *********

/// One fact of the table: the value of a metric for a region during a period.
#[derive(PartialEq, Debug, Clone)]
pub struct Record {
    pub period: PeriodKey,
    pub metric: String,
    pub region: String,
    pub value: f64,
}

/// The content of a grid cell, as entered by the user.
#[derive(PartialEq, Debug, Clone)]
pub enum Cell {
    /// No value has been provided.
    Empty,
    Number(f64),
    /// Some content that was entered but is not (yet) known to be a number.
    Text(String),
}

impl Cell {
    /// Interprets raw user input: blank becomes `Empty`, anything that parses
    /// as a finite number becomes `Number`, the rest is kept as `Text`.
    pub fn parse(s: &str) -> Cell {
        let t = s.trim();
        if t.is_empty() {
            return Cell::Empty;
        }
        match t.parse::<f64>() {
            Ok(x) if x.is_finite() => Cell::Number(x),
            _ => Cell::Text(s.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// The numeric value of the cell, if it has a finite one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(x) if x.is_finite() => Some(*x),
            Cell::Number(_) => None,
            Cell::Text(s) => match s.trim().parse::<f64>() {
                Ok(x) if x.is_finite() => Some(x),
                _ => None,
            },
            Cell::Empty => None,
        }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(x) => write!(f, "{}", x),
            Cell::Text(s) => write!(f, "{}", s),
        }
    }
}

// ******** Errors *********

/// Errors that prevent a grid from being projected or merged.
#[derive(PartialEq, Debug, Clone)]
pub enum GridError {
    /// Some cells have no value. Contains all the (metric, region) pairs.
    Incomplete(Vec<(String, String)>),
    NotNumeric {
        metric: String,
        region: String,
        content: String,
    },
    /// The table holds more than one record for the same cell of a period.
    DuplicateEntry {
        period: PeriodKey,
        metric: String,
        region: String,
    },
    UnknownMetric(String),
    UnknownRegion(String),
    UnknownMonth(String),
    /// A row or column label appears twice in an input.
    DuplicateLabel(String),
    InvalidLayout(String),
    /// The grid does not have the shape of the layout it is merged with.
    ShapeMismatch,
}

impl Error for GridError {}

impl Display for GridError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridError::Incomplete(cells) => {
                let names: Vec<String> = cells
                    .iter()
                    .map(|(m, r)| format!("{}/{}", m, r))
                    .collect();
                write!(
                    f,
                    "Please fill all cells with numeric values ({} empty: {})",
                    cells.len(),
                    names.join(", ")
                )
            }
            GridError::NotNumeric {
                metric,
                region,
                content,
            } => write!(
                f,
                "Please fill all cells with numeric values ({}/{} contains {:?})",
                metric, region, content
            ),
            GridError::DuplicateEntry {
                period,
                metric,
                region,
            } => write!(
                f,
                "Period {} has several values for {}/{}",
                period, metric, region
            ),
            GridError::UnknownMetric(m) => write!(f, "Unknown metric: {:?}", m),
            GridError::UnknownRegion(r) => write!(f, "Unknown region: {:?}", r),
            GridError::UnknownMonth(m) => write!(f, "Unknown month: {:?}", m),
            GridError::DuplicateLabel(l) => write!(f, "Label {:?} appears more than once", l),
            GridError::InvalidLayout(msg) => write!(f, "Invalid layout: {}", msg),
            GridError::ShapeMismatch => write!(f, "The grid does not match the layout"),
        }
    }
}
