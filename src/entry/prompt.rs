// Terminal prompts for the interactive mode.

use dialoguer::{Confirm, Input, Select};

use crate::entry::*;

/// Asks for the year and the month. The latest year and January are preselected.
pub fn select_period(settings: &Settings) -> EntryResult<Period> {
    let years: Vec<String> = settings.years.iter().map(|y| y.to_string()).collect();
    let year_idx = Select::new()
        .with_prompt("Select Year")
        .items(&years)
        .default(years.len().saturating_sub(1))
        .interact()
        .context(PromptSnafu {})?;
    let months: Vec<&str> = Month::ALL.iter().map(|m| m.name()).collect();
    let month_idx = Select::new()
        .with_prompt("Select Month")
        .items(&months)
        .default(0)
        .interact()
        .context(PromptSnafu {})?;
    settings.period(settings.years[year_idx], Month::ALL[month_idx])
}

/// Asks for every cell of the grid, row by row, starting from the current values.
pub fn edit_grid(grid: &Grid) -> EntryResult<Grid> {
    let mut res = grid.clone();
    let layout = grid.layout().clone();
    for (m, metric) in layout.metrics().iter().enumerate() {
        for (r, region) in layout.regions().iter().enumerate() {
            let current = grid.get(m, r).map(|c| c.to_string()).unwrap_or_default();
            let s: String = Input::new()
                .with_prompt(format!("{} / {}", metric, region))
                .with_initial_text(current)
                .allow_empty(true)
                .interact_text()
                .context(PromptSnafu {})?;
            res.set(m, r, Cell::parse(&s)).context(GridSnafu {})?;
        }
    }
    Ok(res)
}

pub fn confirm_submit(period: &Period) -> EntryResult<bool> {
    Confirm::new()
        .with_prompt(format!("Submit the data for {}?", period))
        .default(true)
        .interact()
        .context(PromptSnafu {})
}
