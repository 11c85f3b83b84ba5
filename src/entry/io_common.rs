use monthly_grid::{Grid, Record};

/// Integral values are written without a decimal part (10, not 10.0).
pub fn format_value(x: f64) -> String {
    format!("{}", x)
}

// Pads every column to its widest cell. The first column is left-aligned,
// the others right-aligned.
fn render_rows(rows: &[Vec<String>]) -> String {
    let num_cols = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let mut widths: Vec<usize> = vec![0; num_cols];
    for row in rows {
        for (i, s) in row.iter().enumerate() {
            widths[i] = widths[i].max(s.chars().count());
        }
    }
    let mut out = String::new();
    for row in rows {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, s)| {
                if i == 0 {
                    format!("{:<w$}", s, w = widths[i])
                } else {
                    format!("{:>w$}", s, w = widths[i])
                }
            })
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}

/// The grid as a text table, with the metrics as rows and the regions as columns.
/// Empty cells are blank.
pub fn render_grid(grid: &Grid) -> String {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut header = vec!["Metric".to_string()];
    header.extend(grid.layout().regions().iter().cloned());
    rows.push(header);
    for (metric, cells) in grid.rows() {
        let mut row = vec![metric.clone()];
        row.extend(cells.iter().map(|c| c.to_string()));
        rows.push(row);
    }
    render_rows(&rows)
}

pub fn render_table(records: &[Record]) -> String {
    let mut rows: Vec<Vec<String>> = vec![vec![
        "Period".to_string(),
        "Metric".to_string(),
        "Region".to_string(),
        "Value".to_string(),
    ]];
    for r in records {
        rows.push(vec![
            r.period.to_string(),
            r.metric.clone(),
            r.region.clone(),
            format_value(r.value),
        ]);
    }
    render_rows(&rows)
}
