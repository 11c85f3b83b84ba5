/*!

This is the long-form manual for `monthly_grid` and the `leer` command line tool.

## The data file

All the values are kept in a single CSV file (by default `data.csv` in the current
directory), one row per value:

| Period | Metric         | Region  | Value |
|--------|----------------|---------|-------|
| 202401 | Contract Miles | East    | 10    |
| 202401 | Drivers        | East    | 10    |
| ...    | ...            | ...     | ...   |

The period is the year followed by the month number on two digits: `202401` is
January 2024. If the file does not exist yet, it is treated as an empty table and
created on the first submission.

Every submission rewrites the whole file. All the rows of the submitted period are
removed and replaced by one row for each metric and region. Submitting the same
period again replaces it again.

## Entering data

### `leer edit`

Interactive mode. The tool asks for the year and the month, shows the current grid
for that period and then asks for every cell in turn, proposing the current value.
Leaving a cell blank leaves it empty. Once all the cells are entered, the grid is
checked and, after confirmation, written to the data file.

A grid with empty or non-numeric cells is never written: the problem is reported
and the editing starts again with the values entered so far.

### `leer submit`

Reads a grid from a file. The input is expected to be formatted as follows:

| Metric         | East | Midwest | West | TMX |
|----------------|------|---------|------|-----|
| Contract Miles | 10   | 10      | 10   | 10  |
| Drivers        | 10   | 10      | 10   | 10  |
| ...            |      |         |      |     |

The first row holds the region names, the first column the metric names. The
order of the rows and of the columns does not matter, but every name must be known.
Columns with an empty header are ignored.

Two input types are supported:
* `csv` (the default) Comma Separated Values
* `xlsx` an Excel workbook. The first worksheet is read unless
  `--excel-worksheet-name` is given.

### `leer view` and `leer show`

`view` prints the grid of one period. `show` prints the whole table, or only the
rows of one period.

## Configuration

An optional JSON file passed with `--config`:

```json
{
  "dataPath": "data.csv",
  "metrics": ["Contract Miles", "Drivers", "Tractors", "Trips", "Units", "WPL Miles"],
  "regions": ["East", "Midwest", "West", "TMX"],
  "firstYear": 2020,
  "lastYear": 2025
}
```

All the fields are optional and take the values above by default. A relative
`dataPath` is read from the directory of the configuration file. The `--data`
option takes precedence over `dataPath`.

Changing the lists of metrics or regions does not rewrite the existing data: rows
with other names stay in the file, are not shown in the grids, and are removed when
their period is submitted again.

## Sharing the data file

The tool assumes that one person edits the file at a time. Two sessions submitting
at the same time will not corrupt the file, but the last one to write wins.

*/
