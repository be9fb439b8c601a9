/*!

This is the long-form manual for `case_aggregates` and `casecharts`.

## Input

The input is an Excel workbook (`.xlsx`). The first worksheet is read, unless a
worksheet name is given. The first row holds the column names; every other
non-empty row is a case. Three columns are used:

| column                      | content                                     |
|-----------------------------|---------------------------------------------|
| `EDI Primary Case Issues`   | the issue of the case (optional)            |
| `Original Publication Date` | the publication date (mandatory)            |
| `Disciplines`               | the disciplines, separated by `;` (optional)|

The names of the columns and the separator can be changed in the configuration
file (see below).

### Publication dates

The following encodings are accepted, the first one that matches is used:
1. a spreadsheet serial number between 1 and 2,958,465 (date cells are stored this way).
   The time of day is ignored;
2. `YYYY-MM-DD`;
3. `DD/MM/YYYY`;
4. a few other common notations: `YYYY/MM/DD`, `MM/DD/YYYY`, `June 1, 2023`,
   `1 June 2023`, ISO and RFC 2822 timestamps. Two-digit years are read as
   1969-2068: `1/15/23` is 2023-01-15.

A row whose date is missing or cannot be read is left out of all the outputs. A
warning with the row number is printed for each of them.

Missing issues are reported as `Undefined`. A missing discipline field is an
empty list of disciplines.

## Outputs

All the files are written in the output directory:

* `data.json` the normalized cases:
  `[{"EDI Primary Case Issues": "Bias", "Original Publication Date": "2023-01-15", "Disciplines": ["Medicine", "Law"]}]`
* `aggregatedData.json` the number of cases for each year, in order of first
  appearance: `[{"year": 2023, "count": 2}]`
* `barChartData.json` the number of cases per year, discipline and issue, sorted by
  year. A case with several disciplines is counted once for each of them:
  `[{"year": 2023, "discipline": "Medicine", "issue": "Bias", "count": 2}]`
* `sankeyData.json` the flows from the root node `All Cases` to each issue.
  The value of a link is the total number of cases of this issue up to and
  including the year of the link:
  `{"nodes": [{"name": "All Cases"}, {"name": "Bias"}], "links": [{"source": 0, "target": 1, "value": 2, "year": 2023}]}`

The links of `sankeyData.json` are grouped by issue. To play the graph year by
year, select the links of each year (see `SankeyGraph::links_for_year`).

All the files of a run are written to temporary files before any of them
replaces its previous version: after a failed write, the previous files are
still complete and consistent with each other.

## Stages

`casecharts --stage <stage>` runs a single step:
* `convert` reads the workbook and writes `data.json`
* `years`, `bar-chart`, `sankey` read `data.json` and write one aggregate
* `all` (default) runs everything
* `check` validates the `sankeyData.json` and `barChartData.json` files
  already present in the output directory

With `--reference <directory>`, the outputs are compared with the files of the
same name in the reference directory, and the differences are printed.

## Configuration

All the settings have defaults. A JSON configuration file may be passed with
`--config`:

```json
{
  "inputPath": "EDI Master 2023-11.xlsx",
  "outputDirectory": "out",
  "excelWorksheetName": "Sheet1",
  "columns": {
    "issue": "EDI Primary Case Issues",
    "publicationDate": "Original Publication Date",
    "disciplines": "Disciplines"
  },
  "disciplineDelimiter": ";"
}
```

Relative paths are relative to the configuration file. The command line
options take precedence over the configuration file.

 */
