use super::*;

pub(crate) const SAMPLE_COLUMN: &str = "Sample";

pub(crate) type ColumnSeries = BTreeMap<String, Vec<f64>>;

#[derive(Debug, Error)]
pub(crate) enum TraceError {
    #[error("failed to read trace log {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed trace log row")]
    Csv(#[from] csv::Error),
    #[error("trace log has no header row")]
    MissingHeader,
    #[error("trace log is missing required column `{0}`")]
    MissingColumn(String),
    #[error("row {row}: Sample value `{value}` is not an integer")]
    InvalidSample { row: usize, value: String },
    #[error("row {row}: Sample value {value} overflows the reconciled counter")]
    SampleOverflow { row: usize, value: i64 },
    #[error("row {row}: negative RatesStat.variance {value}")]
    NegativeVariance { row: usize, value: f64 },
    #[error("trace log contains no samples")]
    Empty,
}

/// Every row holds exactly one value per column.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct TraceTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TraceTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn push_column(&mut self, name: &str, values: Vec<String>) {
        debug_assert_eq!(values.len(), self.rows.len());
        self.columns.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }

    pub fn value(&self, row: usize, column: Option<usize>) -> Option<&str> {
        column.and_then(|index| self.rows.get(row)?.get(index).map(String::as_str))
    }

    pub fn number(&self, row: usize, column: Option<usize>) -> Option<f64> {
        self.value(row, column).and_then(parse_number)
    }

    pub fn last_sample(&self) -> Result<i64, TraceError> {
        let index = self
            .column_index(SAMPLE_COLUMN)
            .ok_or_else(|| TraceError::MissingColumn(SAMPLE_COLUMN.to_string()))?;
        let row = self.rows.len().checked_sub(1).ok_or(TraceError::Empty)?;
        parse_sample(row, &self.rows[row][index])
    }

    /// Numeric series of every column. Values that do not parse are left
    /// out; columns without any numeric value are absent.
    pub fn numeric_series(&self) -> ColumnSeries {
        let mut series = ColumnSeries::new();
        for (index, column) in self.columns.iter().enumerate() {
            let values = self
                .rows
                .iter()
                .filter_map(|row| row.get(index).and_then(|value| parse_number(value)))
                .collect::<Vec<f64>>();
            if !values.is_empty() {
                series.entry(column.clone()).or_default().extend(values);
            }
        }
        series
    }
}

pub(crate) fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok()
}

pub(crate) fn parse_sample(row: usize, value: &str) -> Result<i64, TraceError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| TraceError::InvalidSample {
            row,
            value: value.to_string(),
        })
}

pub(crate) fn read_trace_table(path: &Path) -> Result<TraceTable, TraceError> {
    let raw = fs::read(path).map_err(|source| TraceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_trace_table(&String::from_utf8_lossy(&raw))
}

/// Parses trace log text, skipping `#` comment lines and lines with NUL bytes.
pub(crate) fn parse_trace_table(text: &str) -> Result<TraceTable, TraceError> {
    let body = text
        .lines()
        .filter(|line| !line.starts_with('#') && !line.contains('\0'))
        .collect::<Vec<&str>>()
        .join("\n");

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());

    let columns = reader
        .headers()?
        .iter()
        .map(ToOwned::to_owned)
        .collect::<Vec<String>>();
    if columns.is_empty() || columns.iter().all(|column| column.is_empty()) {
        return Err(TraceError::MissingHeader);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = record
            .iter()
            .take(columns.len())
            .map(ToOwned::to_owned)
            .collect::<Vec<String>>();
        row.resize(columns.len(), String::new());
        rows.push(row);
    }

    Ok(TraceTable { columns, rows })
}

/// Writes the table back in the same dialect: tabs, minimal quoting, `\n` endings.
pub(crate) fn write_trace_table(path: &Path, table: &TraceTable) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)
        .with_context(|| format!("failed to create reconciled log: {}", path.display()))?;

    writer
        .write_record(&table.columns)
        .with_context(|| format!("failed to write header: {}", path.display()))?;
    for row in &table.rows {
        writer
            .write_record(row)
            .with_context(|| format!("failed to write row: {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush reconciled log: {}", path.display()))?;

    Ok(())
}

pub(crate) fn reconciled_log_path(log_path: &Path) -> PathBuf {
    log_path.with_extension(RECONCILED_EXTENSION)
}
