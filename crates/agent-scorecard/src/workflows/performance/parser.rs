use std::io::Read;

/// An export as read from disk: raw header labels and string cells, one vector per row.
/// Short rows are padded so every row has one cell per header.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column(&self, index: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(index).map(String::as_str).unwrap_or(""))
    }
}

pub(crate) fn parse_table<R: Read>(reader: R) -> Result<RawTable, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();

    for record in csv_reader.records() {
        let record = record?;
        let mut row: Vec<String> = record
            .iter()
            .take(headers.len())
            .map(str::to_string)
            .collect();
        row.resize(headers.len(), String::new());
        rows.push(row);
    }

    Ok(RawTable { headers, rows })
}

pub(crate) fn empty_as_none(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Parses a numeric cell. Percentage columns have their trailing `%` markers removed
/// first; anything that still fails to parse degrades to `None`.
pub(crate) fn parse_number(value: &str, percentage: bool) -> Option<f64> {
    let trimmed = value.trim();
    let trimmed = if percentage {
        trimmed.trim_end_matches('%').trim_end()
    } else {
        trimmed
    };
    if trimmed.is_empty() {
        return None;
    }

    trimmed
        .parse::<f64>()
        .ok()
        .or_else(|| trimmed.replace(',', "").parse::<f64>().ok())
        .filter(|number| !number.is_nan())
}

/// Parses a whole number that may have been written as a float (`2024.0`).
pub(crate) fn parse_whole(value: &str) -> Option<i64> {
    let number = parse_number(value, false)?;
    if number.is_finite() && number.fract() == 0.0 {
        Some(number as i64)
    } else {
        None
    }
}
