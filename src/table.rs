use std::fs;
use std::io::Write;

use camino::Utf8Path;
use serde::Serialize;

use crate::error::SyncError;
use crate::normalize::normalize_header;

/// Column labels plus rows of cells, every row as wide as the header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Renames every column in place. Labels that collapse to the same name stay separate columns.
    pub fn normalize_headers(&mut self) {
        for header in &mut self.headers {
            *header = normalize_header(header);
        }
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStrategy {
    Strict,
    SkipBadRows,
    SkipBadRowsLatin1,
}

#[derive(Debug, Clone)]
pub struct ParsedTable {
    pub table: Table,
    pub strategy: ParseStrategy,
    pub skipped_rows: usize,
}

/// Tries strict UTF-8, then UTF-8 skipping overlong rows, then Latin-1
/// skipping overlong rows. Rows shorter than the header are padded.
pub fn parse_table(content: &[u8]) -> Result<ParsedTable, SyncError> {
    if let Ok(parsed) = parse_utf8(content, ParseStrategy::Strict) {
        return Ok(parsed);
    }
    if let Ok(parsed) = parse_utf8(content, ParseStrategy::SkipBadRows) {
        return Ok(parsed);
    }
    let decoded = decode_latin1(content);
    parse_text(&decoded, ParseStrategy::SkipBadRowsLatin1)
}

fn parse_utf8(content: &[u8], strategy: ParseStrategy) -> Result<ParsedTable, SyncError> {
    let text = std::str::from_utf8(content)
        .map_err(|err| SyncError::Parse(format!("content is not valid UTF-8: {err}")))?;
    parse_text(text, strategy)
}

fn decode_latin1(content: &[u8]) -> String {
    content.iter().map(|&byte| byte as char).collect()
}

fn parse_text(text: &str, strategy: ParseStrategy) -> Result<ParsedTable, SyncError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|err| SyncError::Parse(err.to_string()))?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    if headers.is_empty() {
        return Err(SyncError::Parse("no header row".to_string()));
    }

    let width = headers.len();
    let mut rows = Vec::new();
    let mut skipped_rows = 0;
    for (index, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(_) if strategy != ParseStrategy::Strict => {
                skipped_rows += 1;
                continue;
            }
            Err(err) => return Err(SyncError::Parse(err.to_string())),
        };
        if record.len() > width {
            if strategy == ParseStrategy::Strict {
                return Err(SyncError::Parse(format!(
                    "row {} has {} fields, expected {width}",
                    index + 1,
                    record.len()
                )));
            }
            skipped_rows += 1;
            continue;
        }
        let mut row = record.iter().map(str::to_string).collect::<Vec<_>>();
        row.resize(width, String::new());
        rows.push(row);
    }

    Ok(ParsedTable {
        table: Table { headers, rows },
        strategy,
        skipped_rows,
    })
}

/// Writes header and rows as comma-separated text, replacing `path` atomically.
pub fn write_table(table: &Table, path: &Utf8Path) -> Result<(), SyncError> {
    let parent = path
        .parent()
        .ok_or_else(|| SyncError::Persist(format!("invalid output path: {path}")))?;
    fs::create_dir_all(parent.as_std_path()).map_err(|err| SyncError::Persist(err.to_string()))?;

    let mut temp = tempfile::Builder::new()
        .prefix(".dataset")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| SyncError::Persist(err.to_string()))?;
    {
        let mut writer = csv::Writer::from_writer(temp.as_file_mut());
        writer
            .write_record(&table.headers)
            .map_err(|err| SyncError::Persist(err.to_string()))?;
        for row in &table.rows {
            writer
                .write_record(row)
                .map_err(|err| SyncError::Persist(err.to_string()))?;
        }
        let file = writer
            .into_inner()
            .map_err(|err| SyncError::Persist(err.to_string()))?;
        file.flush()
            .map_err(|err| SyncError::Persist(err.to_string()))?;
    }
    temp.persist(path.as_std_path())
        .map_err(|err| SyncError::Persist(err.to_string()))?;
    Ok(())
}
