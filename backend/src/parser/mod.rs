//! CSV reader with encoding and delimiter auto-detection.
//!
//! Turns raw CSV bytes into a [`Table`]. Every cell is read as text and empty
//! cells become missing values; no column types are inferred here.

use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::table::{Cell, Field, Table};

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed table
    pub table: Table,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
}

impl ParseResult {
    /// Column headers, in file order.
    pub fn headers(&self) -> &[String] {
        self.table.columns()
    }
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => match String::from_utf8(bytes.to_vec()) {
            Ok(s) => s,
            Err(_) => String::from_utf8_lossy(bytes).to_string(),
        },
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.to_string()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        other => {
            let enc = encoding_rs::Encoding::for_label(other.as_bytes()).ok_or_else(|| {
                CsvError::EncodingError(format!("unknown encoding '{}'", other))
            })?;
            enc.decode(bytes).0.to_string()
        }
    };

    Ok(decoded.trim_start_matches('\u{feff}').to_string())
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV text with an explicit delimiter.
///
/// Quoted cells may span lines (store and user addresses do). Short rows are
/// padded with missing values, extra trailing cells are ignored.
///
/// # Example
/// ```ignore
/// use centralise::parser::parse_csv_str;
///
/// let table = parse_csv_str("name,age\nAlice,30\nBob,", ',').unwrap();
///
/// assert_eq!(table.len(), 2);
/// assert!(table.cell(1, "age").is_none());
/// ```
pub fn parse_csv_str(content: &str, delimiter: char) -> CsvResult<Table> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }
    let delimiter = u8::try_from(delimiter).map_err(|_| CsvError::ParseError {
        line: 0,
        message: format!("delimiter '{}' is not a single byte", delimiter),
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.iter().all(String::is_empty) {
        return Err(CsvError::NoHeaders);
    }

    let width = headers.len();
    let mut table = Table::new(headers);

    for record in reader.records() {
        let record = record?;
        if record.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        let row: Vec<Field> = (0..width)
            .map(|i| match record.get(i) {
                Some(v) if !v.is_empty() => Some(Cell::text(v)),
                _ => None,
            })
            .collect();
        table
            .push_row(row)
            .map_err(|e| CsvError::ParseError {
                line: record.position().map(|p| p.line()).unwrap_or(0),
                message: e.to_string(),
            })?;
    }

    Ok(table)
}

/// Parse CSV file with auto-detection of encoding and delimiter.
pub fn parse_csv_file_auto<P: AsRef<Path>>(path: P) -> CsvResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParseResult> {
    if bytes.is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);
    let table = parse_csv_str(&content, delimiter)?;

    Ok(ParseResult {
        table,
        encoding,
        delimiter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_csv() {
        let table = parse_csv_str("name,age\nAlice,30\nBob,25", ',').unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, "name"), Some(&Cell::text("Alice")));
        assert_eq!(table.cell(1, "age"), Some(&Cell::text("25")));
    }

    #[test]
    fn test_quoted_multiline_address() {
        let csv = "index,address\n0,\"Flat 6\nLondon\"\n1,Berlin";
        let table = parse_csv_str(csv, ',').unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, "address"), Some(&Cell::text("Flat 6\nLondon")));
    }

    #[test]
    fn test_empty_cells_are_missing() {
        let table = parse_csv_str("a;b;c\n1;;3", ';').unwrap();

        assert_eq!(table.cell(0, "a"), Some(&Cell::text("1")));
        assert!(table.cell(0, "b").is_none());
    }

    #[test]
    fn test_short_rows_padded() {
        let table = parse_csv_str("a,b,c\n1,2", ',').unwrap();
        assert!(table.cell(0, "c").is_none());
    }

    #[test]
    fn test_blank_lines_skipped() {
        let table = parse_csv_str("a,b\n1,2\n\n3,4\n", ',').unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_empty_csv_error() {
        assert!(matches!(parse_csv_str("", ','), Err(CsvError::EmptyFile)));
        assert!(matches!(parse_bytes_auto(b""), Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_auto_parse() {
        let result = parse_bytes_auto("name;age\nAlice;30\nBob;25".as_bytes()).unwrap();

        assert_eq!(result.delimiter, ';');
        assert_eq!(result.table.len(), 2);
        assert_eq!(result.headers(), &["name", "age"]);
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert!(decoded.contains("Soci"));
    }
}
