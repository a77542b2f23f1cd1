//! Plain XYZ/CSV fiducial lists
//!
//! One point per line with optional header. Supports:
//! - Auto-detection of delimiters (comma, space, tab, semicolon)
//! - Header detection with x, y, z columns in any order
//! - An optional label column; unlabelled points are named `F-<n>`

use crate::FiducialReader;
use markupmodel_core::{Error, Fiducial, Point3f, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Supported delimiters for CSV/XYZ files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Space,
    Tab,
    Semicolon,
}

impl Delimiter {
    pub fn as_char(&self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Space => ' ',
            Delimiter::Tab => '\t',
            Delimiter::Semicolon => ';',
        }
    }

    /// Pick the most frequent delimiter in `line`
    pub fn detect_from_line(line: &str) -> Option<Self> {
        let counts = [
            (line.matches(',').count(), Delimiter::Comma),
            (line.trim().matches(' ').count(), Delimiter::Space),
            (line.matches('\t').count(), Delimiter::Tab),
            (line.matches(';').count(), Delimiter::Semicolon),
        ];

        counts
            .iter()
            .max_by_key(|(count, _)| *count)
            .filter(|(count, _)| *count > 0)
            .map(|(_, delimiter)| *delimiter)
    }

    fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self {
            // Runs of spaces count as one separator
            Delimiter::Space => line.split_whitespace().collect(),
            _ => line.split(self.as_char()).map(str::trim).collect(),
        }
    }
}

/// Column types recognised in a header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    X,
    Y,
    Z,
    Label,
    Unknown,
}

impl ColumnType {
    pub fn from_header(header: &str) -> Self {
        match header.trim().to_lowercase().as_str() {
            "x" | "px" | "pos_x" | "position_x" | "r" => ColumnType::X,
            "y" | "py" | "pos_y" | "position_y" | "a" => ColumnType::Y,
            "z" | "pz" | "pos_z" | "position_z" | "s" => ColumnType::Z,
            "label" | "name" => ColumnType::Label,
            _ => ColumnType::Unknown,
        }
    }
}

/// Layout of an XYZ/CSV file
#[derive(Debug, Clone, PartialEq)]
pub struct XyzCsvSchema {
    pub columns: Vec<ColumnType>,
    pub has_header: bool,
    pub delimiter: Delimiter,
}

impl XyzCsvSchema {
    pub fn new(columns: Vec<ColumnType>, has_header: bool, delimiter: Delimiter) -> Self {
        Self {
            columns,
            has_header,
            delimiter,
        }
    }

    /// Detect the schema from the first content line of a file
    pub fn detect_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        for line in reader.lines() {
            let line = line?;
            if is_blank_or_comment(&line) {
                continue;
            }
            return Self::detect_from_line(&line);
        }
        Err(Error::InvalidData("File contains no points".to_string()))
    }

    /// Detect the schema from a single line
    pub fn detect_from_line(line: &str) -> Result<Self> {
        let delimiter = Delimiter::detect_from_line(line)
            .ok_or_else(|| Error::InvalidData("Could not detect delimiter".to_string()))?;

        if Self::is_header_line(line, delimiter) {
            let columns: Vec<ColumnType> = delimiter
                .split(line)
                .into_iter()
                .map(ColumnType::from_header)
                .collect();
            for required in [ColumnType::X, ColumnType::Y, ColumnType::Z] {
                if !columns.contains(&required) {
                    return Err(Error::InvalidData(
                        "XYZ/CSV header must name x, y and z columns".to_string(),
                    ));
                }
            }
            Ok(Self::new(columns, true, delimiter))
        } else {
            Ok(Self::new(
                vec![ColumnType::X, ColumnType::Y, ColumnType::Z],
                false,
                delimiter,
            ))
        }
    }

    fn is_header_line(line: &str, delimiter: Delimiter) -> bool {
        delimiter
            .split(line)
            .iter()
            .take(3)
            .any(|part| part.parse::<f32>().is_err())
    }

    fn index_of(&self, column: ColumnType) -> Option<usize> {
        self.columns.iter().position(|c| *c == column)
    }

    /// Parse one data line into a position and optional label
    fn parse_line(&self, line: &str, line_number: usize) -> Result<(Point3f, Option<String>)> {
        let parts = self.delimiter.split(line);
        let coordinate = |column: ColumnType| -> Result<f32> {
            let index = self.index_of(column).ok_or_else(|| {
                Error::InvalidData(format!("Missing {:?} column", column))
            })?;
            let text = parts.get(index).ok_or_else(|| {
                Error::InvalidData(format!("Line {}: expected at least {} fields", line_number, index + 1))
            })?;
            text.parse::<f32>().map_err(|_| {
                Error::InvalidData(format!("Line {}: invalid coordinate '{}'", line_number, text))
            })
        };

        let position = Point3f::new(
            coordinate(ColumnType::X)?,
            coordinate(ColumnType::Y)?,
            coordinate(ColumnType::Z)?,
        );
        let label = self
            .index_of(ColumnType::Label)
            .and_then(|index| parts.get(index))
            .filter(|text| !text.is_empty())
            .map(|text| text.to_string());

        Ok((position, label))
    }
}

fn is_blank_or_comment(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//")
}

/// Reader for XYZ/CSV fiducial lists
pub struct XyzCsvReader;

impl XyzCsvReader {
    /// Read with an explicit schema
    pub fn read_with_schema<P: AsRef<Path>>(path: P, schema: &XyzCsvSchema) -> Result<Vec<Fiducial>> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let mut fiducials = Vec::new();
        let mut header_skipped = !schema.has_header;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if is_blank_or_comment(&line) {
                continue;
            }
            if !header_skipped {
                header_skipped = true;
                continue;
            }
            let (position, label) = schema.parse_line(&line, index + 1)?;
            let label = label.unwrap_or_else(|| format!("F-{}", fiducials.len() + 1));
            fiducials.push(Fiducial::new(label, position));
        }

        log::debug!("Read {} fiducials from {}", fiducials.len(), path.as_ref().display());
        Ok(fiducials)
    }
}

impl FiducialReader for XyzCsvReader {
    fn read_fiducials<P: AsRef<Path>>(path: P) -> Result<Vec<Fiducial>> {
        let schema = XyzCsvSchema::detect_from_file(path.as_ref())?;
        Self::read_with_schema(path, &schema)
    }
}
