//! Slicer markups fiducial CSV (`.fcsv`)
//!
//! ```text
//! # Markups fiducial file version = 4.11
//! # CoordinateSystem = LPS
//! # columns = id,x,y,z,ow,ox,oy,oz,vis,sel,lock,label,desc,associatedNodeID
//! vtkMRMLMarkupsFiducialNode_0,-1.2,3.4,5.6,0,0,0,1,1,1,0,F-1,,
//! ```
//!
//! Positions are returned in RAS. Files written here are always RAS.

use crate::{FiducialReader, FiducialWriter};
use markupmodel_core::{Error, Fiducial, Point3f, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

const DEFAULT_COLUMNS: [&str; 14] = [
    "id", "x", "y", "z", "ow", "ox", "oy", "oz", "vis", "sel", "lock", "label", "desc",
    "associatedNodeID",
];

/// Anatomical frame of the stored coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinateSystem {
    #[default]
    Ras,
    Lps,
}

impl CoordinateSystem {
    /// Parse the value of a `CoordinateSystem` header; `0`/`1` are legacy codes
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "RAS" | "0" => Some(CoordinateSystem::Ras),
            "LPS" | "1" => Some(CoordinateSystem::Lps),
            _ => None,
        }
    }

    fn to_ras(self, p: Point3f) -> Point3f {
        match self {
            CoordinateSystem::Ras => p,
            CoordinateSystem::Lps => Point3f::new(-p.x, -p.y, p.z),
        }
    }
}

#[derive(Debug)]
struct Header {
    system: CoordinateSystem,
    columns: Vec<String>,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            system: CoordinateSystem::Ras,
            columns: DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Header {
    /// Apply a `# key = value` comment line
    fn apply(&mut self, comment: &str) -> Result<()> {
        let Some((key, value)) = comment.trim_start_matches('#').split_once('=') else {
            return Ok(());
        };
        match key.trim() {
            "CoordinateSystem" => {
                self.system = CoordinateSystem::parse(value).ok_or_else(|| {
                    Error::InvalidData(format!("Unknown coordinate system '{}'", value.trim()))
                })?;
            }
            "columns" => {
                self.columns = value.split(',').map(|c| c.trim().to_string()).collect();
            }
            _ => {}
        }
        Ok(())
    }

    fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}

/// Split a record on commas outside double quotes; `""` inside quotes is a
/// literal quote
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

/// Quote a field when it holds a comma or a quote
fn quote_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn parse_flag(value: Option<&String>, default: bool) -> bool {
    match value.map(|v| v.trim()) {
        Some("0") => false,
        Some("1") => true,
        _ => default,
    }
}

/// Reader for `.fcsv` files
pub struct FcsvReader;

impl FcsvReader {
    /// Parse `.fcsv` text
    pub fn parse<R: BufRead>(reader: R) -> Result<Vec<Fiducial>> {
        let mut header = Header::default();
        let mut fiducials = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('#') {
                header.apply(trimmed)?;
                continue;
            }

            let fields = split_fields(trimmed);
            let coordinate = |name: &str| -> Result<f32> {
                let text = header
                    .index_of(name)
                    .and_then(|i| fields.get(i))
                    .ok_or_else(|| {
                        Error::InvalidData(format!("Line {}: missing '{}' column", index + 1, name))
                    })?;
                text.trim().parse::<f32>().map_err(|_| {
                    Error::InvalidData(format!("Line {}: invalid coordinate '{}'", index + 1, text))
                })
            };

            let stored = Point3f::new(coordinate("x")?, coordinate("y")?, coordinate("z")?);
            let label = header
                .index_of("label")
                .and_then(|i| fields.get(i))
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| format!("F-{}", fiducials.len() + 1));

            let mut fiducial = Fiducial::new(label, header.system.to_ras(stored));
            fiducial.visible = parse_flag(header.index_of("vis").and_then(|i| fields.get(i)), true);
            fiducial.selected = parse_flag(header.index_of("sel").and_then(|i| fields.get(i)), true);
            fiducials.push(fiducial);
        }

        Ok(fiducials)
    }
}

impl FiducialReader for FcsvReader {
    fn read_fiducials<P: AsRef<Path>>(path: P) -> Result<Vec<Fiducial>> {
        let file = File::open(path.as_ref())?;
        let fiducials = Self::parse(BufReader::new(file))?;
        log::debug!("Read {} fiducials from {}", fiducials.len(), path.as_ref().display());
        Ok(fiducials)
    }
}

/// Writer for `.fcsv` files
pub struct FcsvWriter;

impl FcsvWriter {
    pub fn write<W: Write>(fiducials: &[Fiducial], mut writer: W) -> Result<()> {
        writeln!(writer, "# Markups fiducial file version = 4.11")?;
        writeln!(writer, "# CoordinateSystem = RAS")?;
        writeln!(writer, "# columns = {}", DEFAULT_COLUMNS.join(","))?;

        for (i, f) in fiducials.iter().enumerate() {
            writeln!(
                writer,
                "vtkMRMLMarkupsFiducialNode_{},{},{},{},0,0,0,1,{},{},0,{},,",
                i,
                f.position.x,
                f.position.y,
                f.position.z,
                u8::from(f.visible),
                u8::from(f.selected),
                quote_field(&f.label)
            )?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl FiducialWriter for FcsvWriter {
    fn write_fiducials<P: AsRef<Path>>(fiducials: &[Fiducial], path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        Self::write(fiducials, BufWriter::new(file))
    }
}
