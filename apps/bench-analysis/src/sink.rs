//! Tabular hand-off to whatever renders charts. Each table is named after the metric
//! being charted; directory sinks write one file per table.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Count(usize),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(text) => f.write_str(text),
            Cell::Number(value) => write!(f, "{value}"),
            Cell::Count(value) => write!(f, "{value}"),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Text(text) => serializer.serialize_str(text),
            Cell::Number(value) if value.is_finite() => serializer.serialize_f64(*value),
            Cell::Number(_) => serializer.serialize_none(),
            Cell::Count(value) => serializer.serialize_u64(*value as u64),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Cell::Count(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            name: name.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.headers.len(), "row width mismatch in {}", self.name);
        self.rows.push(row);
    }

    pub fn column(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub trait TableSink {
    fn emit(&mut self, table: &Table) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

/// Without an output directory, tables are printed; otherwise one file per table.
pub fn build_sink(output_dir: Option<&Path>, format: OutputFormat) -> Result<Box<dyn TableSink>> {
    let Some(dir) = output_dir else {
        return Ok(Box::new(StdoutSink::new(io::stdout())));
    };
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    Ok(match format {
        OutputFormat::Csv => Box::new(CsvDirSink::new(dir)),
        OutputFormat::Json => Box::new(JsonDirSink::new(dir)),
    })
}

/// Column-aligned text.
pub struct StdoutSink<W: Write> {
    out: W,
}

impl<W: Write> StdoutSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TableSink for StdoutSink<W> {
    fn emit(&mut self, table: &Table) -> Result<()> {
        let rendered: Vec<Vec<String>> = table
            .rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();
        let mut widths: Vec<usize> = table.headers.iter().map(String::len).collect();
        for row in &rendered {
            for (idx, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(idx) {
                    *width = (*width).max(cell.len());
                }
            }
        }

        writeln!(self.out, "== {} ==", table.name)?;
        let header: Vec<String> = table
            .headers
            .iter()
            .zip(&widths)
            .map(|(h, w)| format!("{h:<width$}", width = *w))
            .collect();
        writeln!(self.out, "{}", header.join("  ").trim_end())?;
        for row in &rendered {
            let line: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, w)| format!("{cell:<width$}", width = *w))
                .collect();
            writeln!(self.out, "{}", line.join("  ").trim_end())?;
        }
        writeln!(self.out)?;
        Ok(())
    }
}

pub struct CsvDirSink {
    dir: PathBuf,
}

impl CsvDirSink {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }
}

impl TableSink for CsvDirSink {
    fn emit(&mut self, table: &Table) -> Result<()> {
        let path = self.dir.join(format!("{}.csv", table.name));
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        writer.write_record(&table.headers)?;
        for row in &table.rows {
            writer.write_record(row.iter().map(|cell| cell.to_string()))?;
        }
        writer
            .flush()
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), rows = table.rows.len(), "wrote table");
        Ok(())
    }
}

pub struct JsonDirSink {
    dir: PathBuf,
}

impl JsonDirSink {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }
}

impl TableSink for JsonDirSink {
    fn emit(&mut self, table: &Table) -> Result<()> {
        let path = self.dir.join(format!("{}.json", table.name));
        let records: Vec<serde_json::Map<String, serde_json::Value>> = table
            .rows
            .iter()
            .map(|row| {
                table
                    .headers
                    .iter()
                    .cloned()
                    .zip(row.iter().map(|cell| serde_json::to_value(cell).unwrap_or_default()))
                    .collect()
            })
            .collect();
        let payload = serde_json::to_string_pretty(&records)?;
        fs::write(&path, payload).with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), rows = table.rows.len(), "wrote table");
        Ok(())
    }
}
