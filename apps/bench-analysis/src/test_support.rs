use crate::extract::{DETECTIONS_SHEET, MAIN_SHEET, POWER_USAGES_SHEET, RESOURCE_USAGES_SHEET};
use crate::model::{
    CPU_PACKAGE_POWER, CPU_PACKAGE_TEMP, CPU_USAGE, ELAPSED_TIME, MEMORY_MB, POWER_WATT,
};
use crate::sink::{Table, TableSink};
use anyhow::Result;
use rust_xlsxwriter::{Workbook, Worksheet};
use std::path::Path;

/// Main-sheet contents for a fixture workbook.
#[derive(Debug, Clone)]
pub struct FixtureRun {
    pub model: String,
    pub cpu: String,
    pub figures: Vec<(String, f64)>,
}

impl FixtureRun {
    pub fn new(model: &str, cpu: &str) -> Self {
        Self {
            model: model.to_string(),
            cpu: cpu.to_string(),
            figures: Vec::new(),
        }
    }

    pub fn with_figure(mut self, key: &str, value: f64) -> Self {
        self.figures.push((key.to_string(), value));
        self
    }
}

fn write_main(sheet: &mut Worksheet, run: &FixtureRun) -> Result<()> {
    sheet.set_name(MAIN_SHEET)?;
    sheet.write_string(0, 0, "model")?;
    sheet.write_string(0, 1, run.model.as_str())?;
    sheet.write_string(1, 0, "cpu")?;
    sheet.write_string(1, 1, run.cpu.as_str())?;
    sheet.write_string(2, 0, "date")?;
    sheet.write_string(2, 1, "2024-05-01 12:00:00")?;
    for (offset, (key, value)) in run.figures.iter().enumerate() {
        let row = 3 + offset as u32;
        sheet.write_string(row, 0, key.as_str())?;
        sheet.write_number(row, 1, *value)?;
    }
    Ok(())
}

fn write_header(sheet: &mut Worksheet, columns: &[&str]) -> Result<()> {
    for (col, name) in columns.iter().enumerate() {
        sheet.write_string(0, col as u16, *name)?;
    }
    Ok(())
}

/// Writes `Main` plus `Detections` rows of `(time, score, is_correct)`.
pub fn write_accuracy_workbook(
    path: &Path,
    run: &FixtureRun,
    detections: &[(f64, f64, bool)],
) -> Result<()> {
    let mut workbook = Workbook::new();
    write_main(workbook.add_worksheet(), run)?;

    let sheet = workbook.add_worksheet();
    sheet.set_name(DETECTIONS_SHEET)?;
    write_header(sheet, &["time", "score", "is_correct"])?;
    for (idx, (time, score, correct)) in detections.iter().enumerate() {
        let row = idx as u32 + 1;
        sheet.write_number(row, 0, *time)?;
        sheet.write_number(row, 1, *score)?;
        sheet.write_boolean(row, 2, *correct)?;
    }

    workbook.save(path)?;
    Ok(())
}

/// Writes `Main`, a linear `Resource Usages` ramp and a `Power Usages` series sampled
/// every 100 ms.
pub fn write_performance_workbook(
    path: &Path,
    run: &FixtureRun,
    resource_samples: usize,
    power_samples: usize,
) -> Result<()> {
    let mut workbook = Workbook::new();
    write_main(workbook.add_worksheet(), run)?;

    let sheet = workbook.add_worksheet();
    sheet.set_name(RESOURCE_USAGES_SHEET)?;
    write_header(
        sheet,
        &[ELAPSED_TIME, CPU_USAGE, MEMORY_MB, CPU_PACKAGE_POWER, CPU_PACKAGE_TEMP],
    )?;
    for idx in 0..resource_samples {
        let row = idx as u32 + 1;
        let t = idx as f64;
        sheet.write_number(row, 0, t)?;
        sheet.write_number(row, 1, 10.0 + t)?;
        sheet.write_number(row, 2, 500.0 + 2.0 * t)?;
        sheet.write_number(row, 3, 15.0 + 0.5 * t)?;
        sheet.write_number(row, 4, 45.0)?;
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name(POWER_USAGES_SHEET)?;
    write_header(sheet, &[ELAPSED_TIME, POWER_WATT])?;
    for idx in 0..power_samples {
        let row = idx as u32 + 1;
        sheet.write_number(row, 0, idx as f64 * 100.0)?;
        sheet.write_number(row, 1, 20.0 + idx as f64)?;
    }

    workbook.save(path)?;
    Ok(())
}

/// Collects emitted tables in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub tables: Vec<Table>,
}

impl MemorySink {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|table| table.name == name)
    }
}

impl TableSink for MemorySink {
    fn emit(&mut self, table: &Table) -> Result<()> {
        self.tables.push(table.clone());
        Ok(())
    }
}
