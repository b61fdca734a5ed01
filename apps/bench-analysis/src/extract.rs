use crate::error::{ExtractError, ExtractResult};
use crate::model::{
    parse_date, AccuracyRun, DetectionRecord, MainMetadata, MetaValue, PerformanceRun,
    TimeSeriesSample, ELAPSED_TIME, POWER_WATT,
};
use calamine::{open_workbook_auto, Data, Reader, Sheets};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub const MAIN_SHEET: &str = "Main";
pub const DETECTIONS_SHEET: &str = "Detections";
pub const RESOURCE_USAGES_SHEET: &str = "Resource Usages";
pub const POWER_USAGES_SHEET: &str = "Power Usages";

const DETECTION_COLUMNS: &[&str] = &["time", "score", "is_correct"];
const RESOURCE_COLUMNS: &[&str] = &[ELAPSED_TIME];
const POWER_COLUMNS: &[&str] = &[ELAPSED_TIME, POWER_WATT];

type Workbook = Sheets<BufReader<File>>;

pub fn extract_accuracy(path: &Path) -> ExtractResult<AccuracyRun> {
    let mut workbook = open(path)?;
    let main = parse_main(path, sheet_rows(&mut workbook, path, MAIN_SHEET)?)?;
    let detections = parse_detections(path, sheet_rows(&mut workbook, path, DETECTIONS_SHEET)?)?;
    tracing::debug!(
        path = %path.display(),
        detections = detections.len(),
        "extracted accuracy workbook"
    );
    Ok(AccuracyRun {
        source: path.to_path_buf(),
        main,
        detections,
    })
}

pub fn extract_performance(path: &Path) -> ExtractResult<PerformanceRun> {
    let mut workbook = open(path)?;
    let main = parse_main(path, sheet_rows(&mut workbook, path, MAIN_SHEET)?)?;
    let resource_usage = parse_time_series(
        path,
        RESOURCE_USAGES_SHEET,
        RESOURCE_COLUMNS,
        sheet_rows(&mut workbook, path, RESOURCE_USAGES_SHEET)?,
    )?;
    let power_usage = parse_time_series(
        path,
        POWER_USAGES_SHEET,
        POWER_COLUMNS,
        sheet_rows(&mut workbook, path, POWER_USAGES_SHEET)?,
    )?;
    tracing::debug!(
        path = %path.display(),
        resource_samples = resource_usage.len(),
        power_samples = power_usage.len(),
        "extracted performance workbook"
    );
    Ok(PerformanceRun {
        source: path.to_path_buf(),
        main,
        resource_usage,
        power_usage,
    })
}

fn open(path: &Path) -> ExtractResult<Workbook> {
    if !path.is_file() {
        return Err(ExtractError::NotFound {
            path: path.to_path_buf(),
        });
    }
    open_workbook_auto(path).map_err(|source| ExtractError::Open {
        path: path.to_path_buf(),
        source,
    })
}

fn sheet_rows(workbook: &mut Workbook, path: &Path, name: &str) -> ExtractResult<Vec<Vec<Data>>> {
    if !workbook.sheet_names().iter().any(|sheet| sheet == name) {
        return Err(ExtractError::malformed(path, format!("missing sheet '{name}'")));
    }
    let range = workbook
        .worksheet_range(name)
        .map_err(|err| ExtractError::malformed(path, format!("unreadable sheet '{name}': {err}")))?;
    Ok(range.rows().map(|row| row.to_vec()).collect())
}

/// Parses the two-column key/value `Main` sheet into a flat mapping.
pub fn parse_main(path: &Path, rows: Vec<Vec<Data>>) -> ExtractResult<MainMetadata> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if width != 2 {
        return Err(ExtractError::malformed(
            path,
            format!("sheet '{MAIN_SHEET}' must have exactly two columns, found {width}"),
        ));
    }

    let mut main = MainMetadata::new();
    for row in rows {
        let key = match row.first().and_then(cell_text) {
            Some(key) if !key.is_empty() => key,
            _ => continue,
        };
        if let Some(value) = row.get(1).and_then(cell_meta_value) {
            main.insert(key, value);
        }
    }
    Ok(main)
}

pub fn parse_detections(path: &Path, rows: Vec<Vec<Data>>) -> ExtractResult<Vec<DetectionRecord>> {
    let (columns, body) = split_header(path, DETECTIONS_SHEET, DETECTION_COLUMNS, rows)?;
    let time_idx = columns["time"];
    let score_idx = columns["score"];
    let correct_idx = columns["is_correct"];

    let mut detections = Vec::with_capacity(body.len());
    for (offset, row) in body.iter().enumerate() {
        if row_is_blank(row) {
            continue;
        }
        let is_correct = match row.get(correct_idx) {
            None => false,
            Some(cell) => cell_bool(cell).ok_or_else(|| {
                ExtractError::malformed(
                    path,
                    format!(
                        "sheet '{DETECTIONS_SHEET}' row {}: is_correct is not boolean ({cell})",
                        offset + 2
                    ),
                )
            })?,
        };
        detections.push(DetectionRecord {
            time: row.get(time_idx).map(cell_f64).unwrap_or(f64::NAN),
            score: row.get(score_idx).map(cell_f64).unwrap_or(f64::NAN),
            is_correct,
        });
    }
    Ok(detections)
}

/// Parses a header-first sample table. Every column other than `elapsed_time` becomes
/// a numeric channel; row order is preserved.
pub fn parse_time_series(
    path: &Path,
    sheet: &str,
    required: &[&str],
    rows: Vec<Vec<Data>>,
) -> ExtractResult<Vec<TimeSeriesSample>> {
    let (columns, body) = split_header(path, sheet, required, rows)?;
    let elapsed_idx = columns[ELAPSED_TIME];
    let mut channels: Vec<(&String, usize)> = columns
        .iter()
        .filter(|(name, _)| name.as_str() != ELAPSED_TIME)
        .map(|(name, idx)| (name, *idx))
        .collect();
    channels.sort_by_key(|(_, idx)| *idx);

    let mut samples = Vec::with_capacity(body.len());
    for row in &body {
        if row_is_blank(row) {
            continue;
        }
        let elapsed_time = row.get(elapsed_idx).map(cell_f64).unwrap_or(f64::NAN);
        let mut sample = TimeSeriesSample::new(elapsed_time);
        for (name, idx) in &channels {
            let value = row.get(*idx).map(cell_f64).unwrap_or(f64::NAN);
            sample.channels.insert((*name).clone(), value);
        }
        samples.push(sample);
    }
    Ok(samples)
}

fn split_header(
    path: &Path,
    sheet: &str,
    required: &[&str],
    rows: Vec<Vec<Data>>,
) -> ExtractResult<(HashMap<String, usize>, Vec<Vec<Data>>)> {
    let mut rows = rows.into_iter();
    let header = rows.next().ok_or_else(|| {
        ExtractError::malformed(path, format!("sheet '{sheet}' has no header row"))
    })?;

    let mut columns = HashMap::new();
    for (idx, cell) in header.iter().enumerate() {
        if let Some(name) = cell_text(cell).filter(|name| !name.is_empty()) {
            columns.entry(name).or_insert(idx);
        }
    }
    for column in required {
        if !columns.contains_key(*column) {
            return Err(ExtractError::malformed(
                path,
                format!("sheet '{sheet}' is missing column '{column}'"),
            ));
        }
    }
    Ok((columns, rows.collect()))
}

fn row_is_blank(row: &[Data]) -> bool {
    row.iter().all(|cell| matches!(cell, Data::Empty))
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(text) => Some(text.trim().to_string()),
        other => Some(other.to_string().trim().to_string()),
    }
}

fn cell_meta_value(cell: &Data) -> Option<MetaValue> {
    match cell {
        Data::Empty => None,
        Data::Int(value) => Some(MetaValue::Number(*value as f64)),
        Data::Float(value) => Some(MetaValue::Number(*value)),
        Data::Bool(value) => Some(MetaValue::Number(if *value { 1.0 } else { 0.0 })),
        Data::DateTime(value) => Some(match value.as_datetime() {
            Some(date) => MetaValue::Date(date),
            None => MetaValue::Number(value.as_f64()),
        }),
        Data::DateTimeIso(raw) => Some(match parse_date(raw) {
            Some(date) => MetaValue::Date(date),
            None => MetaValue::Text(raw.clone()),
        }),
        Data::String(raw) if raw.trim().is_empty() => None,
        Data::String(raw) => Some(MetaValue::parse_text(raw)),
        other => Some(MetaValue::Text(other.to_string())),
    }
}

fn cell_f64(cell: &Data) -> f64 {
    match cell {
        Data::Int(value) => *value as f64,
        Data::Float(value) => *value,
        Data::Bool(value) => {
            if *value {
                1.0
            } else {
                0.0
            }
        }
        Data::DateTime(value) => value.as_f64(),
        Data::String(raw) => raw.trim().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

fn cell_bool(cell: &Data) -> Option<bool> {
    match cell {
        Data::Empty => Some(false),
        Data::Bool(value) => Some(*value),
        Data::Int(value) => Some(*value != 0),
        Data::Float(value) => Some(*value != 0.0),
        Data::String(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
