use crate::aggregate::{
    fps_vs_package_power, normalized_by_model, performance_by_model_and_cpu, PerformanceMetric,
};
use crate::config::{AnalysisConfig, LabelConfig};
use crate::model::PerformanceRun;
use crate::sink::{Cell, Table, TableSink};
use anyhow::Result;

pub fn run(config: &AnalysisConfig, sink: &mut dyn TableSink) -> Result<()> {
    let runs = super::load_performance_runs(config);
    report(&runs, &config.labels, sink)
}

pub fn report(
    runs: &[PerformanceRun],
    labels: &LabelConfig,
    sink: &mut dyn TableSink,
) -> Result<()> {
    sink.emit(&aggregate_table(runs, labels))?;
    for metric in PerformanceMetric::ALL {
        sink.emit(&normalized_table(runs, labels, metric))?;
    }
    sink.emit(&efficiency_table(runs, labels))?;
    Ok(())
}

fn aggregate_table(runs: &[PerformanceRun], labels: &LabelConfig) -> Table {
    let mut headers = vec![
        "model".to_string(),
        "model_label".to_string(),
        "cpu".to_string(),
        "cpu_label".to_string(),
        "runs".to_string(),
    ];
    for metric in PerformanceMetric::ALL {
        headers.push(metric.name().to_string());
        headers.push(format!("{}_std", metric.name()));
    }
    let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();
    let mut table = Table::new("performance_by_model_and_cpu", &header_refs);

    for aggregate in performance_by_model_and_cpu(runs) {
        let mut row: Vec<Cell> = vec![
            aggregate.model.as_str().into(),
            labels.model_label(&aggregate.model).into(),
            aggregate.cpu.as_str().into(),
            labels.cpu_label(&aggregate.cpu).into(),
            aggregate.runs.into(),
        ];
        for metric in PerformanceMetric::ALL {
            let (mean, std) = aggregate
                .metrics
                .get(&metric)
                .map(|stat| (stat.mean, stat.std))
                .unwrap_or((f64::NAN, f64::NAN));
            row.push(mean.into());
            row.push(std.into());
        }
        table.push(row);
    }
    table
}

fn normalized_table(
    runs: &[PerformanceRun],
    labels: &LabelConfig,
    metric: PerformanceMetric,
) -> Table {
    let mut table = Table::new(
        format!("{metric}_normalized_comparison"),
        &["model", "model_label", "normalized"],
    );
    for (model, value) in normalized_by_model(runs, metric) {
        table.push(vec![
            model.as_str().into(),
            labels.model_label(&model).into(),
            value.into(),
        ]);
    }
    table
}

fn efficiency_table(runs: &[PerformanceRun], labels: &LabelConfig) -> Table {
    let mut table = Table::new(
        "fps_vs_package_power",
        &[
            "model",
            "model_label",
            "avg_fps",
            "avg_detection_time",
            "avg_cpu_package_power",
        ],
    );
    for point in fps_vs_package_power(runs) {
        table.push(vec![
            point.model.as_str().into(),
            labels.model_label(&point.model).into(),
            point.avg_fps.into(),
            point.avg_detection_time.into(),
            point.avg_cpu_package_power.into(),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{write_performance_workbook, FixtureRun, MemorySink};

    const RYZEN: &str = "AMD Ryzen 5 5600 6-Core Processor";

    #[test]
    fn performance_report_emits_every_metric_table() {
        let temp = tempfile::tempdir().unwrap();
        let yolo = |fps: f64, power: f64| {
            FixtureRun::new("yolov8s", RYZEN)
                .with_figure("fps", fps)
                .with_figure("avg_cpu_package_power", power)
                .with_figure("cpu_package_power_std", 2.0)
        };
        write_performance_workbook(&temp.path().join("a_performance.xlsx"), &yolo(10.0, 30.0), 3, 3)
            .unwrap();
        write_performance_workbook(&temp.path().join("b_performance.xlsx"), &yolo(20.0, 40.0), 3, 3)
            .unwrap();
        let ssd = FixtureRun::new("ssd_mobilenet_v2_fpnlite_320x320", RYZEN)
            .with_figure("fps", 40.0)
            .with_figure("avg_cpu_package_power", 20.0);
        write_performance_workbook(&temp.path().join("c_performance.xlsx"), &ssd, 3, 3).unwrap();

        let config = AnalysisConfig {
            data_dir: temp.path().to_path_buf(),
            ..AnalysisConfig::default()
        };
        let mut sink = MemorySink::default();
        run(&config, &mut sink).unwrap();

        assert_eq!(sink.tables.len(), PerformanceMetric::ALL.len() + 2);

        let aggregates = sink.table("performance_by_model_and_cpu").unwrap();
        assert_eq!(aggregates.rows.len(), 2);
        let cpu_label = aggregates.column("cpu_label").unwrap();
        assert_eq!(aggregates.rows[0][cpu_label], Cell::Text("PC3".to_string()));
        let power = aggregates.column("avg_cpu_package_power").unwrap();
        let power_std = aggregates.column("avg_cpu_package_power_std").unwrap();
        let yolo_row = aggregates
            .rows
            .iter()
            .find(|row| row[0] == Cell::Text("yolov8s".to_string()))
            .unwrap();
        assert_eq!(yolo_row[power], Cell::Number(35.0));
        assert_eq!(yolo_row[power_std], Cell::Number(2.0));

        let normalized = sink.table("avg_cpu_package_power_normalized_comparison").unwrap();
        let yolo_norm = normalized
            .rows
            .iter()
            .find(|row| row[0] == Cell::Text("yolov8s".to_string()))
            .unwrap();
        assert_eq!(yolo_norm[2], Cell::Number(0.75));

        let efficiency = sink.table("fps_vs_package_power").unwrap();
        assert_eq!(efficiency.rows.len(), 2);
        assert!(sink.table("avg_detection_time_normalized_comparison").is_some());
    }
}
