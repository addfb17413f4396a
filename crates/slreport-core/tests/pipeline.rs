use std::sync::Arc;

use anyhow::Result;
use chrono::{TimeZone, Utc};
use polars::prelude::*;
use rust_xlsxwriter::Workbook;
use slreport_bucket::{MemoryBucketStore, ObjectLocator};
use slreport_core::{
    ArchiveTarget, ArtifactReference, MemoryWarehouse, PipelineConfig, PipelineError,
    ReportPipeline, RunContext, RunOutcome, RunStage, StorageEvent,
};
use slreport_parser::{Entity, ExtractionError, Site};
use tempfile::TempDir;

const REPORT_NAME: &str = "Bunbury Service Level Report 01-04-2023.xlsx";

enum Cell {
    Text(&'static str),
    Number(f64),
}

use Cell::{Number, Text};

fn write_sheet(
    book: &mut Workbook,
    name: &str,
    width: u16,
    rows: &[Vec<(u16, Cell)>],
) -> Result<()> {
    let sheet = book.add_worksheet();
    sheet.set_name(name)?;
    for col in 0..width {
        sheet.write_string(0, col, format!("Header {col}"))?;
    }
    for (offset, cells) in rows.iter().enumerate() {
        let row = offset as u32 + 1;
        for (col, cell) in cells.iter() {
            match cell {
                Text(value) => sheet.write_string(row, *col, *value)?,
                Number(value) => sheet.write_number(row, *col, *value)?,
            };
        }
    }
    Ok(())
}

/// Five-sheet report. The service level sheet ends in a totals row with no ITEM.
fn report_workbook(skip_sheet: Option<&str>) -> Result<Vec<u8>> {
    let mut book = Workbook::new();
    let sheets: Vec<(&str, u16, Vec<Vec<(u16, Cell)>>)> = vec![
        (
            "Master Data",
            7,
            vec![
                vec![(3, Text("W1001")), (4, Text("Chicken Fillet")), (5, Text("Local")), (6, Text("N"))],
                vec![(3, Text("W1002")), (4, Text("Chicken Thigh"))],
            ],
        ),
        (
            "Service Level Data",
            23,
            vec![
                vec![
                    (0, Text("Chilled")),
                    (10, Text("10")),
                    (19, Text("2023-04-01")),
                    (20, Number(10.0)),
                    (21, Number(9.0)),
                    (22, Number(4.5)),
                ],
                vec![(10, Text("20")), (20, Number(5.0)), (21, Number(5.0))],
                vec![(0, Text("Total")), (21, Number(14.0))],
            ],
        ),
        (
            "Service Group",
            6,
            vec![
                vec![(0, Text("Poultry")), (1, Text("W1001"))],
                vec![(0, Text("Poultry")), (1, Text("W1002"))],
            ],
        ),
        (
            "Forecast Data",
            22,
            vec![
                vec![(3, Text("M100")), (7, Text("2023-04-03")), (8, Number(120.0))],
                vec![(3, Text("M200")), (8, Number(80.0))],
            ],
        ),
        (
            "Customer Master",
            17,
            vec![vec![(0, Text("4021")), (1, Text("Store 4021")), (16, Number(2.0))]],
        ),
    ];

    for (name, width, rows) in sheets {
        if skip_sheet == Some(name) {
            continue;
        }
        write_sheet(&mut book, name, width, &rows)?;
    }
    Ok(book.save_to_buffer()?)
}

struct Harness {
    store: Arc<MemoryBucketStore>,
    warehouse: Arc<MemoryWarehouse>,
    pipeline: ReportPipeline,
    work_dir: TempDir,
}

fn harness(warehouse: MemoryWarehouse) -> Result<Harness> {
    let work_dir = tempfile::tempdir()?;
    let store = Arc::new(MemoryBucketStore::new());
    let warehouse = Arc::new(warehouse);
    let config = PipelineConfig {
        work_dir: work_dir.path().to_path_buf(),
        ..PipelineConfig::default()
    };
    let pipeline = ReportPipeline::new(store.clone(), warehouse.clone(), config);
    Ok(Harness {
        store,
        warehouse,
        pipeline,
        work_dir,
    })
}

fn run_context() -> RunContext {
    RunContext::at(Utc.with_ymd_and_hms(2023, 4, 1, 10, 0, 0).unwrap())
}

fn artifact(name: &str) -> ArtifactReference {
    ArtifactReference::new(ObjectLocator::new("reports", name))
}

#[tokio::test]
async fn bunbury_report_commits_five_tables() -> Result<()> {
    let h = harness(MemoryWarehouse::new())?;
    h.store
        .insert(ObjectLocator::new("reports", REPORT_NAME), report_workbook(None)?);

    let outcome = h.pipeline.run(artifact(REPORT_NAME), run_context()).await?;
    let RunOutcome::Completed(report) = outcome else {
        panic!("expected a completed run");
    };

    assert_eq!(report.site, Site::Bunbury);
    assert_eq!(report.report_date.to_string(), "2023-04-01");
    assert_eq!(
        report.tables.iter().map(|t| t.entity).collect::<Vec<_>>(),
        Entity::ALL.to_vec()
    );
    let rows: Vec<u64> = report.tables.iter().map(|t| t.rows).collect();
    assert_eq!(rows, vec![2, 2, 2, 2, 1]);
    assert_eq!(h.warehouse.row_count("hilton_servicelevel"), 2);

    let appends = h.warehouse.appends();
    assert_eq!(appends.len(), 5);
    let upload_micros = run_context().upload_timestamp.timestamp_micros();
    for (table, df) in &appends {
        assert_eq!(table.dataset, "hilton");
        let sites = df.column("filename_site")?.str()?;
        assert!(sites.into_iter().all(|site| site == Some("Bunbury")), "{table}");
        let days = df.column("filename_date")?.cast(&DataType::Int32)?;
        assert!(days.i32()?.into_iter().all(|day| day == Some(19448)), "{table}");
        let uploaded = df.column("upload_utc_dt")?.cast(&DataType::Int64)?;
        assert!(uploaded.i64()?.into_iter().all(|ts| ts == Some(upload_micros)));
        let names = df.column("filename")?.str()?;
        assert!(names.into_iter().all(|name| name == Some(REPORT_NAME)));
        let hashes = df.column("file_contents_hash")?.str()?;
        assert!(hashes
            .into_iter()
            .all(|hash| hash == Some(report.content_hash.as_str())));
    }

    let archived = h.store.keys("reports_output");
    assert_eq!(archived.len(), 11);
    assert!(archived.contains(&format!("20230401_10:00:00_{REPORT_NAME}")));
    assert!(archived.contains(&"20230401_10:00:00_Bunbury_hilton_servicelevel.csv".to_string()));
    assert!(archived.contains(&"20230401_10:00:00_Bunbury_hilton_customer.parquet".to_string()));
    assert_eq!(
        report.archive_key.as_deref(),
        Some(format!("20230401_10:00:00_{REPORT_NAME}").as_str())
    );

    let csv = h
        .store
        .get(&ObjectLocator::new(
            "reports_output",
            "20230401_10:00:00_Bunbury_hilton_servicelevel.csv",
        ))
        .expect("service level csv export");
    let csv = String::from_utf8(csv.to_vec())?;
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.lines().next().unwrap_or_default().starts_with("SERVICE_GROUP,"));

    assert_eq!(std::fs::read_dir(h.work_dir.path())?.count(), 0);
    Ok(())
}

#[tokio::test]
async fn missing_forecast_sheet_commits_nothing() -> Result<()> {
    let h = harness(MemoryWarehouse::new())?;
    h.store.insert(
        ObjectLocator::new("reports", REPORT_NAME),
        report_workbook(Some("Forecast Data"))?,
    );

    let err = h
        .pipeline
        .run(artifact(REPORT_NAME), run_context())
        .await
        .unwrap_err();
    match err {
        PipelineError::Extraction(ExtractionError::SheetNotFound { sheet }) => {
            assert_eq!(sheet, "Forecast Data")
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(h.warehouse.appends().is_empty());
    // Only the raw copy, archived ahead of extraction.
    assert_eq!(
        h.store.keys("reports_output"),
        vec![format!("20230401_10:00:00_{REPORT_NAME}")]
    );
    Ok(())
}

#[tokio::test]
async fn misnamed_object_aborts_without_side_effects() -> Result<()> {
    let h = harness(MemoryWarehouse::new())?;
    let name = "Monthly Summary 01-04-2023.xlsx";
    h.store
        .insert(ObjectLocator::new("reports", name), report_workbook(None)?);

    let outcome = h.pipeline.run(artifact(name), run_context()).await?;
    assert!(matches!(
        outcome,
        RunOutcome::Aborted {
            stage: RunStage::Validating,
            ..
        }
    ));
    assert!(h.store.keys("reports_output").is_empty());
    assert!(h.warehouse.appends().is_empty());
    Ok(())
}

#[tokio::test]
async fn missing_object_aborts_at_fetch() -> Result<()> {
    let h = harness(MemoryWarehouse::new())?;

    let outcome = h.pipeline.run(artifact(REPORT_NAME), run_context()).await?;
    match outcome {
        RunOutcome::Aborted { stage, reason } => {
            assert_eq!(stage, RunStage::Fetching);
            assert!(reason.contains("not found"), "{reason}");
        }
        other => panic!("expected abort, got {other:?}"),
    }
    assert!(h.store.keys("reports_output").is_empty());
    assert!(h.warehouse.appends().is_empty());
    Ok(())
}

#[tokio::test]
async fn undated_report_is_archived_then_fails() -> Result<()> {
    let h = harness(MemoryWarehouse::new())?;
    let name = "Bunbury Service Level Report.xlsx";
    h.store
        .insert(ObjectLocator::new("reports", name), report_workbook(None)?);

    let err = h.pipeline.run(artifact(name), run_context()).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Extraction(ExtractionError::MalformedDate { .. })
    ));
    assert_eq!(h.store.keys("reports_output").len(), 1);
    assert!(h.warehouse.appends().is_empty());
    Ok(())
}

#[tokio::test]
async fn sink_failure_surfaces_and_keeps_earlier_commits() -> Result<()> {
    let h = harness(MemoryWarehouse::failing_on("hilton_servicegroup"))?;
    h.store
        .insert(ObjectLocator::new("reports", REPORT_NAME), report_workbook(None)?);

    let err = h
        .pipeline
        .run(artifact(REPORT_NAME), run_context())
        .await
        .unwrap_err();
    match err {
        PipelineError::SinkWrite { table, .. } => {
            assert_eq!(table.to_string(), "hilton.hilton_servicegroup")
        }
        other => panic!("unexpected error: {other}"),
    }

    let committed: Vec<String> = h
        .warehouse
        .appends()
        .into_iter()
        .map(|(table, _)| table.table)
        .collect();
    assert_eq!(committed, vec!["hilton_masterdata", "hilton_servicelevel"]);
    Ok(())
}

#[tokio::test]
async fn storage_event_uses_configured_archive_bucket() -> Result<()> {
    let work_dir = tempfile::tempdir()?;
    let store = Arc::new(MemoryBucketStore::new());
    let warehouse = Arc::new(MemoryWarehouse::new());
    let config = PipelineConfig {
        dataset: "staging".into(),
        archive: ArchiveTarget::Bucket("audit".into()),
        work_dir: work_dir.path().to_path_buf(),
    };
    let pipeline = ReportPipeline::new(store.clone(), warehouse.clone(), config);
    store.insert(
        ObjectLocator::new("reports", "inbound/Trug Service Level Report 29.03.2022.xlsx"),
        report_workbook(None)?,
    );

    let event: StorageEvent = serde_json::from_str(
        r#"{"name": "inbound/Trug Service Level Report 29.03.2022.xlsx", "bucket": "reports"}"#,
    )?;
    let outcome = pipeline.handle_event(event).await?;
    let report = outcome.report().expect("completed run");

    assert_eq!(report.site, Site::Truganina);
    assert_eq!(report.filename, "Trug Service Level Report 29.03.2022.xlsx");
    assert_eq!(store.keys("audit").len(), 11);
    assert!(store.keys("reports_output").is_empty());
    assert!(warehouse
        .appends()
        .iter()
        .all(|(table, _)| table.dataset == "staging"));
    Ok(())
}

#[tokio::test]
async fn site_folder_in_object_key_marks_the_site() -> Result<()> {
    let h = harness(MemoryWarehouse::new())?;
    let key = "trug/Service Level Report 01.04.2023.xlsx";
    h.store
        .insert(ObjectLocator::new("reports", key), report_workbook(None)?);

    let outcome = h.pipeline.run(artifact(key), run_context()).await?;
    let report = outcome.report().expect("completed run");

    assert_eq!(report.site, Site::Truganina);
    assert_eq!(report.filename, "Service Level Report 01.04.2023.xlsx");
    assert_eq!(
        report.archive_key.as_deref(),
        Some("20230401_10:00:00_Service Level Report 01.04.2023.xlsx")
    );
    let (_, df) = &h.warehouse.appends()[0];
    let sites = df.column("filename_site")?.str()?;
    assert!(sites.into_iter().all(|site| site == Some("Truganina")));
    let names = df.column("filename")?.str()?;
    assert!(names
        .into_iter()
        .all(|name| name == Some("Service Level Report 01.04.2023.xlsx")));
    Ok(())
}

#[tokio::test]
async fn local_run_loads_without_archive_or_exports() -> Result<()> {
    let h = harness(MemoryWarehouse::new())?;
    let source_dir = tempfile::tempdir()?;
    let path = source_dir.path().join("Heathwood Service Level Report - 16032022.xlsx");
    std::fs::write(&path, report_workbook(None)?)?;

    let outcome = h.pipeline.run_local(&path, run_context()).await?;
    let report = outcome.report().expect("completed run");

    assert_eq!(report.site, Site::Heathwood);
    assert_eq!(report.report_date.to_string(), "2022-03-16");
    assert!(report.archive_key.is_none());
    assert!(report
        .tables
        .iter()
        .all(|t| t.csv_key.is_none() && t.snapshot_key.is_none()));
    assert_eq!(h.warehouse.appends().len(), 5);
    assert!(h.store.keys("reports_output").is_empty());
    assert!(path.exists());
    Ok(())
}

#[tokio::test]
async fn local_run_of_missing_file_aborts() -> Result<()> {
    let h = harness(MemoryWarehouse::new())?;
    let path = h.work_dir.path().join(REPORT_NAME);

    let outcome = h.pipeline.run_local(&path, run_context()).await?;
    assert!(matches!(
        outcome,
        RunOutcome::Aborted {
            stage: RunStage::Fetching,
            ..
        }
    ));
    Ok(())
}
