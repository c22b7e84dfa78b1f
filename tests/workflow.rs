//! End-to-end scenarios through the collaborator seams

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;

use lab_quality::catalog::VerificationCatalog;
use lab_quality::collaborators::{
    load_snapshot, Api60fCorrector, InMemoryRecordStore, RecordStore, WriteOutcome, WritePolicy,
};
use lab_quality::comparison::{compare_with, evaluate_for, ComparisonInput, ComparisonResult, HydrometerInput, HydrometerSideInput, TemperatureInput};
use lab_quality::error::CollaboratorError;
use lab_quality::model::{Calibration, Equipment, EquipmentType, Inspection, Measure, Role, VerificationType};
use lab_quality::notes::{self, ComparisonNote, VerificationDraft};
use lab_quality::validity::{AxisStatus, QualityEvaluator, RecordBlock};
use lab_quality::ControlChartBuilder;

fn daily_type() -> VerificationType {
    VerificationType { id: "vt-daily".into(), name: "Verificación diaria".into(), frequency_days: 1, order: 1 }
}

async fn seeded_store() -> InMemoryRecordStore {
    let store = InMemoryRecordStore::default();
    let ty = EquipmentType::new("tt", "Termómetro digital", Role::Working, [Measure::Temperature], 1, 365);
    store.insert_equipment(Equipment::new("th-1", ty)).await;
    store.set_verification_types("tt", vec![daily_type()]).await;
    store
}

#[tokio::test]
async fn test_record_verification_then_report() {
    let store = seeded_store().await;
    let evaluator = QualityEvaluator::utc();
    let now = Utc::now();

    let snapshot = load_snapshot(&store, "th-1").await.unwrap();
    assert_eq!(evaluator.check_can_record(&snapshot, now), Err(RecordBlock::CalibrationMissing));

    store.save_calibration("th-1", Calibration::new(now - Duration::days(10))).await.unwrap();
    store
        .save_inspection("th-1", Inspection::new(now, Some(true)), WritePolicy::RejectIfExists)
        .await
        .unwrap();
    let snapshot = load_snapshot(&store, "th-1").await.unwrap();
    assert!(evaluator.check_can_record(&snapshot, now).is_ok());

    let input = ComparisonInput::Temperature(TemperatureInput {
        under: Some(20.1),
        under_unit: "C".into(),
        reference: Some(20.0),
        reference_unit: "C".into(),
    });
    let result = evaluate_for(&snapshot.equipment_type, 1, &input).unwrap();
    let note = ComparisonNote { reference_id: "th-ref".into(), result };
    let draft = VerificationDraft::from_comparison("vt-daily", 1, now, &note, Some("Rutina")).unwrap();
    let stored = store
        .save_verification("th-1", draft.clone(), WritePolicy::RejectIfExists)
        .await
        .unwrap();
    assert!(!stored.is_conflict());
    assert!(store.save_verification("th-1", draft, WritePolicy::RejectIfExists).await.unwrap().is_conflict());

    let catalog = VerificationCatalog::new(store.clone());
    let types = catalog.get("tt").await.unwrap();
    let snapshot = load_snapshot(&store, "th-1").await.unwrap();
    let report = evaluator.report(&snapshot, &types, now);

    assert!(report.operational);
    assert!(matches!(report.verifications[0].status, AxisStatus::Valid { .. }));

    let chart = ControlChartBuilder::new(&snapshot).unwrap().build();
    assert_eq!(chart.points.len(), 1);
    assert!(!chart.needs_attention());

    // stored record decodes back to the same comparison
    let decoded = notes::decode_verification(&snapshot.verifications[0]).unwrap();
    assert_eq!(decoded, note);
}

struct TableCorrector;

#[async_trait]
impl Api60fCorrector for TableCorrector {
    async fn correct(&self, temp_f: f64, api: f64) -> Result<f64, CollaboratorError> {
        if temp_f > 150.0 {
            return Err(CollaboratorError::Transport("out of table".into()));
        }
        Ok(api - (temp_f - 60.0) * 0.05)
    }
}

#[tokio::test]
async fn test_hydrometer_correction_failure_is_indeterminate() {
    let side = |api: f64, temp: f64| HydrometerSideInput {
        api: Some(api),
        temperature: Some(temp),
        temperature_unit: "F".into(),
    };
    let corrector: Arc<dyn Api60fCorrector> = Arc::new(TableCorrector);

    let ok = compare_with(corrector.as_ref(), &HydrometerInput { work: side(32.0, 80.0), reference: side(31.8, 80.0) })
        .await
        .map(ComparisonResult::Hydrometer);
    assert_eq!(lab_quality::comparison::verdict_of(&ok), lab_quality::Verdict::Pass);

    let failed = compare_with(corrector.as_ref(), &HydrometerInput { work: side(32.0, 200.0), reference: side(31.8, 80.0) })
        .await
        .map(ComparisonResult::Hydrometer);
    assert_eq!(lab_quality::comparison::verdict_of(&failed), lab_quality::Verdict::Indeterminate);
}

#[tokio::test]
async fn test_replace_requires_explicit_decision() {
    let store = seeded_store().await;
    let now = Utc::now();
    let first = Inspection::new(now, Some(false));
    let second = Inspection::new(now, Some(true));

    store.save_inspection("th-1", first, WritePolicy::RejectIfExists).await.unwrap();
    match store.save_inspection("th-1", second.clone(), WritePolicy::RejectIfExists).await.unwrap() {
        WriteOutcome::ConflictToday { existing } => assert_eq!(existing.is_ok, Some(false)),
        other => panic!("expected conflict, got {:?}", other),
    }
    store.save_inspection("th-1", second, WritePolicy::Replace).await.unwrap();

    let snapshot = load_snapshot(&store, "th-1").await.unwrap();
    assert_eq!(snapshot.inspections.len(), 1);
    assert_eq!(snapshot.inspections[0].is_ok, Some(true));
}
