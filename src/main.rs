//! Laboratory Equipment Quality-State Engine
//!
//! Usage: `lab_quality <snapshot.json> [config-path]`
//!
//! Prints the quality report of the instrument in the snapshot and, when its
//! category has one, its control chart. Hydrometers get their latest
//! comparison re-corrected through the configured API-60F service.

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;
use tokio::fs;
use tracing::{debug, info, warn};

use lab_quality::catalog::VerificationCatalog;
use lab_quality::collaborators::{load_snapshot, EquipmentSource, InMemoryRecordStore, SnapshotFile};
use lab_quality::comparison::{recheck, verdict_of, HydrometerComparison};
use lab_quality::config::ConfigManager;
use lab_quality::notes::decode_verification;
use lab_quality::utils::init_logging;
use lab_quality::{ComparisonResult, ControlChartBuilder, Equipment, EquipmentCategory, QualityEvaluator};

const DEFAULT_CONFIG_PATH: &str = "lab_quality.json";

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let mut args = std::env::args().skip(1);
    let snapshot_path = args
        .next()
        .context("usage: lab_quality <snapshot.json> [config-path]")?;
    let config_path = args.next().unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = ConfigManager::new(&config_path)
        .load_with_env()
        .await
        .with_context(|| format!("loading configuration from {}", config_path))?;
    init_logging(&config);
    let calendar = config.calendar()?;

    let raw = fs::read_to_string(&snapshot_path)
        .await
        .with_context(|| format!("reading {}", snapshot_path))?;
    let file: SnapshotFile = serde_json::from_str(&raw).with_context(|| format!("parsing {}", snapshot_path))?;
    let reference_ids: Vec<String> = file.references.iter().map(|r| r.id.clone()).collect();

    let store = InMemoryRecordStore::new(calendar);
    let equipment_id = file.seed(&store).await;
    let equipment = load_snapshot(&store, &equipment_id).await?;
    let mut references = Vec::with_capacity(reference_ids.len());
    for id in &reference_ids {
        references.push(store.equipment(id).await?);
    }

    let catalog = VerificationCatalog::new(store.clone());
    let types = catalog.get(&equipment.equipment_type.id).await?;

    let now = Utc::now();
    let report = QualityEvaluator::new(calendar).report(&equipment, &types, now);
    info!(
        "{} ({}) operational: {}",
        equipment.id,
        equipment.category().label(),
        report.operational
    );

    let chart = match ControlChartBuilder::new(&equipment) {
        Ok(builder) => Some(builder.calendar(calendar).references(&references).build()),
        Err(e) => {
            warn!("No control chart: {}", e);
            None
        }
    };
    if let Some(chart) = chart.as_ref().filter(|c| c.needs_attention()) {
        warn!("{} point(s) out of control", chart.out_of_control_count);
    }

    let mut hydrometer_check = None;
    if equipment.category() == EquipmentCategory::Hydrometer {
        match (config.corrector()?, latest_hydrometer(&equipment)) {
            (Some(corrector), Some(stored)) => {
                info!("Re-correcting latest hydrometer comparison via {}", corrector.url());
                let fresh = recheck(&corrector, &stored).await.map(ComparisonResult::Hydrometer);
                let verdict = verdict_of(&fresh);
                hydrometer_check = Some(json!({ "verdict": verdict, "isOk": verdict.as_is_ok() }));
            }
            (None, _) => warn!("No API-60F service configured; hydrometer readings are not re-corrected"),
            (_, None) => debug!("No hydrometer comparison on record for {}", equipment.id),
        }
    }

    let output = json!({ "report": report, "chart": chart, "hydrometerCheck": hydrometer_check });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn latest_hydrometer(equipment: &Equipment) -> Option<HydrometerComparison> {
    equipment
        .verifications
        .iter()
        .filter_map(|v| Some((v.verified_at?, decode_verification(v)?)))
        .filter_map(|(at, note)| match note.result {
            ComparisonResult::Hydrometer(h) => Some((at, h)),
            _ => None,
        })
        .max_by_key(|(at, _)| *at)
        .map(|(_, h)| h)
}
