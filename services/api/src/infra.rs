use chrono::{DateTime, NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};
use vanguard::error::AppError;
use vanguard::health::{export_from_dir, InMemoryEngagementStore};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Build the serving store, seeded from `ledger_dir` when one is configured.
pub(crate) fn engagement_store(
    ledger_dir: Option<&Path>,
) -> Result<InMemoryEngagementStore, AppError> {
    let store = InMemoryEngagementStore::default();

    let Some(dir) = ledger_dir else {
        warn!("no ledger directory configured; serving an empty engagement store");
        return Ok(store);
    };

    let export = export_from_dir(dir)?;
    info!(
        dir = %dir.display(),
        students = export.students.len(),
        events = export.activity.len(),
        tasks = export.tasks.len(),
        feedback = export.feedback.len(),
        "ledger export loaded"
    );
    store.load_export(export)?;
    Ok(store)
}

/// Parse an evaluation instant: RFC 3339, or `YYYY-MM-DD` read as midnight UTC.
pub(crate) fn parse_as_of(raw: &str) -> Result<DateTime<Utc>, String> {
    let trimmed = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(instant.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as RFC 3339 or YYYY-MM-DD ({err})"))?
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| format!("'{raw}' has no midnight"))
}
