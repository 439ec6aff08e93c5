use capsule_core::decision::CriterionId;
use capsule_core::encapsulation::DatasetKind;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Parses `criterion=value`; range checks happen when the value is applied.
pub(crate) fn parse_override(raw: &str) -> Result<(CriterionId, i64), String> {
    let (id, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected CRITERION=VALUE, got '{raw}'"))?;
    let id = id.trim();
    if id.is_empty() {
        return Err(format!("missing criterion id in '{raw}'"));
    }
    let value = value
        .trim()
        .parse::<i64>()
        .map_err(|err| format!("failed to parse value in '{raw}' ({err})"))?;
    Ok((CriterionId::new(id), value))
}

pub(crate) fn parse_criterion(raw: &str) -> Result<CriterionId, String> {
    let id = raw.trim();
    if id.is_empty() {
        return Err("criterion id must not be empty".to_string());
    }
    Ok(CriterionId::new(id))
}

pub(crate) fn parse_kind(raw: &str) -> Result<DatasetKind, String> {
    let wanted = raw.trim().to_ascii_lowercase();
    DatasetKind::ALL
        .into_iter()
        .find(|kind| kind.label() == wanted)
        .or_else(|| match DatasetKind::from_extension(&wanted) {
            DatasetKind::Other => None,
            kind => Some(kind),
        })
        .ok_or_else(|| {
            let known: Vec<&str> = DatasetKind::ALL.iter().map(|kind| kind.label()).collect();
            format!("unknown dataset kind '{raw}' (expected one of {})", known.join(", "))
        })
}
