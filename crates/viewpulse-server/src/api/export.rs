use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use chrono::Utc;
use serde::Deserialize;
use viewpulse_engine::export::export_file_name;
use viewpulse_engine::{to_csv, ExportRow, RangeKey};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ExportQuery {
    pub range: Option<String>,
}

fn parse_export_range(raw: Option<&str>) -> Result<RangeKey, String> {
    let key = match raw.map(str::trim) {
        None | Some("") => RangeKey::Day1,
        Some(raw) => raw.parse::<RangeKey>().map_err(|e| e.to_string())?,
    };
    if RangeKey::EXPORT.contains(&key) {
        Ok(key)
    } else {
        Err(format!(
            "range '{key}' cannot be exported; expected one of 1h, 24h, 7d"
        ))
    }
}

/// GET /api/v1/export: snapshots of the range as a CSV attachment.
pub(super) async fn export_csv(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let range = parse_export_range(query.range.as_deref())
        .map_err(|message| ApiError::new(req_id.0.clone(), "validation_error", message))?;

    let now = Utc::now();
    let rows = viewpulse_db::list_snapshots_since(&state.pool, now - range.duration())
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let rows: Vec<ExportRow> = rows.into_iter().map(ExportRow::from).collect();

    tracing::info!(range = %range, rows = rows.len(), "csv export");
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_file_name(range, now)
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        to_csv(&rows),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_range_defaults_to_one_day() {
        assert_eq!(parse_export_range(None), Ok(RangeKey::Day1));
        assert_eq!(parse_export_range(Some("24h")), Ok(RangeKey::Day1));
        assert_eq!(parse_export_range(Some("7d")), Ok(RangeKey::Days7));
    }

    #[test]
    fn only_export_ranges_are_accepted() {
        assert!(parse_export_range(Some("6h")).is_err());
        assert!(parse_export_range(Some("nope")).is_err());
    }
}
