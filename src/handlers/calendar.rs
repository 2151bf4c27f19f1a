use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::db::queries;
use crate::errors::AppError;
use crate::services::calendar::generate_ics;
use crate::services::ledger;
use crate::state::AppState;

// GET /api/appointments/:id/calendar.ics
pub async fn download_ics(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let (appointment, service_name) = {
        let db = state.conn()?;
        let appointment = ledger::get_appointment(&db, &id)?;
        let service_name = queries::get_package(&db, &appointment.service_package_id)?
            .map(|p| p.name)
            .unwrap_or_else(|| "Vehicle service".to_string());
        (appointment, service_name)
    };

    let ics = generate_ics(&appointment, &service_name);
    let disposition = format!("attachment; filename=\"appointment-{id}.ics\"");

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        ics,
    )
        .into_response())
}
