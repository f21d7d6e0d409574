use axum::{
    extract::{Path, State},
    response::Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::MatchSummary;
use crate::state::AppState;

/// Accepted matches of a user, most recently updated first
pub async fn list_matches(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<MatchSummary>>, AppError> {
    let user_id = Uuid::parse_str(&user_id)
        .map_err(|_| AppError::MalformedPayload(format!("invalid user id '{}'", user_id)))?;

    let matches = state.matches.list_accepted_for_user(user_id).await?;
    let summaries = matches
        .into_iter()
        .filter_map(|m| {
            m.partner_of(user_id).map(|partner_id| MatchSummary {
                id: m.id,
                partner_id,
                updated_at: m.updated_at,
            })
        })
        .collect();

    Ok(Json(summaries))
}
