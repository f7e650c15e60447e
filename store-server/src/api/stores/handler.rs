//! Store API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::auth::AuthenticatedIdentity;
use crate::core::ServerState;
use crate::db::models::{Store, StoreConfigUpdate};
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text,
    validate_time_of_day,
};
use crate::utils::{AppResponse, AppResult, ok};

#[derive(Debug, Serialize)]
pub struct StoreIdResponse {
    pub store_id: String,
}

/// Get a store
pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Store>>> {
    let store = state.stores.get(&id).await?;
    Ok(ok(store))
}

/// Replace a store's operating configuration
pub async fn update(
    State(state): State<ServerState>,
    identity: AuthenticatedIdentity,
    Path(id): Path<String>,
    Json(payload): Json<StoreConfigUpdate>,
) -> AppResult<Json<AppResponse<StoreIdResponse>>> {
    validate_update(&payload)?;

    let store_id = state.stores.update(&id, payload).await?;
    tracing::info!(
        store_id = %store_id,
        operator = %identity.subject_id,
        "Store configuration updated"
    );

    Ok(ok(StoreIdResponse { store_id }))
}

/// 手动开店 (店铺不存在时为空操作)
pub async fn open(
    State(state): State<ServerState>,
    identity: AuthenticatedIdentity,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<StoreIdResponse>>> {
    let changed = state.stores.open(&id).await?;
    tracing::info!(
        store_id = %id,
        operator = %identity.subject_id,
        changed,
        "Store opened manually"
    );
    Ok(ok(StoreIdResponse { store_id: id }))
}

/// 手动关店 (店铺不存在时为空操作)
pub async fn close(
    State(state): State<ServerState>,
    identity: AuthenticatedIdentity,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<StoreIdResponse>>> {
    let changed = state.stores.close(&id).await?;
    tracing::info!(
        store_id = %id,
        operator = %identity.subject_id,
        changed,
        "Store closed manually"
    );
    Ok(ok(StoreIdResponse { store_id: id }))
}

fn validate_update(payload: &StoreConfigUpdate) -> AppResult<()> {
    validate_optional_text(&payload.store_name, "store_name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.address, "address", MAX_ADDRESS_LEN)?;
    validate_optional_text(&payload.store_number, "store_number", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.additional_comment, "additional_comment", MAX_NOTE_LEN)?;
    validate_time_of_day(&payload.open_time, "open_time")?;
    validate_time_of_day(&payload.close_time, "close_time")?;
    validate_time_of_day(&payload.sale_start, "sale_start")?;
    validate_time_of_day(&payload.sale_end, "sale_end")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::AppError;

    fn payload() -> StoreConfigUpdate {
        StoreConfigUpdate {
            address: Some("Seoul".to_string()),
            store_name: Some("Mayo".to_string()),
            store_number: Some("02-000-0000".to_string()),
            open_time: "10:00".to_string(),
            close_time: "21:00".to_string(),
            sale_start: "09:00".to_string(),
            sale_end: "20:30".to_string(),
            additional_comment: None,
        }
    }

    #[test]
    fn test_valid_update_passes() {
        assert!(validate_update(&payload()).is_ok());
    }

    #[test]
    fn test_malformed_time_rejected() {
        let mut update = payload();
        update.sale_start = "9:00".to_string();
        assert!(matches!(validate_update(&update), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_overlong_name_rejected() {
        let mut update = payload();
        update.store_name = Some("x".repeat(MAX_NAME_LEN + 1));
        assert!(matches!(validate_update(&update), Err(AppError::Validation(_))));
    }
}
