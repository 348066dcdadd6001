//! Transport-free API operations over the day store. The HTTP layer in
//! `server` maps these onto routes; tests can call them directly.

use shared::{
    domain::DayNumber,
    error::{ApiError, ErrorCode},
    protocol::DayRecord,
};
use storage::Storage;
use tracing::error;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

pub async fn list_days(ctx: &ApiContext) -> Result<Vec<DayRecord>, ApiError> {
    ctx.storage.list_days().await.map_err(internal)
}

/// Creates the day slot the client asked for. The requested number must
/// extend the persisted sequence; the collection manager always sends
/// `count + 1`, so anything else is a misordered or foreign writer.
pub async fn create_day(ctx: &ApiContext, number: DayNumber) -> Result<DayRecord, ApiError> {
    let count = ctx.storage.day_count().await.map_err(internal)?;
    if number.0 != count + 1 {
        return Err(ApiError::new(
            ErrorCode::Validation,
            format!("day {number} does not extend the {count}-day itinerary"),
        ));
    }
    ctx.storage.create_day(number).await.map_err(internal)
}

pub async fn delete_day(ctx: &ApiContext, number: DayNumber) -> Result<(), ApiError> {
    let existed = ctx.storage.delete_day(number).await.map_err(internal)?;
    if !existed {
        return Err(ApiError::new(
            ErrorCode::NotFound,
            format!("no day numbered {number}"),
        ));
    }
    Ok(())
}

fn internal(err: anyhow::Error) -> ApiError {
    error!(error = %err, "storage operation failed");
    ApiError::new(ErrorCode::Internal, err.to_string())
}
