use crate::error::{AppError, Result};
use uuid::Uuid;

/// Records that belong to exactly one user.
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

/// Resolves a looked-up record for `user_id`: missing records are 404, records
/// belonging to someone else are 403.
pub fn require_owner<T: Owned>(record: Option<T>, user_id: Uuid, what: &str) -> Result<T> {
    let record = record.ok_or_else(|| AppError::NotFound(format!("{} not found", what)))?;

    if record.owner_id() != user_id {
        tracing::warn!("User {} denied access to {} owned by {}", user_id, what, record.owner_id());
        return Err(AppError::Forbidden(format!(
            "You do not have permission to access this {}",
            what.to_lowercase()
        )));
    }

    Ok(record)
}
