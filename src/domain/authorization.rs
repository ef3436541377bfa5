//! Ownership rule shared by every admin operation on a SmartLink.

use serde_json::json;

use crate::domain::entities::{SmartLink, User};
use crate::error::AppError;

/// Whether `user` may read or change `record` through the admin API.
pub fn can_mutate(record: &SmartLink, user: &User) -> bool {
    record.owner_id == user.id
}

/// [`can_mutate`] as a `Result`, producing `403 Forbidden` on mismatch.
pub fn ensure_can_mutate(record: &SmartLink, user: &User) -> Result<(), AppError> {
    if can_mutate(record, user) {
        Ok(())
    } else {
        Err(AppError::forbidden(
            "You do not have access to this SmartLink",
            json!({}),
        ))
    }
}
