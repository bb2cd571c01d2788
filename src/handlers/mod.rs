pub mod health;
pub mod leagues;
pub mod legislators;
pub mod matchups;
pub mod sync;
pub mod teams;

use bson::oid::ObjectId;
use tracing::warn;

use crate::errors::{AppError, Result};

pub(crate) fn parse_object_id(raw: &str, what: &str) -> Result<ObjectId> {
    ObjectId::parse_str(raw).map_err(|e| {
        warn!(id = raw, error = %e, "Bad {} id", what);
        AppError::InvalidObjectId(format!("{} id '{}'", what, raw))
    })
}
