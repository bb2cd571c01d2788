use serde::{Deserialize, Serialize};
use validator::Validate;

/// `{ "success": true, "results": ... }`. Failures go through `AppError`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub results: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(results: T) -> Self {
        ApiResponse {
            success: true,
            results,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct WeekQuery {
    #[validate(range(min = 1, max = 104, message = "week must be between 1 and 104"))]
    pub week: Option<u32>,
}

/// `?force=true` rescores matchups that already have a result.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RecalculateQuery {
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BenchUpdateRequest {
    /// Hex ids of the legislators to bench; replaces the current bench.
    #[serde(rename = "legislatorIds")]
    #[validate(length(max = 20, message = "too many benched legislators"))]
    pub legislator_ids: Vec<String>,
}
