use serde::Serialize;

/// Standard success envelope for admin-surface responses.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}
