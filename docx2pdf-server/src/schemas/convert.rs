use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// `multipart/form-data` body accepted by the convert endpoints.
#[derive(Debug, ToSchema)]
pub struct ConvertUpload {
    /// The `.docx` document to convert.
    #[schema(value_type = String, format = Binary)]
    #[allow(dead_code)]
    pub file: Vec<u8>,
}

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}
