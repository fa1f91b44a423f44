//! RPC Error Types
//!
//! Maps application errors to JSON-RPC error codes.

use jsonrpsee::types::ErrorObjectOwned;
use serde_json::json;
use vanity_core::domain::DomainError;
use vanity_core::error::AppError;

/// RPC Error Codes
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const QUEUE_FULL: i32 = 4004;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const STORAGE_ERROR: i32 = 5001;
    pub const GENERATION_ERROR: i32 = 5003;
}

/// Convert AppError to JSON-RPC ErrorObject
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    match err {
        AppError::Validation(msg) => {
            ErrorObjectOwned::owned(code::VALIDATION_ERROR, msg, None::<()>)
        }
        AppError::Domain(e @ DomainError::InvalidSuffix(_))
        | AppError::Domain(e @ DomainError::Validation(_)) => {
            ErrorObjectOwned::owned(code::VALIDATION_ERROR, e.to_string(), None::<()>)
        }
        AppError::Domain(e) => {
            ErrorObjectOwned::owned(code::INTERNAL_ERROR, e.to_string(), None::<()>)
        }
        AppError::QueueFull { depth } => ErrorObjectOwned::owned(
            code::QUEUE_FULL,
            AppError::QueueFull { depth }.to_string(),
            Some(json!({ "depth": depth })),
        ),
        AppError::NotFound(msg) => ErrorObjectOwned::owned(code::NOT_FOUND, msg, None::<()>),
        AppError::Storage(msg) => ErrorObjectOwned::owned(code::STORAGE_ERROR, msg, None::<()>),
        AppError::Io(e) => ErrorObjectOwned::owned(code::STORAGE_ERROR, e.to_string(), None::<()>),
        AppError::Generation(e) => {
            ErrorObjectOwned::owned(code::GENERATION_ERROR, e.to_string(), None::<()>)
        }
        e @ (AppError::DuplicateId(_)
        | AppError::Serialization(_)
        | AppError::Config(_)
        | AppError::Internal(_)) => {
            ErrorObjectOwned::owned(code::INTERNAL_ERROR, e.to_string(), None::<()>)
        }
    }
}
