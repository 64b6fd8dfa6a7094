mod client;

pub use client::{ApiError, ApiResult, CoderClient, GenerateApiKeyResponse, User};
