//! HTTP client for the survey backend.

mod client;
pub mod types;

pub use client::{ApiClient, ApiError};
pub use types::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
