pub mod client;
pub mod errors;
pub mod mock_auth_api;
pub mod service;

pub use client::HttpAuthApi;
pub use errors::ApiError;
pub use service::{AuthApi, LoginSuccess};
