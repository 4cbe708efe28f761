pub mod error;
pub mod latency;
pub mod response;

pub use error::{ApiError, ApiResult};
pub use response::ApiResponse;
