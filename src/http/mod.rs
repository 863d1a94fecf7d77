//! HTTP protocol layer module
//!
//! Protocol helpers shared by the API and static file handlers.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used items
pub use range::{parse_range_header, ByteRange};
pub use response::{
    build_301_response, build_304_response, build_404_response, build_405_response,
    build_416_response, build_json_error, build_json_response, HttpResponse,
};
