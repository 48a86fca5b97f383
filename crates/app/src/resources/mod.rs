//! Resources
//!
//! Remote article and event collections behind the shop's JSON API.

pub mod errors;
mod http;
pub mod service;

pub use errors::ResourceServiceError;
pub use http::{HttpResourceService, decode_batch_response};
pub use service::*;
