pub mod parse;
pub mod request;
pub mod service;

pub use request::{IssueRequest, IssueResponse, TOKEN_MAX_TTL_WARNING};
pub use service::IssuanceService;
