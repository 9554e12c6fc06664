pub mod body;

pub use body::{encode_body, parse_body, BodyKind, RequestBody, REQUEST_TOO_LARGE};
