pub mod openapi;

pub use openapi::{load_openapi, parse_openapi_json, parse_openapi_yaml};
