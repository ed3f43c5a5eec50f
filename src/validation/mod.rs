//! Validation of HTTP messages against declared operations.

mod body;
mod message;
mod parameters;
mod report;
mod violation;

pub use body::{BodyError, essence, is_json, select_media_type};
pub use message::{MessageValidator, RoutedRequest};
pub use parameters::{ParameterSources, parse_query};
pub use report::ValidationReport;
pub use violation::{Keyword, Location, Pointer, PointerSegment, Violation};
