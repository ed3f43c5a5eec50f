pub mod cli;
pub mod commands;
pub mod description;
pub mod error;
pub mod loader;
pub mod models;
pub mod routing;
pub mod schema;
pub mod telemetry;
pub mod validation;
pub mod validator;

pub use description::ApiDescription;
pub use error::{GuardError, Result};
pub use models::{HttpMethod, OperationAddress};
pub use routing::{ResolvedRoute, RouteError};
pub use validation::{Keyword, Location, ValidationReport, Violation};
pub use validator::{Validator, ValidatorBuilder, ValidatorOptions};
