mod matcher;
mod resolver;
mod template;

pub use matcher::{MatchOutcome, PathMatch, PathTemplateMatcher};
pub use resolver::{OperationResolver, ResolvedRoute, RouteError};
pub use template::PathTemplate;
