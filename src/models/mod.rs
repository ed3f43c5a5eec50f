pub mod openapi;
pub mod operation;

pub use openapi::OpenApiDocument;
pub use operation::{HttpMethod, OperationAddress};
