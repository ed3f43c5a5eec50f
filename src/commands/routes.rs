use super::colored_method;
use crate::description::ApiDescription;
use crate::{Result, loader};
use colored::*;
use std::path::Path;

pub fn execute_routes(openapi_path: &Path) -> Result<bool> {
    println!("{}", "Loading OpenAPI file...".bright_blue());
    println!("  Path: {}", openapi_path.display());

    let document = loader::load_openapi(openapi_path)?;
    let description = ApiDescription::from_document(&document)?;

    println!("\n{}", "✓ OpenAPI loaded successfully".green());
    println!("  Title: {}", description.title.bold());
    println!("  Version: {}", description.version);
    println!("  OpenAPI Version: {}", document.openapi);
    for base in description.base_paths() {
        println!("  Base path: {}", base);
    }
    println!();

    let count = description.operations().count();
    println!("{}", format!("Operations ({}):", count).bold());
    for operation in description.operations() {
        let id = operation
            .operation_id
            .as_deref()
            .map(|id| format!("  ({})", id).dimmed().to_string())
            .unwrap_or_default();
        println!(
            "  {} {}{}",
            colored_method(operation.address.method),
            operation.address.path,
            id
        );
    }

    Ok(true)
}
