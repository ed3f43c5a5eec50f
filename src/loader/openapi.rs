use crate::error::{GuardError, Result};
use crate::models::OpenApiDocument;
use std::fs;
use std::path::Path;

/// Load an OpenAPI document from a file (YAML or JSON)
pub fn load_openapi<P: AsRef<Path>>(path: P) -> Result<OpenApiDocument> {
    let path = path.as_ref();

    // Read the file
    let content = fs::read_to_string(path).map_err(|e| {
        GuardError::DocumentLoadError(format!("Failed to read file {}: {}", path.display(), e))
    })?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        parse_openapi_json(&content)
    } else {
        parse_openapi_yaml(&content)
    }
}

/// Parse an OpenAPI document from YAML text
pub fn parse_openapi_yaml(content: &str) -> Result<OpenApiDocument> {
    let spec: OpenApiDocument = serde_yaml::from_str(content).map_err(|e| {
        GuardError::DocumentLoadError(format!("Failed to parse OpenAPI YAML: {}", e))
    })?;

    validate_openapi(&spec)?;
    Ok(spec)
}

/// Parse an OpenAPI document from JSON text
pub fn parse_openapi_json(content: &str) -> Result<OpenApiDocument> {
    let spec: OpenApiDocument = serde_json::from_str(content).map_err(|e| {
        GuardError::DocumentLoadError(format!("Failed to parse OpenAPI JSON: {}", e))
    })?;

    validate_openapi(&spec)?;
    Ok(spec)
}

/// Validate the OpenAPI document header
fn validate_openapi(spec: &OpenApiDocument) -> Result<()> {
    if !spec.openapi.starts_with("3.0") && !spec.openapi.starts_with("3.1") {
        return Err(GuardError::UnsupportedVersion(spec.openapi.clone()));
    }

    if spec.paths.is_empty() {
        return Err(GuardError::DocumentLoadError(
            "OpenAPI document must have at least one path".to_string(),
        ));
    }

    tracing::debug!(
        title = %spec.info.title,
        version = %spec.openapi,
        paths = spec.paths.len(),
        "Loaded OpenAPI document"
    );

    Ok(())
}
