use super::{load_validator, parse_headers, print_report, read_body};
use crate::cli::MessageArgs;
use crate::{GuardError, Result};
use colored::*;

pub fn execute_request(args: &MessageArgs) -> Result<bool> {
    let validator = load_validator(args)?;

    let mut builder = http::Request::builder()
        .method(args.method.to_uppercase().as_str())
        .uri(args.path.as_str());
    if let Some(headers) = builder.headers_mut() {
        headers.extend(parse_headers(&args.headers)?);
    }
    let request = builder
        .body(read_body(args.body.as_deref())?)
        .map_err(|e| GuardError::InvalidInput(e.to_string()))?;

    println!("{}", "Validating request...".bright_blue());
    println!("  {} {}", args.method.to_uppercase(), args.path);

    match validator.validate_request(&request) {
        Ok(report) => Ok(print_report(&report, "Request")),
        Err(GuardError::Route(e)) => {
            println!("{}", "✗ Request could not be routed".red().bold());
            println!("    - {}", e.to_string().red());
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
