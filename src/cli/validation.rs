use crate::cli::args::CliArgs;
use crate::form::MAX_RESULTS_RANGE;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(query) = args.query.as_deref() {
        if query.trim().is_empty() {
            return Err("invalid --query, expected a non-empty search term".to_string());
        }
    }
    if let Some(max) = args.max_results {
        if !MAX_RESULTS_RANGE.contains(&max) {
            return Err(format!(
                "invalid --max-results {max}, expected {}-{}",
                MAX_RESULTS_RANGE.start(),
                MAX_RESULTS_RANGE.end()
            ));
        }
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid --timeout, expected positive integer".to_string());
        }
    }
    if let Some(server) = args.server.as_deref() {
        let parsed = reqwest::Url::parse(server.trim())
            .map_err(|e| format!("invalid --server '{server}': {e}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(format!("invalid --server '{server}': expected http or https"));
        }
    }
    if args.export && args.interactive {
        return Err(
            "--export and --interactive cannot be combined, use /export at the prompt".to_string(),
        );
    }
    if args.export && args.query.is_none() {
        return Err("--export needs a --query to export results from".to_string());
    }
    if args.interactive && args.query.is_some() {
        return Err("--interactive and --query cannot be combined".to_string());
    }
    Ok(())
}
