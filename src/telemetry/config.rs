const DEFAULT_FILTER: &str = "oasguard=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive, e.g. `oasguard=debug`
    pub filter: String,
    pub format: LogFormat,
    pub with_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::Pretty,
            with_target: true,
        }
    }
}

impl TelemetryConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let filter = lookup("OASGUARD_LOG")
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());

        let format = match lookup("OASGUARD_LOG_FORMAT") {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let with_target = lookup("OASGUARD_LOG_TARGET")
            .and_then(|v| v.parse().ok())
            .unwrap_or(true);

        Self {
            filter,
            format,
            with_target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> TelemetryConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        TelemetryConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(config(&[]), TelemetryConfig::default());
        assert_eq!(config(&[("OASGUARD_LOG", "  ")]).filter, "oasguard=info");
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("OASGUARD_LOG", "oasguard=trace"),
            ("OASGUARD_LOG_FORMAT", "JSON"),
            ("OASGUARD_LOG_TARGET", "false"),
        ]);
        assert_eq!(config.filter, "oasguard=trace");
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.with_target);
    }
}
