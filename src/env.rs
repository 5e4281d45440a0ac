//! Environment variable helpers for configuring a [`Formatter`] from a
//! deployment manifest.
//!
//! These are purely helpers; [`Formatter`] itself never reads the
//! environment.

use crate::formatter::Formatter;

/// Indent JSON output when truthy.
pub const CLOUD_LOG_PRETTY_PRINT_ENV: &str = "CLOUD_LOG_PRETTY_PRINT";

/// Omit the `timestamp` key when truthy.
pub const CLOUD_LOG_DISABLE_TIMESTAMP_ENV: &str = "CLOUD_LOG_DISABLE_TIMESTAMP";

/// Prefix stripped from caller file paths.
pub const CLOUD_LOG_TRIM_PREFIX_ENV: &str = "CLOUD_LOG_TRIM_PREFIX";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// `true` if `key` is set to `1`, `true`, `yes` or `on` (any case).
pub fn env_flag(key: &str) -> bool {
    parse_flag(&env_or(key, ""))
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl Formatter {
    /// Build a formatter from the `CLOUD_LOG_*` variables. Unset variables
    /// keep the defaults.
    pub fn from_env() -> Self {
        Formatter {
            disable_timestamp: env_flag(CLOUD_LOG_DISABLE_TIMESTAMP_ENV),
            caller_prettyfier: None,
            trim_filename_prefix: env_or(CLOUD_LOG_TRIM_PREFIX_ENV, ""),
            pretty_print: env_flag(CLOUD_LOG_PRETTY_PRINT_ENV),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_values() {
        for on in ["1", "true", "TRUE", "yes", " on "] {
            assert!(parse_flag(on), "{on}");
        }
        for off in ["", "0", "false", "no", "maybe"] {
            assert!(!parse_flag(off), "{off}");
        }
    }

    #[test]
    fn formatter_from_env_reads_all_variables() {
        std::env::set_var(CLOUD_LOG_PRETTY_PRINT_ENV, "true");
        std::env::set_var(CLOUD_LOG_DISABLE_TIMESTAMP_ENV, "1");
        std::env::set_var(CLOUD_LOG_TRIM_PREFIX_ENV, "/build/");

        let formatter = Formatter::from_env();

        std::env::remove_var(CLOUD_LOG_PRETTY_PRINT_ENV);
        std::env::remove_var(CLOUD_LOG_DISABLE_TIMESTAMP_ENV);
        std::env::remove_var(CLOUD_LOG_TRIM_PREFIX_ENV);

        assert!(formatter.pretty_print);
        assert!(formatter.disable_timestamp);
        assert_eq!(formatter.trim_filename_prefix, "/build/");
        assert!(formatter.caller_prettyfier.is_none());

        let defaults = Formatter::from_env();
        assert!(!defaults.pretty_print);
        assert!(!defaults.disable_timestamp);
        assert_eq!(defaults.trim_filename_prefix, "");
    }

    #[test]
    fn env_or_falls_back() {
        assert_eq!(env_or("CLOUD_LOG_TEST_SURELY_UNSET_VARIABLE", "dflt"), "dflt");
    }
}
