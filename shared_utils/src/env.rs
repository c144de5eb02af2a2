//! Environment variable access with structured errors.
//!
//! Configuration for the ETL runs is environment-driven (the jobs run from a
//! scheduler with per-biome env files), so these wrappers return proper error
//! values instead of panicking on missing variables.

use thiserror::Error;

/// An environment variable required by the application is not set.
#[derive(Debug, Error)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVarError(pub String);

/// Reads an environment variable, returning a structured error if it's missing.
///
/// This is a thin wrapper around `std::env::var` that provides a more
/// ergonomic and specific error type for missing variables.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, MissingEnvVarError> {
    std::env::var(name).map_err(|_| MissingEnvVarError(name.to_string()))
}

/// Reads an environment variable, falling back to `default` when unset.
pub fn get_env_var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Reads a yes/no environment flag. Anything other than `yes` (case
/// insensitive) is treated as `no`, including an unset variable.
pub fn get_env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v.trim().eq_ignore_ascii_case("yes"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_var_is_an_error() {
        let err = get_env_var("CMASK_ETL_SURELY_UNSET").unwrap_err();
        assert!(err.to_string().contains("CMASK_ETL_SURELY_UNSET"));
    }

    #[test]
    fn default_applies_when_unset() {
        assert_eq!(get_env_var_or("CMASK_ETL_SURELY_UNSET", "5432"), "5432");
    }

    #[test]
    fn flag_is_no_unless_yes() {
        unsafe { std::env::set_var("CMASK_ETL_FLAG_TEST", "YES") };
        assert!(get_env_flag("CMASK_ETL_FLAG_TEST"));
        unsafe { std::env::set_var("CMASK_ETL_FLAG_TEST", "1") };
        assert!(!get_env_flag("CMASK_ETL_FLAG_TEST"));
        unsafe { std::env::remove_var("CMASK_ETL_FLAG_TEST") };
        assert!(!get_env_flag("CMASK_ETL_FLAG_TEST"));
    }
}
