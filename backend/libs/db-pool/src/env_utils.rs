//! Environment variable parsing helpers shared by service configs.

use std::fmt::Display;
use std::str::FromStr;

/// Parse an environment variable, falling back to `default` only when unset.
///
/// A value that is present but fails to parse is reported instead of being
/// silently replaced.
pub fn parse_env_strict<T>(key: &str, default: T) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[serial_test::serial]
    fn test_parse_env_strict() {
        assert_eq!(parse_env_strict::<u32>("NONEXISTENT_VAR_XYZ", 7), Ok(7));

        std::env::set_var("TEST_STRICT", "12");
        assert_eq!(parse_env_strict::<u32>("TEST_STRICT", 7), Ok(12));

        std::env::set_var("TEST_STRICT", "twelve");
        let err = parse_env_strict::<u32>("TEST_STRICT", 7).unwrap_err();
        assert!(err.contains("TEST_STRICT"));
        std::env::remove_var("TEST_STRICT");
    }
}
