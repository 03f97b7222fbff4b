use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    pub fn from_env() -> Self {
        match env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
            .as_str()
        {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

/// Read `key` and parse it, falling back to `default` when the variable is
/// unset or does not parse.
pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Read `key` as a non-empty string.
pub fn env_optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    // SAFETY for the env mutations below: #[serial] keeps these tests off
    // other threads that read the environment.

    #[test]
    #[serial]
    fn environment_defaults_to_development() {
        unsafe { env::remove_var("ENVIRONMENT") };
        assert_eq!(Environment::from_env(), Environment::Development);
    }

    #[test]
    #[serial]
    fn environment_accepts_prod_alias() {
        unsafe { env::set_var("ENVIRONMENT", "PROD") };
        assert_eq!(Environment::from_env(), Environment::Production);
        unsafe { env::remove_var("ENVIRONMENT") };
    }

    #[test]
    #[serial]
    fn env_or_falls_back_on_parse_failure() {
        unsafe { env::set_var("COMMON_TEST_THRESHOLD", "not-a-number") };
        assert_eq!(env_or("COMMON_TEST_THRESHOLD", 0.25f32), 0.25);

        unsafe { env::set_var("COMMON_TEST_THRESHOLD", " 0.7 ") };
        assert_eq!(env_or("COMMON_TEST_THRESHOLD", 0.25f32), 0.7);
        unsafe { env::remove_var("COMMON_TEST_THRESHOLD") };
    }

    #[test]
    #[serial]
    fn env_optional_treats_blank_as_unset() {
        unsafe { env::set_var("COMMON_TEST_PATH", "   ") };
        assert_eq!(env_optional("COMMON_TEST_PATH"), None);

        unsafe { env::set_var("COMMON_TEST_PATH", "/etc/profile.json") };
        assert_eq!(
            env_optional("COMMON_TEST_PATH").as_deref(),
            Some("/etc/profile.json")
        );
        unsafe { env::remove_var("COMMON_TEST_PATH") };
    }
}
