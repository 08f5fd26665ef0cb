use std::collections::HashMap;
use std::env as stdenv;

/// Mutable overlay on top of the process environment.
///
/// The dispatcher keeps variables assigned with `NAME=VALUE` here instead of
/// mutating the real process environment. Lookups consult the overlay first
/// and fall back to `std::env::var`, so children and `$NAME` expansion see a
/// layered view while the process itself stays untouched.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// Key-value store of overlay variables.
    pub vars: HashMap<String, String>,
}

impl Environment {
    /// Create an empty overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value of a variable, overlay first, process environment
    /// second.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    /// Set or override a variable in the overlay.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Merge a batch of assignments into the overlay.
    pub fn extend(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        self.vars.extend(vars);
    }
}

#[cfg(test)]
mod tests {
    use super::Environment;

    #[test]
    fn test_env_set_and_get_var() {
        let mut env = Environment::new();

        // initially absent
        assert_eq!(env.get_var("SOME_RANDOM_ENV_VAR_12345"), None);

        env.set_var("KEY", "VALUE");

        assert_eq!(env.get_var("KEY"), Some("VALUE".to_string()));
    }

    #[test]
    fn test_env_reads_from_process_env() {
        let env = Environment::new();
        assert!(env.get_var("PATH").is_some());
    }

    #[test]
    fn test_overlay_shadows_process_env() {
        let mut env = Environment::new();
        env.set_var("PATH", "/overlay/bin");
        assert_eq!(env.get_var("PATH"), Some("/overlay/bin".to_string()));
    }
}
