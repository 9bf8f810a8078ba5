use std::path::PathBuf;

use crate::Config;

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// `${VAR}` expansion against the process environment, applied to string
/// values read from the config file (ported from `forge`'s old
/// `expand_env_vars`, used there for the same "secret lives in the
/// environment, path lives in the file" shape).
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut i = 0;

    while i < value.len() {
        if value[i..].starts_with("${") {
            let start = i + 2;
            if let Some(end_rel) = value[start..].find('}') {
                let end = start + end_rel;
                let var = &value[start..end];
                if !var.is_empty() {
                    out.push_str(&std::env::var(var).unwrap_or_default());
                }
                i = end + 1;
                continue;
            }
        }

        let ch = value[i..].chars().next().expect("non-empty slice has a char");
        out.push(ch);
        i += ch.len_utf8();
    }

    out
}

/// The default config file location: `~/.vantage/config.toml`.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".vantage").join("config.toml"))
}

/// Load a `Config` from a TOML file, expanding `${VAR}` references in the
/// raw text before parsing (so the expansion also reaches nested table
/// values, not just top-level strings).
pub fn load_from_file(path: &std::path::Path) -> Result<Config, ConfigLoadError> {
    let raw = std::fs::read_to_string(path)?;
    let expanded = expand_env_vars(&raw);
    let config: Config = toml::from_str(&expanded)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_env_vars_substitutes_known_variable() {
        std::env::set_var("VANTAGE_TEST_VAR", "hello");
        assert_eq!(expand_env_vars("prefix-${VANTAGE_TEST_VAR}-suffix"), "prefix-hello-suffix");
    }

    #[test]
    fn expand_env_vars_blanks_unknown_variable() {
        assert_eq!(expand_env_vars("${VANTAGE_DEFINITELY_UNSET_VAR}"), "");
    }

    #[test]
    fn load_from_file_parses_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "port = 9999\nreal_os = true\n").unwrap();

        let cfg = load_from_file(&path).unwrap();
        assert_eq!(cfg.port, 9999);
        assert!(cfg.real_os);
    }
}
