use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum UserTableError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path} as TOML: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize)]
struct UserTableFile {
    #[serde(default)]
    entry: Vec<UserTableEntry>,
}

#[derive(Debug, Deserialize)]
struct UserTableEntry {
    #[serde(rename = "match")]
    needle: String,
    family: String,
}

/// Load a user-supplied browser-table extension file (spec §4.3: "A
/// user-supplied file may extend the default list; duplicate keys in the
/// user file are logged and ignored").
///
/// File shape:
/// ```toml
/// [[entry]]
/// match = "MyTool"
/// family = "Others"
/// ```
pub fn load_user_table(path: impl AsRef<Path>) -> Result<Vec<(String, String)>, UserTableError> {
    let path_ref = path.as_ref();
    let contents = std::fs::read_to_string(path_ref).map_err(|source| UserTableError::Read {
        path: path_ref.display().to_string(),
        source,
    })?;
    let parsed: UserTableFile = toml::from_str(&contents).map_err(|source| UserTableError::Parse {
        path: path_ref.display().to_string(),
        source,
    })?;

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for entry in parsed.entry {
        if !seen.insert(entry.needle.clone()) {
            tracing::warn!(
                needle = %entry.needle,
                "duplicate key in user browser table, ignoring"
            );
            continue;
        }
        out.push((entry.needle, entry.family));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_entries_and_drops_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("browsers.toml");
        std::fs::write(
            &path,
            r#"
[[entry]]
match = "MyTool"
family = "Others"

[[entry]]
match = "MyTool"
family = "Duplicate"
"#,
        )
        .unwrap();

        let table = load_user_table(&path).unwrap();
        assert_eq!(table, vec![("MyTool".to_string(), "Others".to_string())]);
    }
}
