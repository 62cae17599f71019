//! Recording output targets

use chrono::Utc;
use std::path::{Path, PathBuf};

/// Build `<dir>/<name>-<unix-epoch-millis>.<container>`.
///
/// The timestamp keeps repeated recordings with the same base name apart.
pub fn recording_path(dir: &Path, output_name: &str, container: &str) -> PathBuf {
    recording_path_at(dir, output_name, container, Utc::now().timestamp_millis())
}

fn recording_path_at(dir: &Path, output_name: &str, container: &str, millis: i64) -> PathBuf {
    let base = sanitize_name(output_name);
    dir.join(format!("{}-{}.{}", base, millis, container))
}

/// Keep the base name a single path component free of directive syntax
fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' | '\'' | '"' | '{' | '}' | ',' => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "recording".to_string()
    } else {
        cleaned
    }
}
