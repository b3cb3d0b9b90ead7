use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Write one indented JSON document, creating parent directories as needed.
pub fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<PathBuf, String> {
    let data = serde_json::to_vec_pretty(value)
        .map_err(|e| format!("Failed to serialize {name}: {e}"))?;
    write_bytes(dir, name, &data)
}

pub fn write_bytes(dir: &Path, name: &str, data: &[u8]) -> Result<PathBuf, String> {
    fs::create_dir_all(dir)
        .map_err(|e| format!("Failed to create directory {}: {e}", dir.display()))?;
    let path = dir.join(name);
    fs::write(&path, data).map_err(|e| format!("Failed to write {}: {e}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn creates_missing_directories_and_indents() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let nested = dir.path().join("legislation").join("acts");

        let path = write_json(&nested, "out.json", &json!({"id": "103.2"}))
            .expect("write_json should succeed");

        let written = fs::read_to_string(path).expect("output should be readable");
        assert!(written.contains("\n  \"id\": \"103.2\""));
    }

    #[test]
    fn unwritable_directory_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let file_path = dir.path().join("occupied");
        fs::write(&file_path, b"x").expect("marker file should be written");

        let result = write_bytes(&file_path, "out.json", b"{}");
        assert!(result.is_err());
    }
}
