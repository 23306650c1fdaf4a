use std::fs;
use std::path::{Path, PathBuf};

use crate::model::DocumentValue;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid document value in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read a document value file
pub fn read_value(path: &Path) -> Result<DocumentValue, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path).map_err(IoError::Io)?;
    serde_json::from_str(&content).map_err(|source| IoError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a document value as pretty JSON
pub fn write_value(path: &Path, value: &DocumentValue) -> Result<(), IoError> {
    // Create parent directories if they don't exist
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }
    let content = serde_json::to_string_pretty(value).map_err(|source| IoError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, content).map_err(IoError::Io)
}

/// Read the raw bytes of a file offered for upload
pub fn read_bytes(path: &Path) -> Result<Vec<u8>, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    fs::read(path).map_err(IoError::Io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{SAMPLE_VALUE, create_test_dir, create_test_file};

    #[test]
    fn test_read_value_success() {
        let dir = create_test_dir();
        let path = create_test_file(&dir, "value.json", SAMPLE_VALUE);

        let value = read_value(&path).unwrap();
        assert_eq!(value.document.nodes.len(), 3);
    }

    #[test]
    fn test_read_value_not_found() {
        let dir = create_test_dir();
        let result = read_value(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(IoError::NotFound(_))));
    }

    #[test]
    fn test_read_value_invalid_json() {
        let dir = create_test_dir();
        let path = create_test_file(&dir, "broken.json", "{ \"document\": ");

        let result = read_value(&path);
        assert!(matches!(result, Err(IoError::Json { .. })));
        assert!(result.unwrap_err().to_string().contains("broken.json"));
    }

    #[test]
    fn test_write_value_round_trip() {
        let dir = create_test_dir();
        let path = dir.path().join("nested").join("out.json");
        let value = DocumentValue::from_json(SAMPLE_VALUE).unwrap();

        write_value(&path, &value).unwrap();
        assert_eq!(read_value(&path).unwrap(), value);
    }

    #[test]
    fn test_read_bytes() {
        let dir = create_test_dir();
        let path = create_test_file(&dir, "a.png", "fake image data");
        assert_eq!(read_bytes(&path).unwrap(), b"fake image data");
        assert!(matches!(
            read_bytes(&dir.path().join("b.png")),
            Err(IoError::NotFound(_))
        ));
    }
}
