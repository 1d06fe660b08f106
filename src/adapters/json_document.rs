//! Reading and writing documents as JSON files.

use crate::domain::document::Document;
use crate::domain::error::BuilderError;
use std::fs;
use std::path::Path;

pub fn load_document<P: AsRef<Path>>(path: P) -> Result<Document, BuilderError> {
    let content = fs::read_to_string(path.as_ref())?;
    parse_document(&content)
}

pub fn parse_document(content: &str) -> Result<Document, BuilderError> {
    Ok(serde_json::from_str(content)?)
}

pub fn to_json(document: &Document) -> Result<String, BuilderError> {
    Ok(serde_json::to_string_pretty(document)?)
}

pub fn save_document<P: AsRef<Path>>(path: P, document: &Document) -> Result<(), BuilderError> {
    fs::write(path.as_ref(), to_json(document)?)?;
    tracing::debug!(path = %path.as_ref().display(), "wrote document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::asset::AssetDefaults;
    use tempfile::TempDir;

    #[test]
    fn save_then_load_preserves_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("strategy.json");
        let mut doc = Document::new();
        doc.add_asset("AAPL", &AssetDefaults::default()).unwrap();

        save_document(&path, &doc).unwrap();
        assert_eq!(load_document(&path).unwrap(), doc);
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            load_document("/nonexistent/strategy.json"),
            Err(BuilderError::Io(_))
        ));
    }

    #[test]
    fn malformed_json_is_json_error() {
        assert!(matches!(
            parse_document("{\"stocks\": ["),
            Err(BuilderError::Json(_))
        ));
    }

    #[test]
    fn unknown_indicator_is_rejected() {
        let json = r#"{"stocks":[{"symbol":"AAPL","investment":100,"max_loss":10,
            "entry_rules":[{"indicator":"vwap","operator":">","value":1}],
            "exit_conditions":[{"type":"stop_loss","value":5}]}]}"#;
        let err = parse_document(json).unwrap_err();
        assert!(err.to_string().contains("vwap"), "{err}");
    }
}
