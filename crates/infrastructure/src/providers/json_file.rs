//! JSON file variable provider.
//!
//! Reads a JSON array of variables on every request:
//!
//! ```json
//! [
//!   { "name": "host", "value": "localhost" },
//!   { "variable": "token", "value": "abc", "enabled": false }
//! ]
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;
use vareval_application::ports::{ProviderError, VariableProvider};
use vareval_domain::Variable;

use crate::serialization::from_json_bytes;

/// Serves variables stored in a JSON file. A missing file declines.
#[derive(Debug, Clone)]
pub struct JsonFileVariableProvider {
    path: PathBuf,
}

impl JsonFileVariableProvider {
    /// Creates a provider reading from `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the variables file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl VariableProvider for JsonFileVariableProvider {
    async fn current_variables(&self) -> Result<Option<Vec<Variable>>, ProviderError> {
        let content = match fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "variables file not found");
                return Ok(None);
            }
            Err(e) => return Err(ProviderError::Io(e)),
        };

        let variables: Vec<Variable> = from_json_bytes(&content)
            .map_err(|e| ProviderError::Serialization(e.to_string()))?;
        debug!(path = %self.path.display(), count = variables.len(), "variables loaded");
        Ok(Some(variables))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reads_variables() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("variables.json");
        std::fs::write(
            &path,
            r#"[
                {"name": "host", "value": "localhost"},
                {"variable": "token", "value": "abc", "enabled": false}
            ]"#,
        )
        .unwrap();

        let provider = JsonFileVariableProvider::new(&path);
        let variables = provider.current_variables().await.unwrap().unwrap();
        assert_eq!(
            variables,
            vec![
                Variable::new("host", "localhost"),
                Variable::disabled("token", "abc"),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_file_declines() {
        let dir = TempDir::new().unwrap();
        let provider = JsonFileVariableProvider::new(dir.path().join("nope.json"));
        assert!(provider.current_variables().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_json_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("variables.json");
        std::fs::write(&path, "{not json").unwrap();

        let provider = JsonFileVariableProvider::new(path);
        assert!(matches!(
            provider.current_variables().await,
            Err(ProviderError::Serialization(_))
        ));
    }
}
