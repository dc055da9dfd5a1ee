//! In-memory variable provider.

use async_trait::async_trait;
use tokio::sync::RwLock;
use vareval_application::ports::{ProviderError, VariableProvider};
use vareval_domain::Variable;

/// Serves variables held in memory.
///
/// The list can be swapped at runtime, e.g. when the active environment
/// changes. A provider holding `None` declines every request.
#[derive(Debug, Default)]
pub struct StaticVariableProvider {
    variables: RwLock<Option<Vec<Variable>>>,
}

impl StaticVariableProvider {
    /// Creates a provider serving `variables`.
    #[must_use]
    pub fn new(variables: Vec<Variable>) -> Self {
        Self {
            variables: RwLock::new(Some(variables)),
        }
    }

    /// Creates a provider with no active environment.
    #[must_use]
    pub fn declined() -> Self {
        Self::default()
    }

    /// Replaces the served variables. `None` makes the provider decline.
    pub async fn replace(&self, variables: Option<Vec<Variable>>) {
        *self.variables.write().await = variables;
    }
}

#[async_trait]
impl VariableProvider for StaticVariableProvider {
    async fn current_variables(&self) -> Result<Option<Vec<Variable>>, ProviderError> {
        Ok(self.variables.read().await.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_serves_variables() {
        let provider = StaticVariableProvider::new(vec![Variable::new("a", "1")]);
        let variables = provider.current_variables().await.unwrap().unwrap();
        assert_eq!(variables, vec![Variable::new("a", "1")]);
    }

    #[tokio::test]
    async fn test_declined_and_replaced() {
        let provider = StaticVariableProvider::declined();
        assert!(provider.current_variables().await.unwrap().is_none());

        provider.replace(Some(vec![Variable::new("b", "2")])).await;
        let variables = provider.current_variables().await.unwrap().unwrap();
        assert_eq!(variables.len(), 1);

        provider.replace(None).await;
        assert!(provider.current_variables().await.unwrap().is_none());
    }
}
