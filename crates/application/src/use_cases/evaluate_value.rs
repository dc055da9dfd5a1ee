//! On-demand evaluation use case.

use std::sync::Arc;

use tokio::sync::Mutex;
use vareval_domain::{Context, OverrideMap, Value};

use crate::error::ApplicationResult;
use crate::variable_resolver::VariablesEvaluator;

/// Input for evaluating a single value on demand.
#[derive(Debug, Clone)]
pub struct EvaluateValueInput {
    /// Raw value to evaluate.
    pub value: Value,
    /// Context to evaluate against. The current variables are used when
    /// absent.
    pub context: Option<Context>,
    /// Values replacing or extending the variables for this evaluation.
    pub overrides: Option<OverrideMap>,
}

impl EvaluateValueInput {
    /// Input for a text value with no context and no overrides.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: Value::Text(value.into()),
            context: None,
            overrides: None,
        }
    }
}

/// Evaluates one value in a fresh resolution lifetime.
///
/// The session is reset first, so the current variables are read again and
/// grouped `now()`/`random()` values start over.
pub struct EvaluateValue {
    session: Arc<Mutex<VariablesEvaluator>>,
}

impl EvaluateValue {
    /// Creates a new `EvaluateValue` use case over a shared session.
    #[must_use]
    pub const fn new(session: Arc<Mutex<VariablesEvaluator>>) -> Self {
        Self { session }
    }

    /// Executes the use case.
    ///
    /// # Errors
    /// Returns preprocessing, provider and evaluator errors.
    pub async fn execute(&self, input: EvaluateValueInput) -> ApplicationResult<Value> {
        let mut session = self.session.lock().await;
        session.reset();
        session
            .evaluate_variable(input.value, input.context.as_ref(), input.overrides.as_ref())
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::ports::{Clock, ExpressionEvaluator, VariableProvider};
    use crate::variable_resolver::engine::tests::{Concat, FixedClock, RecordingProvider};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::Ordering;
    use vareval_domain::Variable;

    fn use_case(provider: Arc<RecordingProvider>) -> EvaluateValue {
        let provider: Arc<dyn VariableProvider> = provider;
        let evaluator: Arc<dyn ExpressionEvaluator> = Arc::new(Concat);
        let clock: Arc<dyn Clock> = Arc::new(FixedClock);
        EvaluateValue::new(Arc::new(Mutex::new(VariablesEvaluator::new(
            provider, evaluator, clock,
        ))))
    }

    #[tokio::test]
    async fn test_each_evaluation_reads_variables_again() {
        let provider = Arc::new(RecordingProvider::with(vec![Variable::new("a", "1")]));
        let use_case = use_case(provider.clone());
        let first = use_case.execute(EvaluateValueInput::text("${a}")).await.unwrap();
        let second = use_case.execute(EvaluateValueInput::text("${a}")).await.unwrap();
        assert_eq!(first, Value::from("1"));
        assert_eq!(second, Value::from("1"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_overrides_apply() {
        let provider = Arc::new(RecordingProvider::with(vec![Variable::new("a", "1")]));
        let use_case = use_case(provider);
        let input = EvaluateValueInput {
            overrides: Some([("a".to_string(), "2".to_string())].into_iter().collect()),
            ..EvaluateValueInput::text("${a}-${b}")
        };
        let result = use_case.execute(input).await.unwrap();
        assert_eq!(result, Value::from("2-"));
    }

    #[tokio::test]
    async fn test_explicit_context_skips_provider() {
        let provider = Arc::new(RecordingProvider::with(vec![Variable::new("a", "1")]));
        let use_case = use_case(provider.clone());
        let input = EvaluateValueInput {
            context: Some([("a", "ctx")].into_iter().collect()),
            ..EvaluateValueInput::text("${a}")
        };
        let result = use_case.execute(input).await.unwrap();
        assert_eq!(result, Value::from("ctx"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }
}
