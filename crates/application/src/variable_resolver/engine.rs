//! Variable evaluation engine
//!
//! Builds the evaluation context from the provider's variables and resolves
//! values against it. One `VariablesEvaluator` is one session: it owns the
//! grouped cache and the last built context until `reset` is called.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, instrument, warn};
use uuid::Uuid;
use vareval_domain::{
    Context, EvaluatorSettings, OverrideMap, Value, Variable, needs_evaluation,
    override_variables,
};

use super::cache::GroupedCache;
use super::functions::FunctionDispatcher;
use super::legacy;
use super::translator::{Translation, translate};
use crate::error::ApplicationResult;
use crate::ports::{Clock, ExpressionEvaluator, VariableProvider};

/// Resolves `${...}` expressions in values using the current variables.
pub struct VariablesEvaluator {
    id: Uuid,
    provider: Arc<dyn VariableProvider>,
    evaluator: Arc<dyn ExpressionEvaluator>,
    clock: Arc<dyn Clock>,
    settings: EvaluatorSettings,
    cache: GroupedCache,
    context: Option<Context>,
}

impl std::fmt::Debug for VariablesEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariablesEvaluator")
            .field("id", &self.id)
            .field("settings", &self.settings)
            .field("cached_groups", &self.cache.len())
            .field("has_context", &self.context.is_some())
            .finish_non_exhaustive()
    }
}

impl VariablesEvaluator {
    /// Creates an evaluator with default settings.
    #[must_use]
    pub fn new(
        provider: Arc<dyn VariableProvider>,
        evaluator: Arc<dyn ExpressionEvaluator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::with_settings(provider, evaluator, clock, EvaluatorSettings::default())
    }

    /// Creates an evaluator with explicit settings.
    #[must_use]
    pub fn with_settings(
        provider: Arc<dyn VariableProvider>,
        evaluator: Arc<dyn ExpressionEvaluator>,
        clock: Arc<dyn Clock>,
        settings: EvaluatorSettings,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider,
            evaluator,
            clock,
            settings,
            cache: GroupedCache::new(),
            context: None,
        }
    }

    /// Session id, recorded on every tracing span of this evaluator.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Current settings.
    #[must_use]
    pub const fn settings(&self) -> &EvaluatorSettings {
        &self.settings
    }

    /// The context cached by the last `build_context`, if any.
    #[must_use]
    pub const fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    /// Ends the resolution lifetime: drops the cached context and the
    /// grouped function values.
    pub fn reset(&mut self) {
        self.context = None;
        self.cache.clear();
    }

    /// Drops grouped `now()`/`random()` values only.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Builds the evaluation context from the provider's enabled variables,
    /// with `overrides` applied, and caches it on the session.
    ///
    /// # Errors
    /// Returns provider errors and any error raised while resolving a
    /// variable that references others.
    #[instrument(skip_all, fields(session = %self.id))]
    pub async fn build_context(
        &mut self,
        overrides: Option<&OverrideMap>,
    ) -> ApplicationResult<Context> {
        let variables = match self.provider.current_variables().await? {
            Some(variables) => variables,
            None => {
                debug!("variable provider declined, using an empty context");
                Vec::new()
            }
        };

        let mut variables: Vec<Variable> = variables.into_iter().filter(|v| v.enabled).collect();
        if let Some(overrides) = overrides {
            variables = override_variables(variables, overrides);
        }

        let context = self.process_context_variables(variables).await?;
        self.context = Some(context.clone());
        Ok(context)
    }

    /// Places every variable in a fresh context, then repeatedly resolves
    /// the ones that still contain `${` against it.
    ///
    /// Variables are evaluated in declaration order. Values still unresolved
    /// after the pass limit are kept as they are.
    ///
    /// # Errors
    /// Fails on the first variable whose value cannot be evaluated.
    pub async fn process_context_variables(
        &mut self,
        variables: Vec<Variable>,
    ) -> ApplicationResult<Context> {
        let mut context = Context::new();
        let mut pending: Vec<Variable> = Vec::new();
        for variable in variables {
            context.insert(variable.name.clone(), variable.value.clone());
            if variable.needs_evaluation() {
                pending.push(variable);
            }
        }

        let limit = self.settings.pass_limit();
        let mut pass = 0;
        while !pending.is_empty() && pass < limit {
            pass += 1;
            debug!(pass, pending = pending.len(), "resolving variables");
            for variable in &mut pending {
                let value = self.evaluate_with_context(&context, &variable.value).await?;
                debug!(name = %variable.name, "variable evaluated");
                context.insert(variable.name.clone(), value.clone());
                variable.value = value;
            }
            pending.retain(Variable::needs_evaluation);
        }

        if !pending.is_empty() {
            warn!(
                passes = limit,
                unresolved = ?context.unresolved_names(),
                "pass limit reached, keeping unresolved values"
            );
        }
        Ok(context)
    }

    /// Evaluates a single value.
    ///
    /// `Null`, `Binary` and `Object` values are returned unchanged; booleans
    /// and numbers are evaluated in their string form. Without a `context`
    /// the session context is used, building it first if needed. With both a
    /// `context` and `overrides`, the overrides are merged into a copy of the
    /// context which is then resolved again.
    ///
    /// # Errors
    /// Returns preprocessing, provider and evaluator errors.
    #[instrument(skip_all, fields(session = %self.id))]
    pub async fn evaluate_variable(
        &mut self,
        value: Value,
        context: Option<&Context>,
        overrides: Option<&OverrideMap>,
    ) -> ApplicationResult<Value> {
        let Some(text) = value.to_text() else {
            return Ok(value);
        };

        let context = match (context, overrides) {
            (Some(context), Some(overrides)) => {
                let merged = context
                    .with_overrides(overrides)
                    .into_inner()
                    .into_iter()
                    .map(|(name, value)| Variable::new(name, value))
                    .collect();
                self.process_context_variables(merged).await?
            }
            (Some(context), None) => context.clone(),
            (None, overrides) => match self.context.clone() {
                Some(cached) => cached,
                None => self.build_context(overrides).await?,
            },
        };

        self.evaluate_with_context(&context, &text)
            .await
            .map(Value::Text)
    }

    /// Evaluates a text value against the session context.
    ///
    /// # Errors
    /// See [`Self::evaluate_variable`].
    pub async fn evaluate_text(&mut self, value: &str) -> ApplicationResult<String> {
        let context = match self.context.clone() {
            Some(cached) => cached,
            None => self.build_context(None).await?,
        };
        self.evaluate_with_context(&context, value).await
    }

    /// Evaluates `value` against `context`.
    ///
    /// Legacy markers are rewritten, function calls are replaced by their
    /// results, and what remains of `${...}` is handed to the expression
    /// evaluator. Multiline values are evaluated line by line.
    ///
    /// # Errors
    /// `Syntax` for an unterminated `${`, function errors from the dispatcher
    /// and evaluator failures.
    pub async fn evaluate_with_context(
        &mut self,
        context: &Context,
        value: &str,
    ) -> ApplicationResult<String> {
        if value.is_empty() {
            return Ok(String::new());
        }
        let upgraded = legacy::rewrite(value);
        let value = FunctionDispatcher::new(&mut self.cache, self.clock.as_ref())
            .with_context(context)
            .eval_functions(&upgraded)?;
        if !needs_evaluation(&value) {
            return Ok(value);
        }

        match translate(&value)? {
            Translation::Single(expression) => {
                Ok(self.evaluator.eval(&expression, context).await?)
            }
            Translation::Lines(expressions) => {
                let mut lines = Vec::with_capacity(expressions.len());
                for expression in &expressions {
                    lines.push(self.evaluator.eval(expression, context).await?);
                }
                Ok(lines.join("\n"))
            }
        }
    }

    /// Evaluates the values of `map` in place.
    ///
    /// Only the keys in `props` are evaluated when given, otherwise every
    /// key. Empty values and missing keys are skipped.
    ///
    /// # Errors
    /// Stops at the first value that fails to evaluate.
    pub async fn evaluate_variables(
        &mut self,
        map: &mut BTreeMap<String, String>,
        props: Option<&[&str]>,
    ) -> ApplicationResult<()> {
        let keys: Vec<String> = match props {
            Some(props) => props.iter().map(ToString::to_string).collect(),
            None => map.keys().cloned().collect(),
        };
        for key in keys {
            let Some(value) = map.get(&key).filter(|v| !v.is_empty()).cloned() else {
                continue;
            };
            let resolved = self.evaluate_text(&value).await?;
            map.insert(key, resolved);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ApplicationError;
    use crate::ports::{EvaluatorError, ProviderError};
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
        }
    }

    /// Serves a fixed variable list and counts requests.
    #[derive(Default)]
    pub(crate) struct RecordingProvider {
        variables: Option<Vec<Variable>>,
        pub(crate) calls: AtomicUsize,
    }

    impl RecordingProvider {
        pub(crate) fn with(variables: Vec<Variable>) -> Self {
            Self {
                variables: Some(variables),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl VariableProvider for RecordingProvider {
        async fn current_variables(&self) -> Result<Option<Vec<Variable>>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.variables.clone())
        }
    }

    /// Evaluates `'literal' + name + ...` expressions.
    pub(crate) struct Concat;

    #[async_trait]
    impl ExpressionEvaluator for Concat {
        async fn eval(&self, expression: &str, context: &Context) -> Result<String, EvaluatorError> {
            let mut out = String::new();
            let mut chars = expression.chars().peekable();
            while let Some(ch) = chars.next() {
                match ch {
                    '\'' => loop {
                        match chars.next() {
                            Some('\\') => out.extend(chars.next()),
                            Some('\'') => break,
                            Some(c) => out.push(c),
                            None => {
                                return Err(EvaluatorError::Parse {
                                    expression: expression.to_string(),
                                    reason: "unterminated literal".to_string(),
                                });
                            }
                        }
                    },
                    '+' | ' ' => {}
                    c => {
                        let mut name = String::from(c);
                        while let Some(&next) = chars.peek() {
                            if next == ' ' || next == '+' {
                                break;
                            }
                            name.push(next);
                            chars.next();
                        }
                        out.push_str(context.get(&name).unwrap_or_default());
                    }
                }
            }
            Ok(out)
        }
    }

    /// `Concat` that counts its calls.
    #[derive(Default)]
    struct CountingConcat {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ExpressionEvaluator for CountingConcat {
        async fn eval(&self, expression: &str, context: &Context) -> Result<String, EvaluatorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Concat.eval(expression, context).await
        }
    }

    pub(crate) fn evaluator(provider: RecordingProvider) -> VariablesEvaluator {
        VariablesEvaluator::new(Arc::new(provider), Arc::new(Concat), Arc::new(FixedClock))
    }

    fn sample_variables() -> Vec<Variable> {
        vec![
            Variable::new("test1", "value1"),
            Variable::new("test2", "value2 ${test1}"),
            Variable::new("test3", "value3 ${test4}"),
            Variable::new("test4", "value4"),
            Variable::new("test5", "value5"),
            Variable::disabled("test6", "value6"),
        ]
    }

    #[tokio::test]
    async fn test_context_resolves_references() {
        let mut engine = evaluator(RecordingProvider::with(sample_variables()));
        let context = engine.build_context(None).await.unwrap();
        assert_eq!(context.get("test1"), Some("value1"));
        assert_eq!(context.get("test2"), Some("value2 value1"));
        assert_eq!(context.get("test3"), Some("value3 value4"));
        assert_eq!(context.get("test5"), Some("value5"));
    }

    #[tokio::test]
    async fn test_disabled_variables_are_dropped() {
        let mut engine = evaluator(RecordingProvider::with(sample_variables()));
        let context = engine.build_context(None).await.unwrap();
        assert!(!context.contains("test6"));
        assert_eq!(context.len(), 5);
    }

    #[tokio::test]
    async fn test_declined_provider_gives_empty_context() {
        let mut engine = evaluator(RecordingProvider::default());
        let context = engine.build_context(None).await.unwrap();
        assert!(context.is_empty());
    }

    #[tokio::test]
    async fn test_override_replaces_and_appends() {
        let mut engine = evaluator(RecordingProvider::with(sample_variables()));
        let overrides: OverrideMap = [
            ("test1".to_string(), "other".to_string()),
            ("extra".to_string(), "x ${test5}".to_string()),
        ]
        .into_iter()
        .collect();
        let context = engine.build_context(Some(&overrides)).await.unwrap();
        assert_eq!(context.get("test1"), Some("other"));
        assert_eq!(context.get("test2"), Some("value2 other"));
        assert_eq!(context.get("extra"), Some("x value5"));
    }

    #[tokio::test]
    async fn test_circular_references_terminate() {
        let mut engine = evaluator(RecordingProvider::with(vec![
            Variable::new("a", "${b}"),
            Variable::new("b", "${a}"),
        ]));
        let context = engine.build_context(None).await.unwrap();
        assert!(needs_evaluation(context.get("a").unwrap()));
        assert!(needs_evaluation(context.get("b").unwrap()));
    }

    #[tokio::test]
    async fn test_default_settings_run_two_passes() {
        let variables = vec![
            Variable::new("a", "${b}"),
            Variable::new("b", "${c}"),
            Variable::new("c", "${d}"),
            Variable::new("d", "${e}"),
            Variable::new("e", "end"),
        ];
        let counter = Arc::new(CountingConcat::default());
        let mut engine = VariablesEvaluator::new(
            Arc::new(RecordingProvider::with(variables)),
            counter.clone(),
            Arc::new(FixedClock),
        );
        let context = engine.build_context(None).await.unwrap();

        // a third pass would have resolved a as well
        assert_eq!(context.get("a"), Some("${e}"));
        assert_eq!(context.get("b"), Some("end"));
        assert_eq!(context.get("c"), Some("end"));
        assert_eq!(context.get("d"), Some("end"));
        assert_eq!(context.unresolved_names(), vec!["a"]);
        // four pending values in the first pass, three in the second
        assert_eq!(counter.calls.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn test_pass_limit_is_configurable() {
        let variables = vec![
            Variable::new("a", "${b}"),
            Variable::new("b", "${c}"),
            Variable::new("c", "${d}"),
            Variable::new("d", "end"),
        ];
        let settings = EvaluatorSettings {
            max_passes: 1,
            ..EvaluatorSettings::default()
        };
        let mut engine = VariablesEvaluator::with_settings(
            Arc::new(RecordingProvider::with(variables)),
            Arc::new(Concat),
            Arc::new(FixedClock),
            settings,
        );
        let context = engine.build_context(None).await.unwrap();
        // a reads b before b is resolved in the single pass
        assert_eq!(context.get("a"), Some("${c}"));
        assert_eq!(context.get("c"), Some("end"));
    }

    #[tokio::test]
    async fn test_evaluate_variable_caches_context() {
        let provider = Arc::new(RecordingProvider::with(sample_variables()));
        let mut engine = VariablesEvaluator::new(provider.clone(), Arc::new(Concat), Arc::new(FixedClock));
        let first = engine
            .evaluate_variable(Value::from("${test2}"), None, None)
            .await
            .unwrap();
        let second = engine
            .evaluate_variable(Value::from("${test5}"), None, None)
            .await
            .unwrap();
        assert_eq!(first, Value::from("value2 value1"));
        assert_eq!(second, Value::from("value5"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        engine.reset();
        assert!(engine.context().is_none());
        engine
            .evaluate_variable(Value::from("${test5}"), None, None)
            .await
            .unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_scalars_are_stringified() {
        let mut engine = evaluator(RecordingProvider::default());
        let number = engine
            .evaluate_variable(Value::Number(2.0), None, None)
            .await
            .unwrap();
        let flag = engine
            .evaluate_variable(Value::Bool(false), None, None)
            .await
            .unwrap();
        assert_eq!(number, Value::from("2"));
        assert_eq!(flag, Value::from("false"));
    }

    #[tokio::test]
    async fn test_non_text_values_pass_through() {
        let mut engine = evaluator(RecordingProvider::default());
        let object = Value::Object(serde_json::json!({ "a": "${b}" }));
        for value in [Value::Null, Value::Binary(vec![1, 2, 3]), object] {
            let result = engine
                .evaluate_variable(value.clone(), None, None)
                .await
                .unwrap();
            assert_eq!(result, value);
        }
    }

    #[tokio::test]
    async fn test_context_with_override_is_merged() {
        let mut engine = evaluator(RecordingProvider::default());
        let context: Context = [("a", "1"), ("b", "${a}-b")].into_iter().collect();
        let overrides: OverrideMap = [("a".to_string(), "2".to_string())].into_iter().collect();
        let result = engine
            .evaluate_variable(Value::from("${b}"), Some(&context), Some(&overrides))
            .await
            .unwrap();
        assert_eq!(result, Value::from("2-b"));
        assert!(engine.context().is_none());
    }

    #[tokio::test]
    async fn test_plain_strings_are_unchanged() {
        let mut engine = evaluator(RecordingProvider::default());
        let context = Context::new();
        for value in ["test", "", "a $ b", "{}"] {
            assert_eq!(engine.evaluate_with_context(&context, value).await.unwrap(), value);
        }
    }

    #[tokio::test]
    async fn test_backslashes_are_preserved() {
        let mut engine = evaluator(RecordingProvider::default());
        let context: Context = [("v", "x")].into_iter().collect();
        let plain = engine
            .evaluate_with_context(&context, r"\\test\\")
            .await
            .unwrap();
        assert_eq!(plain, r"\\test\\");
        let mixed = engine
            .evaluate_with_context(&context, r"\\test\\ ${v} 'q'")
            .await
            .unwrap();
        assert_eq!(mixed, r"\\test\\ x 'q'");
    }

    #[tokio::test]
    async fn test_grouped_random_agrees_within_session() {
        let mut engine = evaluator(RecordingProvider::default());
        let context = Context::new();
        let result = engine
            .evaluate_with_context(&context, "${random(1)} ${random(2)} ${random(1)}")
            .await
            .unwrap();
        let items: Vec<&str> = result.split(' ').collect();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], items[2]);
        assert_ne!(items[0], items[1]);

        let again = engine
            .evaluate_with_context(&context, "${random:1}")
            .await
            .unwrap();
        assert_eq!(again, items[0]);
    }

    #[tokio::test]
    async fn test_legacy_now_uses_clock() {
        let mut engine = evaluator(RecordingProvider::default());
        let result = engine
            .evaluate_with_context(&Context::new(), "t=${now}")
            .await
            .unwrap();
        assert_eq!(result, "t=1700000000000");
    }

    #[tokio::test]
    async fn test_multiline_value() {
        let mut engine = evaluator(RecordingProvider::default());
        let context: Context = [("test1", "one"), ("test2", "two")].into_iter().collect();
        let value = "{\n\"v1\":\"${test1}\",\n\"v2\":\"${test2}\"\n}";
        let result = engine.evaluate_with_context(&context, value).await.unwrap();
        assert_eq!(result, "{\n\"v1\":\"one\",\n\"v2\":\"two\"\n}");
    }

    #[tokio::test]
    async fn test_functions_and_variables_together() {
        let mut engine = evaluator(RecordingProvider::default());
        let context: Context = [("n", "-5")].into_iter().collect();
        let result = engine
            .evaluate_with_context(&context, "Math.abs(${n}) and ${n}")
            .await
            .unwrap();
        assert_eq!(result, "5 and -5");
    }

    #[tokio::test]
    async fn test_errors_propagate() {
        let mut engine = evaluator(RecordingProvider::default());
        let context = Context::new();
        assert!(matches!(
            engine.evaluate_with_context(&context, "test ${val").await,
            Err(ApplicationError::Syntax(_))
        ));
        assert!(matches!(
            engine.evaluate_with_context(&context, "nope()").await,
            Err(ApplicationError::UnsupportedFunction(_))
        ));
    }

    #[tokio::test]
    async fn test_evaluate_variables_in_place() {
        let mut engine = evaluator(RecordingProvider::with(sample_variables()));
        let mut map: BTreeMap<String, String> = [
            ("a".to_string(), "${test1}".to_string()),
            ("b".to_string(), "${test5}".to_string()),
            ("c".to_string(), String::new()),
        ]
        .into_iter()
        .collect();
        engine.evaluate_variables(&mut map, Some(&["a", "c", "missing"])).await.unwrap();
        assert_eq!(map["a"], "value1");
        assert_eq!(map["b"], "${test5}");
        assert_eq!(map["c"], "");
        assert!(!map.contains_key("missing"));

        engine.evaluate_variables(&mut map, None).await.unwrap();
        assert_eq!(map["b"], "value5");
    }
}
