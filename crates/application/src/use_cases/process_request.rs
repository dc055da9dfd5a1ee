//! Before-request processing use case.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;
use vareval_domain::{OverrideMap, RequestField, RequestRecord};

use crate::error::ApplicationResult;
use crate::variable_resolver::VariablesEvaluator;

/// Input for processing a request before it is dispatched.
#[derive(Debug, Clone, Default)]
pub struct ProcessRequestInput {
    /// The request to resolve.
    pub request: RequestRecord,
    /// Overrides for this request. Defaults to `request.config.variables`.
    pub overrides: Option<OverrideMap>,
}

/// Output from processing a request.
#[derive(Debug, Clone)]
pub struct ProcessRequestOutput {
    /// The request with every present field resolved.
    pub request: RequestRecord,
    /// Fields that were evaluated, in processing order.
    pub resolved_fields: Vec<RequestField>,
    /// True when processing is disabled in the settings and the request was
    /// returned untouched.
    pub skipped: bool,
}

/// Resolves the URL, method, headers and payload of a request with one
/// context built for the request.
pub struct ProcessRequest {
    session: Arc<Mutex<VariablesEvaluator>>,
}

impl ProcessRequest {
    /// Creates a new `ProcessRequest` use case over a shared session.
    #[must_use]
    pub const fn new(session: Arc<Mutex<VariablesEvaluator>>) -> Self {
        Self { session }
    }

    /// Executes the use case.
    ///
    /// Resets the session, builds a context once and evaluates each present,
    /// non-empty field against it. Absent fields stay absent.
    ///
    /// # Errors
    /// Returns the first error raised while building the context or
    /// evaluating a field. The request is not partially returned.
    pub async fn execute(&self, input: ProcessRequestInput) -> ApplicationResult<ProcessRequestOutput> {
        let mut session = self.session.lock().await;
        if session.settings().skip_before_request {
            debug!("before-request processing disabled");
            return Ok(ProcessRequestOutput {
                request: input.request,
                resolved_fields: Vec::new(),
                skipped: true,
            });
        }

        let mut request = input.request;
        let overrides = input
            .overrides
            .or_else(|| request.config_variables().cloned());

        session.reset();
        let context = session.build_context(overrides.as_ref()).await?;

        let mut resolved_fields = Vec::new();
        for field in RequestField::ALL {
            let slot = match field {
                RequestField::Url => &mut request.url,
                RequestField::Method => &mut request.method,
                RequestField::Headers => &mut request.headers,
                RequestField::Payload => {
                    let Some(payload) = request.payload.clone().filter(|p| !p.is_empty()) else {
                        continue;
                    };
                    let resolved = session
                        .evaluate_variable(payload, Some(&context), None)
                        .await?;
                    request.payload = Some(resolved);
                    resolved_fields.push(field);
                    continue;
                }
            };
            let Some(value) = slot.as_deref().filter(|v| !v.is_empty()) else {
                continue;
            };
            let resolved = session.evaluate_with_context(&context, value).await?;
            *slot = Some(resolved);
            resolved_fields.push(field);
        }
        debug!(fields = resolved_fields.len(), "request processed");

        Ok(ProcessRequestOutput {
            request,
            resolved_fields,
            skipped: false,
        })
    }
}
