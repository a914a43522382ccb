//! Access control: deny documents that contain interesting PII

use std::sync::Arc;
use std::time::{Duration, Instant};

use piiguard_core::within_deadline;
use piiguard_domain::{PiiGuardError, Result};
use tracing::{debug, info, instrument};

use super::{
    budget_until, ensure_routable, finish, response_headers, HandledResponse, HandlerContext,
    ObjectRequest, Progress,
};
use crate::config::InvocationOptions;

/// Returns the object unchanged unless it contains interesting PII, in which
/// case the caller gets `403 AccessDenied`
pub struct AccessControlHandler {
    context: Arc<HandlerContext>,
}

impl AccessControlHandler {
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }

    /// Handle one request with `remaining` time left in the invocation
    ///
    /// # Errors
    /// Only if no response could be delivered: the request has no routing
    /// information or the response sink failed.
    #[instrument(skip_all, fields(request_id = %request.request_id))]
    pub async fn handle(&self, request: &ObjectRequest, remaining: Duration) -> Result<HandledResponse> {
        info!("received access control request");
        ensure_routable(request)?;
        let deadline = Instant::now() + remaining;

        let mut progress = Progress::new(&self.context.config().default_language_code);
        let outcome = self.process(request, deadline, &mut progress).await;
        finish(&self.context, request, outcome, &progress).await
    }

    async fn process(
        &self,
        request: &ObjectRequest,
        deadline: Instant,
        progress: &mut Progress,
    ) -> Result<u16> {
        let config = self.context.config();
        request.validate(config.partial_object_supported)?;

        let options = InvocationOptions::parse(&request.payload)?
            .resolve(&config.pii_defaults, &config.default_language_code)?;
        progress.language = options.language_code.clone();
        debug!(entity_types = ?options.classification().pii_entity_types(), "resolved access control options");

        let document = self
            .context
            .source()
            .download(&request.input_url, &request.partial_object_headers())
            .await?;

        let pipeline = self.context.pipeline()?;
        let classification = options.classification().clone();
        let language = options.language_code;
        let text = document.text;
        let (found, text) = within_deadline(budget_until(deadline), async move {
            let found = pipeline.classify(&text, &classification, &language).await?;
            Ok((found, text))
        })
        .await?;
        progress.processed = true;

        if !found.is_empty() {
            progress.pii_types = found.clone();
            return Err(PiiGuardError::AccessRestricted { entity_types: found.into_iter().collect() });
        }

        let body = text.into_bytes();
        let headers = response_headers(&document.headers, body.len());
        self.context
            .responder()
            .respond_with_data(&request.target(), body, &headers, document.status_code)
            .await?;
        Ok(document.status_code)
    }
}
