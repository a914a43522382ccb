//! Redaction: return the object with interesting PII masked

use std::sync::Arc;
use std::time::{Duration, Instant};

use piiguard_core::within_deadline;
use piiguard_domain::Result;
use tracing::{debug, info, instrument};

use super::{
    budget_until, ensure_routable, finish, response_headers, HandledResponse, HandlerContext,
    ObjectRequest, Progress,
};
use crate::config::InvocationOptions;

pub struct RedactionHandler {
    context: Arc<HandlerContext>,
}

impl RedactionHandler {
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
        info!("received redaction request");
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
        debug!(
            entity_types = ?options.classification().pii_entity_types(),
            mask_mode = %options.redaction.mask_mode(),
            "resolved redaction options"
        );

        let document = self
            .context
            .source()
            .download(&request.input_url, &request.partial_object_headers())
            .await?;

        let pipeline = self.context.pipeline()?;
        let redaction = options.redaction.clone();
        let language = options.language_code.clone();
        let text = document.text;
        let redacted = within_deadline(budget_until(deadline), async move {
            pipeline.redact(&text, &redaction, &language).await
        })
        .await?;
        progress.processed = true;
        progress.pii_types =
            options.classification().interested_types(&redacted.pii_classification).into_iter().collect();

        debug!(
            entities = redacted.pii_entities.len(),
            interested = progress.pii_types.len(),
            "redaction complete"
        );
        let body = redacted.text.into_bytes();
        let headers = response_headers(&document.headers, body.len());
        self.context
            .responder()
            .respond_with_data(&request.target(), body, &headers, document.status_code)
            .await?;
        Ok(document.status_code)
    }
}
