use async_trait::async_trait;
use reqwest::multipart::Form;

use crate::dispatch::{DeliveryError, DeliveryTier, OutboundMessage};

/// Posts messages to a hosted form-to-email relay.
///
/// The relay reads the `_subject`, `_replyto` and `_next` control fields;
/// everything else is forwarded to the mailbox as-is.
#[derive(Debug, Clone)]
pub struct FormRelay {
    client: reqwest::Client,
    endpoint: String,
    next: Option<String>,
}

impl FormRelay {
    /// A relay posting to `endpoint`, redirecting senders to `next` afterwards.
    pub fn new(endpoint: impl Into<String>, next: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            next,
        }
    }

    fn form(&self, message: &OutboundMessage) -> Form {
        let mut form = message
            .fields
            .iter()
            .fold(Form::new(), |form, (name, value)| form.text(*name, value.clone()))
            .text("_subject", message.subject.clone())
            .text("_replyto", message.reply_to.clone());
        if let Some(next) = &self.next {
            form = form.text("_next", next.clone());
        }
        form
    }
}

#[async_trait]
impl DeliveryTier for FormRelay {
    fn name(&self) -> &str {
        "form-relay"
    }

    async fn deliver(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.endpoint)
            .multipart(self.form(message))
            .send()
            .await
            .map_err(DeliveryError::Network)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(DeliveryError::Status {
                status: status.as_u16(),
            })
        }
    }
}
