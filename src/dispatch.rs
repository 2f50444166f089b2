//! Delivery of inquiries to the storefront mailbox.
//!
//! A [`Dispatcher`] first posts the submission to an HTTP form relay. If the
//! relay cannot be reached or answers with anything other than a 2xx status,
//! the dispatcher builds a pre-filled `mailto:` link and hands it to the
//! user's mail client instead. The fallback is tried at most once per
//! submission.

use std::io;

use async_trait::async_trait;

use crate::domain::Submission;

/// Pre-filled mail-client links.
pub mod mailto;
mod relay;

pub use mailto::{MailtoLink, SystemMailClient};
pub use relay::FormRelay;

/// A submission ready to be handed to a delivery tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Subject line.
    pub subject: String,
    /// Address replies go to.
    pub reply_to: String,
    /// Named fields carried by the message.
    pub fields: Vec<(&'static str, String)>,
}

impl OutboundMessage {
    /// Prepares `submission` for delivery under `brand`.
    pub fn from_submission(submission: &impl Submission, brand: &str) -> Self {
        Self {
            subject: submission.subject(brand),
            reply_to: submission.reply_to().to_string(),
            fields: submission.relay_fields(),
        }
    }
}

/// Why a delivery tier could not deliver a message.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The relay answered, but not with a success status.
    #[error("relay responded with HTTP {status}")]
    Status {
        /// The HTTP status code received.
        status: u16,
    },

    /// The relay could not be reached.
    #[error("relay request failed")]
    Network(#[source] reqwest::Error),
}

/// A channel that delivers messages without user involvement.
#[async_trait]
pub trait DeliveryTier: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Delivers `message`.
    async fn deliver(&self, message: &OutboundMessage) -> Result<(), DeliveryError>;
}

/// Something that can open a `mailto:` URI for the user.
pub trait MailClient: Send + Sync {
    /// Opens `uri` in the user's mail client.
    ///
    /// # Errors
    ///
    /// Returns an error if no mail client could be launched.
    fn open(&self, uri: &str) -> io::Result<()>;
}

/// How a submission left the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The relay accepted the submission.
    Delivered,

    /// The relay failed and the user's mail client was opened with a
    /// pre-filled message. Whether the user sends it is outside our control.
    FallbackOpened {
        /// The `mailto:` URI that was opened.
        uri: String,
    },
}

/// Both delivery paths failed.
///
/// Carries the `mailto:` URI so the caller can show it to the user.
#[derive(Debug, thiserror::Error)]
#[error("could not open a mail client; send the message manually using {uri}")]
pub struct DispatchError {
    /// The fallback link that could not be opened.
    pub uri: String,
    #[source]
    source: io::Error,
}

/// Sends submissions through the relay, falling back to the mail client.
#[derive(Debug)]
pub struct Dispatcher<T, M> {
    primary: T,
    mail_client: M,
    mailbox: String,
    brand: String,
}

impl<T, M> Dispatcher<T, M>
where
    T: DeliveryTier,
    M: MailClient,
{
    /// Creates a dispatcher delivering to `mailbox` on behalf of `brand`.
    pub fn new(primary: T, mail_client: M, mailbox: impl Into<String>, brand: impl Into<String>) -> Self {
        Self {
            primary,
            mail_client,
            mailbox: mailbox.into(),
            brand: brand.into(),
        }
    }

    /// Delivers `submission`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the relay failed *and* the mail client could
    /// not be opened.
    #[tracing::instrument(skip_all, fields(tier = self.primary.name()))]
    pub async fn send<S>(&self, submission: &S) -> Result<DeliveryOutcome, DispatchError>
    where
        S: Submission + Sync,
    {
        let message = OutboundMessage::from_submission(submission, &self.brand);

        match self.primary.deliver(&message).await {
            Ok(()) => {
                tracing::info!("submission delivered");
                return Ok(DeliveryOutcome::Delivered);
            }
            Err(e) => tracing::warn!("delivery failed, falling back to mail client: {e}"),
        }

        let uri = self.fallback_link(submission).uri();
        match self.mail_client.open(&uri) {
            Ok(()) => Ok(DeliveryOutcome::FallbackOpened { uri }),
            Err(source) => Err(DispatchError { uri, source }),
        }
    }

    /// The `mailto:` link used when the relay fails.
    pub fn fallback_link(&self, submission: &impl Submission) -> MailtoLink {
        MailtoLink {
            to: self.mailbox.clone(),
            subject: submission.subject(&self.brand),
            body: submission.mail_body(&self.brand),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::{
        domain::{CurationForm, CurationRequest, InquiryForm, InquirySubmission},
        test_support::{StubResponse, StubServer},
    };

    #[derive(Debug, Default)]
    struct RecordingMailClient {
        opened: Mutex<Vec<String>>,
        broken: bool,
    }

    impl RecordingMailClient {
        fn opened(&self) -> Vec<String> {
            self.opened.lock().unwrap().clone()
        }
    }

    impl MailClient for &RecordingMailClient {
        fn open(&self, uri: &str) -> io::Result<()> {
            self.opened.lock().unwrap().push(uri.to_string());
            if self.broken {
                Err(io::Error::new(io::ErrorKind::NotFound, "no mail client"))
            } else {
                Ok(())
            }
        }
    }

    fn corporate_inquiry() -> InquirySubmission {
        InquirySubmission::try_from(InquiryForm {
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            phone: "1".to_string(),
            company: String::new(),
            inquiry_type: "Corporate Gifts".to_string(),
            budget: String::new(),
            message: String::new(),
        })
        .unwrap()
    }

    fn relay_for(server: &StubServer) -> FormRelay {
        FormRelay::new(server.url("/relay"), None)
    }

    #[tokio::test]
    async fn relay_success_is_delivered_without_fallback() {
        let server = StubServer::start(|_| StubResponse::ok("{}"));
        let mail = RecordingMailClient::default();
        let dispatcher = Dispatcher::new(relay_for(&server), &mail, "shop@example.com", "Saavi");

        let outcome = dispatcher.send(&corporate_inquiry()).await.unwrap();

        assert_eq!(outcome, DeliveryOutcome::Delivered);
        assert!(mail.opened().is_empty());

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        let body = requests[0].body_text();
        assert!(body.contains("Sales Inquiry - Saavi"));
        assert!(body.contains("name=\"_replyto\""));
        assert!(body.contains("a@x.com"));
        assert!(body.contains("Corporate Gifts"));
    }

    #[tokio::test]
    async fn relay_failure_opens_mail_client_once() {
        let server = StubServer::start(|_| StubResponse::status(500, "boom"));
        let mail = RecordingMailClient::default();
        let dispatcher = Dispatcher::new(relay_for(&server), &mail, "shop@example.com", "Saavi");

        let outcome = dispatcher.send(&corporate_inquiry()).await.unwrap();

        let opened = mail.opened();
        assert_eq!(opened.len(), 1);
        assert_eq!(
            outcome,
            DeliveryOutcome::FallbackOpened {
                uri: opened[0].clone()
            }
        );

        let uri = &opened[0];
        assert!(uri.starts_with("mailto:shop@example.com?subject=Sales%20Inquiry%20-%20Saavi&body="));
        let body = mailto::decode_component(uri.split("&body=").nth(1).unwrap());
        assert!(body.contains("Inquiry Type: Corporate Gifts"));
        assert!(body.contains("a@x.com"));
    }

    #[tokio::test]
    async fn unreachable_relay_falls_back() {
        let url = StubServer::unreachable_url();
        let mail = RecordingMailClient::default();
        let dispatcher = Dispatcher::new(FormRelay::new(url, None), &mail, "shop@example.com", "Saavi");

        let outcome = dispatcher.send(&corporate_inquiry()).await.unwrap();

        assert!(matches!(outcome, DeliveryOutcome::FallbackOpened { .. }));
        assert_eq!(mail.opened().len(), 1);
    }

    #[tokio::test]
    async fn failing_mail_client_surfaces_the_link() {
        let server = StubServer::start(|_| StubResponse::status(503, ""));
        let mail = RecordingMailClient {
            broken: true,
            ..RecordingMailClient::default()
        };
        let dispatcher = Dispatcher::new(relay_for(&server), &mail, "shop@example.com", "Saavi");

        let error = dispatcher.send(&corporate_inquiry()).await.unwrap_err();

        assert!(error.uri.starts_with("mailto:shop@example.com?"));
        assert_eq!(mail.opened().len(), 1);
    }

    #[tokio::test]
    async fn curation_request_uses_its_own_subject() {
        let server = StubServer::start(|_| StubResponse::status(404, ""));
        let mail = RecordingMailClient::default();
        let dispatcher = Dispatcher::new(relay_for(&server), &mail, "shop@example.com", "Saavi");
        let request = CurationRequest::try_from(CurationForm {
            occasion: "Wedding".to_string(),
            budget: "₹10,000 - ₹25,000".to_string(),
            recipient: "Bride and groom".to_string(),
            email: "b@y.com".to_string(),
            ..CurationForm::default()
        })
        .unwrap();

        dispatcher.send(&request).await.unwrap();

        let uri = &mail.opened()[0];
        assert!(uri.contains("subject=Gift%20Curation%20Request%20-%20Saavi"));
    }
}
