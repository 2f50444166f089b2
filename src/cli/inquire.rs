use std::path::PathBuf;

use giftdesk::{
    DeliveryOutcome, Dispatcher, Submission,
    dispatch::{FormRelay, SystemMailClient},
    domain::{CurationForm, CurationRequest, InquiryForm, InquirySubmission},
};
use tracing::instrument;

use super::{
    Workspace,
    terminal::{Colorize, spinner},
};

#[derive(Debug, clap::Parser)]
pub struct Inquire {
    /// Your full name
    #[arg(long)]
    name: Option<String>,

    /// Your email address
    #[arg(long)]
    email: Option<String>,

    /// Your phone number
    #[arg(long)]
    phone: Option<String>,

    /// Company name
    #[arg(long)]
    company: Option<String>,

    /// Personal Gifts, Corporate Gifts, Bulk Orders, Customization, Partnership or Other
    #[arg(long = "type", value_name = "TYPE")]
    inquiry_type: Option<String>,

    /// Budget range, e.g. "₹5,000 - ₹10,000"
    #[arg(long)]
    budget: Option<String>,

    /// Anything else we should know
    #[arg(long)]
    message: Option<String>,
}

impl Inquire {
    #[instrument(skip(self))]
    pub async fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let workspace = Workspace::open(root)?;
        let submission = InquirySubmission::try_from(InquiryForm {
            name: self.name.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            phone: self.phone.unwrap_or_default(),
            company: self.company.unwrap_or_default(),
            inquiry_type: self.inquiry_type.unwrap_or_default(),
            budget: self.budget.unwrap_or_default(),
            message: self.message.unwrap_or_default(),
        })?;
        send(&workspace, &submission).await
    }
}

#[derive(Debug, clap::Parser)]
pub struct Curate {
    /// The occasion
    #[arg(long)]
    occasion: Option<String>,

    /// Budget range
    #[arg(long)]
    budget: Option<String>,

    /// Who the gift is for
    #[arg(long)]
    recipient: Option<String>,

    /// Interests, style or colours the recipient likes
    #[arg(long)]
    preferences: Option<String>,

    /// Special requirements, e.g. a personalised message
    #[arg(long)]
    custom_message: Option<String>,

    /// Your email address
    #[arg(long)]
    email: Option<String>,

    /// Contact number
    #[arg(long)]
    contact_number: Option<String>,
}

impl Curate {
    #[instrument(skip(self))]
    pub async fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let workspace = Workspace::open(root)?;
        let request = CurationRequest::try_from(CurationForm {
            occasion: self.occasion.unwrap_or_default(),
            budget: self.budget.unwrap_or_default(),
            recipient: self.recipient.unwrap_or_default(),
            preferences: self.preferences.unwrap_or_default(),
            custom_message: self.custom_message.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            contact_number: self.contact_number.unwrap_or_default(),
        })?;
        send(&workspace, &request).await
    }
}

async fn send<S: Submission + Sync>(workspace: &Workspace, submission: &S) -> anyhow::Result<()> {
    let config = workspace.config();
    let dispatcher = Dispatcher::new(
        FormRelay::new(
            config.mail.relay_endpoint.clone(),
            config.mail.thank_you_url.clone(),
        ),
        SystemMailClient,
        config.mail.mailbox.clone(),
        config.brand(),
    );

    let progress = spinner("Sending");
    let outcome = dispatcher.send(submission).await;
    progress.finish_and_clear();

    match outcome? {
        DeliveryOutcome::Delivered => println!(
            "{}",
            "✅ Thank you! We will get back to you within 24 hours.".success()
        ),
        DeliveryOutcome::FallbackOpened { .. } => println!(
            "{}",
            "Your mail client has been opened with the message filled in. Please send it from there."
                .info()
        ),
    }
    Ok(())
}
