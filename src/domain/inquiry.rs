//! Contact and curation inquiries.
//!
//! Inquiries are value objects: they are validated, rendered for delivery,
//! and never stored.

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;

use crate::domain::validation::ValidationErrors;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+$").expect("static pattern is valid"));

/// Budget brackets offered by the contact form.
pub const BUDGET_BRACKETS: &[&str] = &[
    "₹1,000 - ₹2,500",
    "₹2,500 - ₹5,000",
    "₹5,000 - ₹10,000",
    "₹10,000 - ₹25,000",
    "₹25,000+",
    "Custom Quote",
];

const NOT_SPECIFIED: &str = "Not specified";
const NO_MESSAGE: &str = "No additional message";

/// Something that can be delivered by the submission dispatcher.
///
/// Implementors describe themselves in the two shapes the dispatcher needs:
/// form fields for an HTTP relay, and a plain-text body for a mail client.
pub trait Submission {
    /// Subject line for the delivered message.
    fn subject(&self, brand: &str) -> String;

    /// Address replies should go to.
    fn reply_to(&self) -> &str;

    /// Field name/value pairs posted to the form relay.
    fn relay_fields(&self) -> Vec<(&'static str, String)>;

    /// Plain-text message body for the mail-client fallback.
    fn mail_body(&self, brand: &str) -> String;
}

/// Classification of a contact inquiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InquiryType {
    /// Personal Gifts
    PersonalGifts,
    /// Corporate Gifts
    CorporateGifts,
    /// Bulk Orders
    BulkOrders,
    /// Customization
    Customization,
    /// Partnership
    Partnership,
    /// Other
    Other,
}

impl InquiryType {
    /// Every inquiry type, in the order the form lists them.
    pub const ALL: [Self; 6] = [
        Self::PersonalGifts,
        Self::CorporateGifts,
        Self::BulkOrders,
        Self::Customization,
        Self::Partnership,
        Self::Other,
    ];

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PersonalGifts => "Personal Gifts",
            Self::CorporateGifts => "Corporate Gifts",
            Self::BulkOrders => "Bulk Orders",
            Self::Customization => "Customization",
            Self::Partnership => "Partnership",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for InquiryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for InquiryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("'{s}' is not an inquiry type"))
    }
}

/// Raw contact form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InquiryForm {
    /// Full name (required).
    pub name: String,
    /// Email address (required).
    pub email: String,
    /// Phone number (required).
    pub phone: String,
    /// Company.
    pub company: String,
    /// Inquiry type label (required).
    pub inquiry_type: String,
    /// Budget bracket.
    pub budget: String,
    /// Free-text message.
    pub message: String,
}

/// A validated contact form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InquirySubmission {
    /// Full name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Phone number.
    pub phone: String,
    /// Company, if given.
    pub company: Option<String>,
    /// Classification.
    pub inquiry_type: InquiryType,
    /// Budget bracket, if given.
    pub budget: Option<String>,
    /// Message, if given.
    pub message: Option<String>,
}

impl TryFrom<InquiryForm> for InquirySubmission {
    type Error = ValidationErrors;

    fn try_from(form: InquiryForm) -> Result<Self, Self::Error> {
        let mut errors = ValidationErrors::default();

        let name = form.name.trim().to_string();
        if name.is_empty() {
            errors.push("name", "Full name is required");
        }

        let email = form.email.trim().to_string();
        check_email(&email, &mut errors);

        let phone = form.phone.trim().to_string();
        if phone.is_empty() {
            errors.push("phone", "Phone number is required");
        }

        let inquiry_type = if form.inquiry_type.trim().is_empty() {
            errors.push("inquiryType", "Please select inquiry type");
            None
        } else {
            form.inquiry_type
                .parse::<InquiryType>()
                .map_err(|message| errors.push("inquiryType", message))
                .ok()
        };

        let Some(inquiry_type) = inquiry_type else {
            return Err(errors);
        };
        errors.into_result(|| Self {
            name,
            email,
            phone,
            company: optional(&form.company),
            inquiry_type,
            budget: optional(&form.budget),
            message: optional(&form.message),
        })
    }
}

impl Submission for InquirySubmission {
    fn subject(&self, brand: &str) -> String {
        format!("Sales Inquiry - {brand}")
    }

    fn reply_to(&self) -> &str {
        &self.email
    }

    fn relay_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("name", self.name.clone()),
            ("email", self.email.clone()),
            ("phone", self.phone.clone()),
            ("company", or_default(self.company.as_deref(), NOT_SPECIFIED)),
            ("inquiry_type", self.inquiry_type.label().to_string()),
            ("budget_range", or_default(self.budget.as_deref(), NOT_SPECIFIED)),
            ("message", or_default(self.message.as_deref(), NO_MESSAGE)),
        ]
    }

    fn mail_body(&self, brand: &str) -> String {
        format!(
            "Hi {brand} Team,\n\nI'm interested in your products/services. Here are my \
             details:\n\nName: {name}\nEmail: {email}\nPhone: {phone}\nCompany: \
             {company}\nInquiry Type: {kind}\nBudget Range: {budget}\nMessage: \
             {message}\n\nPlease get back to me with more information.\n\nBest \
             regards,\n{name}",
            name = self.name,
            email = self.email,
            phone = self.phone,
            company = or_default(self.company.as_deref(), "N/A"),
            kind = self.inquiry_type,
            budget = or_default(self.budget.as_deref(), NOT_SPECIFIED),
            message = or_default(self.message.as_deref(), NO_MESSAGE),
        )
    }
}

/// Raw gift curation form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurationForm {
    /// Occasion (required).
    pub occasion: String,
    /// Budget bracket (required).
    pub budget: String,
    /// Who the gift is for (required).
    pub recipient: String,
    /// Preferences.
    pub preferences: String,
    /// Special requirements.
    pub custom_message: String,
    /// Email address (required).
    pub email: String,
    /// Contact number.
    pub contact_number: String,
}

/// A validated request for help choosing a gift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurationRequest {
    /// Occasion.
    pub occasion: String,
    /// Budget bracket.
    pub budget: String,
    /// Recipient type.
    pub recipient: String,
    /// Preferences.
    pub preferences: String,
    /// Special requirements.
    pub custom_message: String,
    /// Email address.
    pub email: String,
    /// Contact number, if given.
    pub contact_number: Option<String>,
}

impl TryFrom<CurationForm> for CurationRequest {
    type Error = ValidationErrors;

    fn try_from(form: CurationForm) -> Result<Self, Self::Error> {
        let mut errors = ValidationErrors::default();

        for (field, value) in [
            ("occasion", &form.occasion),
            ("budget", &form.budget),
            ("recipient", &form.recipient),
        ] {
            if value.trim().is_empty() {
                errors.push(field, format!("{field} is required"));
            }
        }

        let email = form.email.trim().to_string();
        check_email(&email, &mut errors);

        errors.into_result(|| Self {
            occasion: form.occasion.trim().to_string(),
            budget: form.budget.trim().to_string(),
            recipient: form.recipient.trim().to_string(),
            preferences: form.preferences.trim().to_string(),
            custom_message: form.custom_message.trim().to_string(),
            email,
            contact_number: optional(&form.contact_number),
        })
    }
}

impl Submission for CurationRequest {
    fn subject(&self, brand: &str) -> String {
        format!("Gift Curation Request - {brand}")
    }

    fn reply_to(&self) -> &str {
        &self.email
    }

    fn relay_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("occasion", self.occasion.clone()),
            ("budget", self.budget.clone()),
            ("recipient", self.recipient.clone()),
            ("preferences", self.preferences.clone()),
            ("custom_message", self.custom_message.clone()),
            ("email", self.email.clone()),
            (
                "contact_number",
                self.contact_number.clone().unwrap_or_default(),
            ),
        ]
    }

    fn mail_body(&self, brand: &str) -> String {
        format!(
            "Hi {brand} Team,\n\nI'm interested in getting help with gift curation. Here are \
             my details:\n\nOccasion: {occasion}\nBudget Range: {budget}\nRecipient: \
             {recipient}\nPreferences: {preferences}\nSpecial Requirements: {custom}\nEmail: \
             {email}\nContact Number: {contact}\n\nPlease get back to me with personalized \
             recommendations.\n\nBest regards,\n{email}",
            occasion = self.occasion,
            budget = self.budget,
            recipient = self.recipient,
            preferences = self.preferences,
            custom = self.custom_message,
            email = self.email,
            contact = or_default(self.contact_number.as_deref(), "Not provided"),
        )
    }
}

fn check_email(email: &str, errors: &mut ValidationErrors) {
    if email.is_empty() {
        errors.push("email", "Email is required");
    } else if !EMAIL.is_match(email) {
        errors.push("email", "Please enter a valid email");
    }
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn or_default(value: Option<&str>, default: &str) -> String {
    value.unwrap_or(default).to_string()
}
