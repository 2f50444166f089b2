use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::GiftDraft;

/// The occasions a gift can be tagged with from the admin form.
pub const OCCASIONS: &[&str] = &[
    "Birthday",
    "Anniversary",
    "Wedding",
    "Diwali",
    "Holi",
    "Christmas",
    "New Year",
    "Valentine's Day",
    "Mother's Day",
    "Father's Day",
    "Graduation",
    "Housewarming",
    "Baby Shower",
    "Corporate Gifts",
];

/// Returns `true` if the occasion is part of the admin form vocabulary.
#[must_use]
pub fn is_listed_occasion(occasion: &str) -> bool {
    OCCASIONS.contains(&occasion)
}

/// Opaque identifier of a gift record.
///
/// New identifiers are the decimal number of milliseconds since the Unix
/// epoch at creation time. Identifiers read from a catalog file are kept
/// verbatim, whatever their shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GiftId(String);

impl GiftId {
    /// Builds an identifier from a millisecond timestamp.
    #[must_use]
    pub fn from_millis(millis: i64) -> Self {
        Self(millis.to_string())
    }

    /// Returns the millisecond timestamp encoded in the identifier, if any.
    #[must_use]
    pub fn millis(&self) -> Option<i64> {
        self.0.parse().ok()
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GiftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for GiftId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().to_string()))
    }
}

impl From<&str> for GiftId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Product category of a gift.
///
/// The admin form only offers the listed categories, but a catalog file
/// edited by hand may contain anything. Such values are preserved as
/// [`Category::Unlisted`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    /// Home Decor
    #[default]
    HomeDecor,
    /// Jewelry
    Jewelry,
    /// Textiles
    Textiles,
    /// Pottery
    Pottery,
    /// Wooden Crafts
    WoodenCrafts,
    /// Metalware
    Metalware,
    /// Paper Crafts
    PaperCrafts,
    /// Personal Care
    PersonalCare,
    /// Kitchen Items
    KitchenItems,
    /// Other
    Other,
    /// A category outside the form vocabulary.
    Unlisted(String),
}

impl Category {
    /// Every category offered by the admin form, in display order.
    pub const LISTED: [Self; 10] = [
        Self::HomeDecor,
        Self::Jewelry,
        Self::Textiles,
        Self::Pottery,
        Self::WoodenCrafts,
        Self::Metalware,
        Self::PaperCrafts,
        Self::PersonalCare,
        Self::KitchenItems,
        Self::Other,
    ];

    /// The display label, which is also the serialised form.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::HomeDecor => "Home Decor",
            Self::Jewelry => "Jewelry",
            Self::Textiles => "Textiles",
            Self::Pottery => "Pottery",
            Self::WoodenCrafts => "Wooden Crafts",
            Self::Metalware => "Metalware",
            Self::PaperCrafts => "Paper Crafts",
            Self::PersonalCare => "Personal Care",
            Self::KitchenItems => "Kitchen Items",
            Self::Other => "Other",
            Self::Unlisted(label) => label,
        }
    }

    /// Parses a label from the form vocabulary (case-insensitive).
    ///
    /// Returns `None` for anything outside the vocabulary.
    #[must_use]
    pub fn parse_listed(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::LISTED
            .into_iter()
            .find(|category| category.label().eq_ignore_ascii_case(label))
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Self::LISTED
            .into_iter()
            .find(|category| category.label() == value)
            .unwrap_or(Self::Unlisted(value))
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        match category {
            Category::Unlisted(label) => label,
            listed => listed.label().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Unit of the physical dimensions of a gift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// Centimetres
    #[default]
    Cm,
    /// Inches
    Inches,
}

impl Unit {
    /// The serialised name of the unit.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cm => "cm",
            Self::Inches => "inches",
        }
    }
}

impl FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cm" => Ok(Self::Cm),
            "in" | "inch" | "inches" => Ok(Self::Inches),
            other => Err(format!("unknown unit '{other}' (expected 'cm' or 'inches')")),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical size of a gift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    /// Length
    #[serde(default)]
    pub length: u32,
    /// Width
    #[serde(default)]
    pub width: u32,
    /// Height
    #[serde(default)]
    pub height: u32,
    /// Unit shared by all three measurements.
    #[serde(default)]
    pub unit: Unit,
}

impl Dimensions {
    /// Whether every measurement is zero (the form default).
    #[must_use]
    pub const fn is_unset(&self) -> bool {
        self.length == 0 && self.width == 0 && self.height == 0
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} × {} × {} {}",
            self.length, self.width, self.height, self.unit
        )
    }
}

const fn default_active() -> bool {
    true
}

/// A catalog entry describing one product available for inquiry.
///
/// The serialised form is the JSON shape of the storefront's seed data, so
/// an exported catalog can be dropped straight into the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftRecord {
    /// Unique identifier within the catalog.
    pub id: GiftId,
    /// Display name.
    pub name: String,
    /// Optional free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Product category.
    #[serde(default)]
    pub category: Category,
    /// Lower bound of the price range, in rupees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range_min: Option<u32>,
    /// Upper bound of the price range, in rupees.
    ///
    /// Not required to be greater than the lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range_max: Option<u32>,
    /// Physical size.
    #[serde(default)]
    pub dimensions: Dimensions,
    /// Occasion tags. Duplicates are not removed.
    #[serde(default)]
    pub occasions: Vec<String>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Whether the gift is shown on the public catalog.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last modified.
    pub updated_at: DateTime<Utc>,
    /// Image reference: a public URL or an inline `data:` URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl GiftRecord {
    /// Creates a record from a draft, stamping both timestamps with `now`.
    #[must_use]
    pub fn new(id: GiftId, draft: GiftDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name.to_string(),
            description: draft.description,
            category: draft.category,
            price_range_min: draft.price_range_min,
            price_range_max: draft.price_range_max,
            dimensions: draft.dimensions,
            occasions: draft.occasions,
            tags: draft.tags,
            is_active: draft.is_active,
            created_at: now,
            updated_at: now,
            image_url: draft.image_url,
        }
    }

    /// Overwrites the editable fields with the draft.
    ///
    /// The identifier and creation time are preserved. The modification
    /// time never moves backwards, even if `now` is behind it.
    pub fn apply(&mut self, draft: GiftDraft, now: DateTime<Utc>) {
        self.name = draft.name.to_string();
        self.description = draft.description;
        self.category = draft.category;
        self.price_range_min = draft.price_range_min;
        self.price_range_max = draft.price_range_max;
        self.dimensions = draft.dimensions;
        self.occasions = draft.occasions;
        self.tags = draft.tags;
        self.is_active = draft.is_active;
        self.image_url = draft.image_url;
        self.updated_at = now.max(self.updated_at);
    }

    /// The price as shown on the public catalog.
    ///
    /// A missing or zero bound means the price is given on request.
    #[must_use]
    pub fn price_label(&self) -> String {
        match (self.price_range_min, self.price_range_max) {
            (Some(min), Some(max)) if min > 0 && max > 0 => {
                if min == max {
                    format!("₹{}", group_thousands(min))
                } else {
                    format!("₹{} - ₹{}", group_thousands(min), group_thousands(max))
                }
            }
            _ => "Price on request".to_string(),
        }
    }

    /// The first `shown` occasions, followed by "+N more" if there are others.
    #[must_use]
    pub fn occasion_summary(&self, shown: usize) -> String {
        let mut parts: Vec<String> = self.occasions.iter().take(shown).cloned().collect();
        let hidden = self.occasions.len().saturating_sub(shown);
        if hidden > 0 {
            parts.push(format!("+{hidden} more"));
        }
        parts.join(", ")
    }
}

fn group_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use test_case::test_case;

    use super::*;

    fn diya() -> GiftRecord {
        let created = Utc.with_ymd_and_hms(2025, 7, 19, 15, 22, 43).unwrap();
        let draft = GiftDraft::named("Diya")
            .unwrap()
            .with_category(Category::HomeDecor)
            .with_prices(20, 40);
        GiftRecord::new(GiftId::from("1752938563576"), draft, created)
    }

    #[test_case(Some(20), Some(40), "₹20 - ₹40"; "range")]
    #[test_case(Some(1500), Some(1500), "₹1,500"; "single price")]
    #[test_case(Some(0), Some(40), "Price on request"; "zero lower bound")]
    #[test_case(None, Some(40), "Price on request"; "missing lower bound")]
    #[test_case(Some(1000), Some(25_000), "₹1,000 - ₹25,000"; "grouped digits")]
    fn price_label(min: Option<u32>, max: Option<u32>, expected: &str) {
        let mut gift = diya();
        gift.price_range_min = min;
        gift.price_range_max = max;
        assert_eq!(gift.price_label(), expected);
    }

    #[test]
    fn occasion_summary_truncates() {
        let mut gift = diya();
        gift.occasions = vec![
            "Diwali".to_string(),
            "Corporate Gifts".to_string(),
            "Wedding".to_string(),
        ];
        assert_eq!(gift.occasion_summary(2), "Diwali, Corporate Gifts, +1 more");
        assert_eq!(gift.occasion_summary(5), "Diwali, Corporate Gifts, Wedding");
    }

    #[test]
    fn apply_preserves_identity_and_creation_time() {
        let mut gift = diya();
        let created = gift.created_at;
        let later = created + chrono::Duration::minutes(5);

        gift.apply(GiftDraft::named("Brass Diya").unwrap(), later);

        assert_eq!(gift.id.as_str(), "1752938563576");
        assert_eq!(gift.created_at, created);
        assert_eq!(gift.updated_at, later);
        assert_eq!(gift.name, "Brass Diya");
    }

    #[test]
    fn apply_never_moves_modification_time_backwards() {
        let mut gift = diya();
        let before = gift.updated_at - chrono::Duration::seconds(30);

        gift.apply(GiftDraft::named("Diya").unwrap(), before);

        assert_eq!(gift.updated_at, gift.created_at);
    }

    #[test]
    fn unlisted_category_round_trips_verbatim() {
        let json = r#"{
            "id": "1",
            "name": "Lamp",
            "category": "Lighting",
            "createdAt": "2025-07-19T15:22:43.576Z",
            "updatedAt": "2025-07-19T15:22:43.576Z"
        }"#;
        let gift: GiftRecord = serde_json::from_str(json).unwrap();

        assert_eq!(gift.category, Category::Unlisted("Lighting".to_string()));
        assert!(gift.is_active);
        assert!(gift.occasions.is_empty());
        assert!(gift.tags.is_empty());

        let value = serde_json::to_value(&gift).unwrap();
        assert_eq!(value["category"], "Lighting");
        assert!(value.get("priceRangeMin").is_none());
    }

    #[test]
    fn timestamps_serialise_in_utc() {
        let value = serde_json::to_value(diya()).unwrap();
        assert_eq!(value["createdAt"], "2025-07-19T15:22:43Z");
        assert_eq!(value["dimensions"]["unit"], "cm");
    }

    #[test]
    fn parse_listed_category_is_case_insensitive() {
        assert_eq!(
            Category::parse_listed("wooden crafts"),
            Some(Category::WoodenCrafts)
        );
        assert_eq!(Category::parse_listed("Lighting"), None);
    }
}
