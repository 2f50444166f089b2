//! Gift drafts and the lenient parsing of the admin form.

use non_empty_string::NonEmptyString;

use crate::domain::{
    gift::{is_listed_occasion, Category, Dimensions, GiftRecord, Unit},
    validation::ValidationErrors,
};

/// The editable content of a gift, validated and ready to be stored.
///
/// Identity and timestamps are assigned by the catalog store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GiftDraft {
    /// Display name.
    pub name: NonEmptyString,
    /// Optional description.
    pub description: Option<String>,
    /// Product category.
    pub category: Category,
    /// Lower price bound.
    pub price_range_min: Option<u32>,
    /// Upper price bound.
    pub price_range_max: Option<u32>,
    /// Physical size.
    pub dimensions: Dimensions,
    /// Occasion tags.
    pub occasions: Vec<String>,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Whether the gift is listed publicly.
    pub is_active: bool,
    /// Image reference.
    pub image_url: Option<String>,
}

impl GiftDraft {
    /// A draft with the admin form defaults and the given name.
    ///
    /// # Errors
    ///
    /// Fails if the name is blank.
    pub fn named(name: impl Into<String>) -> Result<Self, ValidationErrors> {
        GiftForm {
            name: name.into(),
            ..GiftForm::default()
        }
        .try_into()
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Sets both price bounds.
    #[must_use]
    pub fn with_prices(mut self, min: u32, max: u32) -> Self {
        self.price_range_min = Some(min);
        self.price_range_max = Some(max);
        self
    }

    /// Sets the occasions.
    #[must_use]
    pub fn with_occasions<I, S>(mut self, occasions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.occasions = occasions.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the image reference.
    #[must_use]
    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }
}

/// Raw admin form input.
///
/// Every field is kept as text exactly as entered. Conversion into a
/// [`GiftDraft`] applies the same leniency as the storefront form: numbers
/// that do not parse become zero and a blank tag list becomes empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GiftForm {
    /// Name (required).
    pub name: String,
    /// Description; blank means none.
    pub description: String,
    /// Category label.
    pub category: String,
    /// Lower price bound.
    pub price_range_min: String,
    /// Upper price bound.
    pub price_range_max: String,
    /// Length.
    pub length: String,
    /// Width.
    pub width: String,
    /// Height.
    pub height: String,
    /// Unit label (`cm` or `inches`).
    pub unit: String,
    /// Selected occasions.
    pub occasions: Vec<String>,
    /// Comma-separated tags.
    pub tags: String,
    /// Active flag.
    pub is_active: bool,
    /// Image reference; blank means none.
    pub image_url: String,
    /// Category of the record being edited.
    ///
    /// A catalog file may hold a category outside the form vocabulary. It
    /// is accepted as long as the form still carries the same label.
    pub stored_category: Option<Category>,
    /// Occasions of the record being edited, accepted as they are.
    pub stored_occasions: Vec<String>,
}

impl Default for GiftForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            category: Category::HomeDecor.label().to_string(),
            price_range_min: "0".to_string(),
            price_range_max: "0".to_string(),
            length: "0".to_string(),
            width: "0".to_string(),
            height: "0".to_string(),
            unit: Unit::Cm.as_str().to_string(),
            occasions: Vec::new(),
            tags: String::new(),
            is_active: true,
            image_url: String::new(),
            stored_category: None,
            stored_occasions: Vec::new(),
        }
    }
}

impl From<&GiftRecord> for GiftForm {
    /// Pre-fills the form for editing an existing record.
    fn from(record: &GiftRecord) -> Self {
        Self {
            name: record.name.clone(),
            description: record.description.clone().unwrap_or_default(),
            category: record.category.label().to_string(),
            price_range_min: record.price_range_min.unwrap_or(0).to_string(),
            price_range_max: record.price_range_max.unwrap_or(0).to_string(),
            length: record.dimensions.length.to_string(),
            width: record.dimensions.width.to_string(),
            height: record.dimensions.height.to_string(),
            unit: record.dimensions.unit.as_str().to_string(),
            occasions: record.occasions.clone(),
            tags: record.tags.join(", "),
            is_active: record.is_active,
            image_url: record.image_url.clone().unwrap_or_default(),
            stored_category: Some(record.category.clone()),
            stored_occasions: record.occasions.clone(),
        }
    }
}

impl TryFrom<GiftForm> for GiftDraft {
    type Error = ValidationErrors;

    fn try_from(form: GiftForm) -> Result<Self, Self::Error> {
        let mut errors = ValidationErrors::default();

        let name = NonEmptyString::new(form.name.trim().to_string());
        if name.is_err() {
            errors.push("name", "Name is required");
        }

        let category = Category::parse_listed(&form.category).or_else(|| {
            form.stored_category
                .clone()
                .filter(|stored| stored.label() == form.category.trim())
        });
        if category.is_none() {
            errors.push(
                "category",
                format!("'{}' is not one of the offered categories", form.category.trim()),
            );
        }

        let unit = form.unit.parse::<Unit>();
        if let Err(message) = &unit {
            errors.push("unit", message.clone());
        }

        let occasions: Vec<String> = form
            .occasions
            .iter()
            .map(|occasion| occasion.trim().to_string())
            .filter(|occasion| !occasion.is_empty())
            .collect();
        for occasion in &occasions {
            if !is_listed_occasion(occasion) && !form.stored_occasions.contains(occasion) {
                errors.push("occasions", format!("'{occasion}' is not an offered occasion"));
            }
        }

        let Ok(name) = name else {
            return Err(errors);
        };
        errors.into_result(|| Self {
            name,
            description: non_blank(&form.description),
            category: category.unwrap_or_default(),
            price_range_min: Some(parse_int_or_zero(&form.price_range_min)),
            price_range_max: Some(parse_int_or_zero(&form.price_range_max)),
            dimensions: Dimensions {
                length: parse_int_or_zero(&form.length),
                width: parse_int_or_zero(&form.width),
                height: parse_int_or_zero(&form.height),
                unit: unit.unwrap_or_default(),
            },
            occasions,
            tags: split_tags(&form.tags),
            is_active: form.is_active,
            image_url: non_blank(&form.image_url),
        })
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Parses the leading integer of `input`, falling back to zero.
///
/// Mirrors the storefront form: `"12 cm"` is 12, `"abc"` and negative
/// values are 0, and values too large for a `u32` saturate.
#[must_use]
pub fn parse_int_or_zero(input: &str) -> u32 {
    let digits: String = input
        .trim_start()
        .trim_start_matches('+')
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    if digits.is_empty() {
        return 0;
    }
    digits.parse().unwrap_or(u32::MAX)
}

/// Splits a comma-separated tag list, dropping blanks.
#[must_use]
pub fn split_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("20", 20; "plain")]
    #[test_case(" 12 cm", 12; "leading integer")]
    #[test_case("abc", 0; "not a number")]
    #[test_case("", 0; "blank")]
    #[test_case("-5", 0; "negative")]
    #[test_case("3.7", 3; "fraction truncated")]
    #[test_case("99999999999", u32::MAX; "saturates")]
    fn lenient_integers(input: &str, expected: u32) {
        assert_eq!(parse_int_or_zero(input), expected);
    }

    #[test]
    fn tags_are_trimmed_and_blanks_dropped() {
        assert_eq!(
            split_tags(" handmade, ,clay ,"),
            vec!["handmade".to_string(), "clay".to_string()]
        );
        assert!(split_tags("").is_empty());
    }

    #[test]
    fn default_form_requires_only_a_name() {
        let errors = GiftDraft::try_from(GiftForm::default()).unwrap_err();
        assert!(errors.for_field("name").is_some());
        assert_eq!(errors.iter().count(), 1);

        let draft = GiftDraft::named("Diya").unwrap();
        assert_eq!(draft.category, Category::HomeDecor);
        assert_eq!(draft.price_range_min, Some(0));
        assert_eq!(draft.dimensions.unit, Unit::Cm);
        assert!(draft.occasions.is_empty());
        assert!(draft.tags.is_empty());
        assert!(draft.is_active);
    }

    #[test]
    fn form_rejects_values_outside_the_vocabulary() {
        let form = GiftForm {
            name: "Lamp".to_string(),
            category: "Lighting".to_string(),
            unit: "furlongs".to_string(),
            occasions: vec!["Diwali".to_string(), "Halloween".to_string()],
            ..GiftForm::default()
        };

        let errors = GiftDraft::try_from(form).unwrap_err();

        assert!(errors.for_field("category").is_some());
        assert!(errors.for_field("unit").is_some());
        assert!(errors
            .for_field("occasions")
            .is_some_and(|e| e.message.contains("Halloween")));
    }

    fn record_from_file() -> GiftRecord {
        serde_json::from_str(
            r#"{
                "id": "1752938563576",
                "name": "Brass Lantern",
                "category": "Lighting",
                "occasions": ["Eid", "Diwali"],
                "createdAt": "2025-07-19T15:22:43.576Z",
                "updatedAt": "2025-07-19T15:22:43.576Z"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn editing_keeps_unlisted_values_from_the_catalog_file() {
        let record = record_from_file();
        let mut form = GiftForm::from(&record);
        form.price_range_min = "100".to_string();
        form.image_url = "https://example.com/lantern.png".to_string();

        let draft = GiftDraft::try_from(form).unwrap();

        assert_eq!(draft.category, Category::Unlisted("Lighting".to_string()));
        assert_eq!(draft.occasions, vec!["Eid".to_string(), "Diwali".to_string()]);
        assert_eq!(draft.price_range_min, Some(100));
    }

    #[test]
    fn editing_still_checks_newly_entered_values() {
        let record = record_from_file();
        let mut form = GiftForm::from(&record);
        form.category = "Candles".to_string();
        form.occasions.push("Halloween".to_string());

        let errors = GiftDraft::try_from(form).unwrap_err();

        assert!(errors
            .for_field("category")
            .is_some_and(|e| e.message.contains("Candles")));
        assert!(errors
            .for_field("occasions")
            .is_some_and(|e| e.message.contains("Halloween")));
        assert_eq!(errors.iter().count(), 2);
    }

    #[test]
    fn unparsable_numbers_default_to_zero() {
        let form = GiftForm {
            name: "Diya".to_string(),
            price_range_min: "twenty".to_string(),
            price_range_max: "40".to_string(),
            height: "tall".to_string(),
            ..GiftForm::default()
        };

        let draft = GiftDraft::try_from(form).unwrap();

        assert_eq!(draft.price_range_min, Some(0));
        assert_eq!(draft.price_range_max, Some(40));
        assert_eq!(draft.dimensions.height, 0);
    }

    #[test]
    fn duplicate_occasions_are_kept() {
        let form = GiftForm {
            name: "Diya".to_string(),
            occasions: vec!["Diwali".to_string(), "Diwali".to_string()],
            ..GiftForm::default()
        };

        let draft = GiftDraft::try_from(form).unwrap();
        assert_eq!(draft.occasions.len(), 2);
    }
}
