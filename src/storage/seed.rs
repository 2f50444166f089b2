use chrono::{DateTime, Utc};

use crate::domain::{Category, Dimensions, GiftId, GiftRecord, Unit};

/// The records a freshly initialised catalog starts with.
#[must_use]
pub fn seed_gifts() -> Vec<GiftRecord> {
    let created = DateTime::<Utc>::from_timestamp_millis(1_752_938_563_576).unwrap_or_default();
    vec![GiftRecord {
        id: GiftId::from_millis(1_752_938_563_576),
        name: "Diya".to_string(),
        description: Some("Handmade Diyas".to_string()),
        category: Category::HomeDecor,
        price_range_min: Some(20),
        price_range_max: Some(40),
        dimensions: Dimensions {
            length: 3,
            width: 4,
            height: 5,
            unit: Unit::Cm,
        },
        occasions: vec!["Diwali".to_string(), "Corporate Gifts".to_string()],
        tags: vec!["handmade".to_string()],
        is_active: true,
        created_at: created,
        updated_at: created,
        image_url: None,
    }]
}
