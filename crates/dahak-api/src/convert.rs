use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use dahak_db::models::{CategoryRow, MessageRow, ProductRow, ReservationRow};
use dahak_types::models::{
    Category, Condition, ContactMessage, Product, Reservation, ReservationStatus, StockStatus,
};

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Parse as naive UTC, accepting RFC 3339 too.
pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc()))
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

pub fn product(row: ProductRow) -> Product {
    let images = serde_json::from_str::<Vec<String>>(&row.images_json).unwrap_or_else(|e| {
        warn!("Corrupt images_json on product {}: {}", row.id, e);
        Vec::new()
    });

    Product {
        condition: Condition::parse(&row.condition).unwrap_or_else(|| {
            warn!("Unknown condition '{}' on product {}", row.condition, row.id);
            Condition::default()
        }),
        stock_status: StockStatus::parse(&row.stock_status).unwrap_or_else(|| {
            warn!("Unknown stock_status '{}' on product {}", row.stock_status, row.id);
            StockStatus::default()
        }),
        created_at: parse_timestamp(&row.created_at),
        id: row.id,
        name: row.name,
        description: row.description,
        price: row.price,
        category_id: row.category_id,
        category_name: row.category_name,
        brand: row.brand,
        compatible_models: row.compatible_models,
        images,
        is_featured: row.is_featured,
        quantity: row.quantity,
    }
}

pub fn category(row: CategoryRow) -> Category {
    Category {
        id: row.id,
        name: row.name,
        slug: row.slug,
        image_url: row.image_url,
    }
}

pub fn reservation(row: ReservationRow) -> Reservation {
    Reservation {
        status: ReservationStatus::parse(&row.status).unwrap_or_else(|| {
            warn!("Unknown status '{}' on reservation {}", row.status, row.id);
            ReservationStatus::default()
        }),
        created_at: parse_timestamp(&row.created_at),
        id: row.id,
        product_id: row.product_id,
        product_name: row.product_name,
        customer_name: row.customer_name,
        phone: row.phone,
        city: row.city,
        quantity: row.quantity,
        message: row.message,
    }
}

pub fn message(row: MessageRow) -> ContactMessage {
    ContactMessage {
        created_at: parse_timestamp(&row.created_at),
        id: row.id,
        name: row.name,
        email: row.email,
        phone: row.phone,
        message: row.message,
        read: row.read,
    }
}

/// Trim `value`; blank becomes `None`.
pub fn clean_opt(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Trim a required field, failing with "`field` is required" when blank.
pub fn required(value: &str, field: &str) -> Result<String, crate::error::ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(crate::error::ApiError::bad_request(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_sqlite_and_rfc3339_timestamps() {
        let ts = parse_timestamp("2024-05-01 13:45:10");
        assert_eq!((ts.year(), ts.month(), ts.day()), (2024, 5, 1));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (13, 45, 10));

        let ts = parse_timestamp("2024-05-01T13:45:10Z");
        assert_eq!(ts.hour(), 13);

        assert_eq!(parse_timestamp("yesterday"), DateTime::<Utc>::default());
    }

    #[test]
    fn corrupt_images_json_yields_no_images() {
        let row = ProductRow {
            id: 1,
            name: "Radiateur".into(),
            description: None,
            price: 80.0,
            condition: "Used".into(),
            stock_status: "On Order".into(),
            category_id: None,
            category_name: None,
            brand: None,
            compatible_models: None,
            images_json: "not json".into(),
            is_featured: false,
            quantity: 1,
            created_at: "2024-01-01 00:00:00".into(),
        };
        let p = product(row);
        assert!(p.images.is_empty());
        assert_eq!(p.condition, Condition::Used);
        assert_eq!(p.stock_status, StockStatus::OnOrder);
    }

    #[test]
    fn blank_optionals_are_dropped() {
        assert_eq!(clean_opt(Some("  ".into())), None);
        assert_eq!(clean_opt(Some(" Bosch ".into())), Some("Bosch".into()));
        assert!(required("   ", "name").is_err());
    }
}
