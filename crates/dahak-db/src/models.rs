//! Database row types: these map directly to SQLite rows.
//! Kept separate from the dahak-types API models.

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: String,
}

pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
}

pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub condition: String,
    pub stock_status: String,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub brand: Option<String>,
    pub compatible_models: Option<String>,
    pub images_json: String,
    pub is_featured: bool,
    pub quantity: i64,
    pub created_at: String,
}

pub struct ReservationRow {
    pub id: i64,
    pub product_id: Option<i64>,
    pub product_name: Option<String>,
    pub customer_name: String,
    pub phone: String,
    pub city: String,
    pub quantity: i64,
    pub message: Option<String>,
    pub status: String,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub message: String,
    pub read: bool,
    pub created_at: String,
}

/// Validated product fields, shared by insert and update.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub condition: String,
    pub stock_status: String,
    pub category_id: Option<i64>,
    pub brand: Option<String>,
    pub compatible_models: Option<String>,
    pub images_json: String,
    pub is_featured: bool,
    pub quantity: i64,
}

#[derive(Debug, Clone)]
pub struct NewReservation {
    pub product_id: Option<i64>,
    pub customer_name: String,
    pub phone: String,
    pub city: String,
    pub quantity: i64,
    pub message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub message: String,
}
