use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{Condition, Reservation, ReservationStatus, StockStatus, User};

// -- JWT Claims --

/// JWT claims issued at login and checked by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub role: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

// -- Products --

/// Body of `POST /api/products` and `PUT /api/products/{id}`.
///
/// The admin client posts the whole product object back on edit, so unknown
/// fields such as `id` or `category_name` are ignored rather than rejected.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(deserialize_with = "crate::lenient::f64_from_any")]
    pub price: f64,
    #[serde(default)]
    pub condition: Condition,
    #[serde(default)]
    pub stock_status: StockStatus,
    #[serde(default, deserialize_with = "crate::lenient::opt_i64_from_any")]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub compatible_models: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default, deserialize_with = "crate::lenient::opt_i64_from_any")]
    pub quantity: Option<i64>,
}

/// Query string of `GET /api/products`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub brand: Option<String>,
    pub search: Option<String>,
    pub featured: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<String>,
}

// -- Categories --

#[derive(Debug, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

// -- Reservations --

#[derive(Debug, Deserialize)]
pub struct ReservationInput {
    #[serde(default, deserialize_with = "crate::lenient::opt_i64_from_any")]
    pub product_id: Option<i64>,
    pub customer_name: String,
    pub phone: String,
    pub city: String,
    #[serde(default, deserialize_with = "crate::lenient::opt_i64_from_any")]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusUpdate {
    pub status: ReservationStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReservationCreated {
    pub id: i64,
    pub success: bool,
}

// -- Messages --

#[derive(Debug, Deserialize)]
pub struct MessageInput {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub phone: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ReadUpdate {
    #[serde(default = "default_read")]
    pub read: bool,
}

fn default_read() -> bool {
    true
}

// -- Settings --

/// Body of `POST /api/settings`. `settings` is kept as a raw value so a
/// non-object payload can be answered with a 400 instead of a parse error.
#[derive(Debug, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default)]
    pub settings: serde_json::Value,
}

pub type Settings = BTreeMap<String, String>;

// -- Generic responses --

#[derive(Debug, Serialize, Deserialize)]
pub struct Created {
    pub id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Success {
    pub success: bool,
}

impl Success {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

// -- Dashboard --

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub products: i64,
    pub reservations: i64,
    pub messages: i64,
    pub unread_messages: i64,
    pub pending_reservations: i64,
    #[serde(rename = "recentReservations")]
    pub recent_reservations: Vec<Reservation>,
}
