use std::collections::BTreeMap;

use axum::{Extension, Json, extract::State};
use serde_json::Value;
use tracing::info;

use dahak_types::api::{Claims, Settings, SettingsUpdate, StatsResponse, Success};

use crate::auth::{AppState, run_db};
use crate::convert;
use crate::error::ApiError;
use crate::extract::ApiJson;

const MAX_KEY_LEN: usize = 64;
const RECENT_RESERVATIONS: u32 = 5;

/// GET /api/settings: every stored key as a flat object.
pub async fn get_settings(State(state): State<AppState>) -> Result<Json<Settings>, ApiError> {
    let settings = run_db(&state, |db| db.get_settings()).await?;
    Ok(Json(settings))
}

/// POST /api/settings: upsert `{"settings": {...}}`. Keys not sent are kept.
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(update): ApiJson<SettingsUpdate>,
) -> Result<Json<Success>, ApiError> {
    let settings = flatten_settings(update.settings)?;
    let count = settings.len();
    run_db(&state, move |db| db.upsert_settings(&settings)).await?;
    info!("{} saved {} settings", claims.username, count);
    Ok(Json(Success::ok()))
}

/// GET /api/stats: dashboard counters plus the latest reservations.
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let stats = run_db(&state, |db| {
        Ok(StatsResponse {
            products: db.count_products()?,
            reservations: db.count_reservations()?,
            messages: db.count_messages()?,
            unread_messages: db.count_unread_messages()?,
            pending_reservations: db.count_pending_reservations()?,
            recent_reservations: db
                .list_reservations(Some(RECENT_RESERVATIONS))?
                .into_iter()
                .map(convert::reservation)
                .collect(),
        })
    })
    .await?;
    Ok(Json(stats))
}

/// Turn the posted object into string pairs: null is stored as an empty
/// string, scalars by their text, arrays and objects as JSON.
fn flatten_settings(value: Value) -> Result<BTreeMap<String, String>, ApiError> {
    let Value::Object(map) = value else {
        return Err(ApiError::bad_request("Invalid settings format"));
    };

    let mut out = BTreeMap::new();
    for (key, value) in map {
        let key = key.trim().to_string();
        if key.is_empty() || key.len() > MAX_KEY_LEN {
            return Err(ApiError::bad_request(format!("Invalid settings key: {:?}", key)));
        }
        let text = match value {
            Value::Null => String::new(),
            Value::String(s) => s,
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            other => other.to_string(),
        };
        out.insert(key, text);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn values_are_stringified() {
        let flat = flatten_settings(json!({
            "phone": "+213 555 12 34 56",
            "logo_height": 48,
            "show_map": true,
            "facebook_url": null,
        }))
        .unwrap();
        assert_eq!(flat["phone"], "+213 555 12 34 56");
        assert_eq!(flat["logo_height"], "48");
        assert_eq!(flat["show_map"], "true");
        assert_eq!(flat["facebook_url"], "");
    }

    #[test]
    fn non_objects_and_bad_keys_are_rejected() {
        assert!(flatten_settings(json!(["phone"])).is_err());
        assert!(flatten_settings(Value::Null).is_err());
        assert!(flatten_settings(json!({ " ": "x" })).is_err());

        let mut long = serde_json::Map::new();
        long.insert("k".repeat(65), json!("x"));
        assert!(flatten_settings(Value::Object(long)).is_err());
    }
}
