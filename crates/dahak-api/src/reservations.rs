use axum::{Extension, Json, extract::State};
use tracing::info;

use dahak_db::models::NewReservation;
use dahak_types::api::{Claims, ReservationCreated, ReservationInput, StatusUpdate, Success};
use dahak_types::models::Reservation;

use crate::auth::{AppState, run_db};
use crate::convert::{self, clean_opt, required};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};

/// POST /api/reservations: public; a customer asks to hold a part.
pub async fn create_reservation(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ReservationInput>,
) -> Result<Json<ReservationCreated>, ApiError> {
    let reservation = validate_reservation(input)?;
    let product_id = reservation.product_id;
    let id = run_db(&state, move |db| db.create_reservation(&reservation)).await?;
    info!("New reservation {} for product {:?}", id, product_id);
    Ok(Json(ReservationCreated { id, success: true }))
}

pub async fn list_reservations(
    State(state): State<AppState>,
) -> Result<Json<Vec<Reservation>>, ApiError> {
    let rows = run_db(&state, |db| db.list_reservations(None)).await?;
    Ok(Json(rows.into_iter().map(convert::reservation).collect()))
}

/// PUT /api/reservations/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(update): ApiJson<StatusUpdate>,
) -> Result<Json<Success>, ApiError> {
    let status = update.status.as_str();
    if !run_db(&state, move |db| db.update_reservation_status(id, status)).await? {
        return Err(ApiError::not_found("Reservation not found"));
    }
    info!("{} set reservation {} to {}", claims.username, id, status);
    Ok(Json(Success::ok()))
}

pub async fn delete_reservation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Success>, ApiError> {
    if !run_db(&state, move |db| db.delete_reservation(id)).await? {
        return Err(ApiError::not_found("Reservation not found"));
    }
    info!("{} deleted reservation {}", claims.username, id);
    Ok(Json(Success::ok()))
}

fn validate_reservation(input: ReservationInput) -> Result<NewReservation, ApiError> {
    let quantity = input.quantity.unwrap_or(1);
    if quantity < 1 {
        return Err(ApiError::bad_request("quantity must be at least 1"));
    }

    Ok(NewReservation {
        product_id: input.product_id,
        customer_name: required(&input.customer_name, "customer_name")?,
        phone: required(&input.phone, "phone")?,
        city: required(&input.city, "city")?,
        quantity,
        message: clean_opt(input.message),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(json: &str) -> ReservationInput {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn validation() {
        let ok = validate_reservation(input(
            r#"{"product_id": "4", "customer_name": "Yacine", "phone": "0550", "city": "Blida", "message": " "}"#,
        ))
        .unwrap();
        assert_eq!(ok.product_id, Some(4));
        assert_eq!(ok.quantity, 1);
        assert_eq!(ok.message, None);

        assert!(validate_reservation(input(
            r#"{"customer_name": "Yacine", "phone": " ", "city": "Blida"}"#
        ))
        .is_err());
        assert!(validate_reservation(input(
            r#"{"customer_name": "Yacine", "phone": "0550", "city": "Blida", "quantity": 0}"#
        ))
        .is_err());
    }
}
