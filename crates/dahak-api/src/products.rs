use axum::{Extension, Json, extract::State};
use tracing::info;

use dahak_db::models::NewProduct;
use dahak_db::products::{ProductFilter, ProductSort};
use dahak_types::api::{Claims, Created, ProductInput, ProductQuery, Success};
use dahak_types::models::Product;

use crate::auth::{AppState, run_db};
use crate::convert::{self, clean_opt, required};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};

/// GET /api/products
pub async fn list_products(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let filter = product_filter(query)?;
    let rows = run_db(&state, move |db| db.list_products(&filter)).await?;
    Ok(Json(rows.into_iter().map(convert::product).collect()))
}

/// GET /api/products/{id}
pub async fn get_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Product>, ApiError> {
    let row = run_db(&state, move |db| db.get_product(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;
    Ok(Json(convert::product(row)))
}

pub async fn create_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<Json<Created>, ApiError> {
    let product = validate_product(input)?;
    let name = product.name.clone();
    let id = run_db(&state, move |db| db.create_product(&product)).await?;
    info!("{} created product {} '{}'", claims.username, id, name);
    Ok(Json(Created { id }))
}

pub async fn update_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<Json<Success>, ApiError> {
    let product = validate_product(input)?;
    if !run_db(&state, move |db| db.update_product(id, &product)).await? {
        return Err(ApiError::not_found("Product not found"));
    }
    info!("{} updated product {}", claims.username, id);
    Ok(Json(Success::ok()))
}

/// DELETE /api/products/{id}: also removes the product's reservations.
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Success>, ApiError> {
    if !run_db(&state, move |db| db.delete_product(id)).await? {
        return Err(ApiError::not_found("Product not found"));
    }
    info!("{} deleted product {}", claims.username, id);
    Ok(Json(Success::ok()))
}

/// GET /api/brands
pub async fn list_brands(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let brands = run_db(&state, |db| db.list_brands()).await?;
    Ok(Json(brands))
}

fn product_filter(query: ProductQuery) -> Result<ProductFilter, ApiError> {
    let limit = match query.limit.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            raw.parse::<u32>()
                .map_err(|_| ApiError::bad_request(format!("Invalid limit: {}", raw)))?,
        ),
        None => None,
    };

    Ok(ProductFilter {
        category: query.category,
        brand: query.brand,
        search: query.search,
        featured: matches!(query.featured.as_deref(), Some("true" | "1")),
        sort: query.sort.as_deref().map(ProductSort::parse).unwrap_or_default(),
        limit,
    })
}

fn validate_product(input: ProductInput) -> Result<NewProduct, ApiError> {
    let name = required(&input.name, "name")?;

    if !input.price.is_finite() || input.price < 0.0 {
        return Err(ApiError::bad_request("price must be a non-negative number"));
    }

    // Missing or zero falls back to a single unit.
    let quantity = match input.quantity {
        None | Some(0) => 1,
        Some(q) if q < 0 => return Err(ApiError::bad_request("quantity must be positive")),
        Some(q) => q,
    };

    let images: Vec<String> = input
        .images
        .into_iter()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .collect();
    let images_json = serde_json::to_string(&images).map_err(|_| ApiError::Internal)?;

    Ok(NewProduct {
        name,
        description: clean_opt(input.description),
        price: input.price,
        condition: input.condition.as_str().to_string(),
        stock_status: input.stock_status.as_str().to_string(),
        category_id: input.category_id,
        brand: clean_opt(input.brand),
        compatible_models: clean_opt(input.compatible_models),
        images_json,
        is_featured: input.is_featured,
        quantity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(json: &str) -> ProductInput {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn defaults_and_cleanup() {
        let p = validate_product(input(
            r#"{"name": " Alternateur ", "price": "15000", "images": ["", " /uploads/a.jpg ", "  "],
                "brand": "", "id": 3, "category_name": "Electrique"}"#,
        ))
        .unwrap();
        assert_eq!(p.name, "Alternateur");
        assert_eq!(p.price, 15000.0);
        assert_eq!(p.condition, "New");
        assert_eq!(p.stock_status, "In Stock");
        assert_eq!(p.quantity, 1);
        assert_eq!(p.brand, None);
        assert_eq!(p.images_json, r#"["/uploads/a.jpg"]"#);
    }

    #[test]
    fn rejects_bad_fields() {
        assert!(validate_product(input(r#"{"name": "", "price": 1}"#)).is_err());
        assert!(validate_product(input(r#"{"name": "x", "price": -1}"#)).is_err());
        assert!(validate_product(input(r#"{"name": "x", "price": 1, "quantity": -2}"#)).is_err());
    }

    #[test]
    fn query_parsing() {
        let filter = product_filter(ProductQuery {
            featured: Some("true".into()),
            sort: Some("popular".into()),
            limit: Some("8".into()),
            ..Default::default()
        })
        .unwrap();
        assert!(filter.featured);
        assert_eq!(filter.sort, ProductSort::Popular);
        assert_eq!(filter.limit, Some(8));

        let filter = product_filter(ProductQuery {
            featured: Some("false".into()),
            ..Default::default()
        })
        .unwrap();
        assert!(!filter.featured);
        assert_eq!(filter.limit, None);

        assert!(product_filter(ProductQuery { limit: Some("ten".into()), ..Default::default() }).is_err());
    }
}
