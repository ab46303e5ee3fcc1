use axum::{Extension, Json, extract::State};
use tracing::info;

use dahak_types::api::{CategoryInput, Claims, Created, Success};
use dahak_types::models::Category;

use crate::auth::{AppState, run_db};
use crate::convert::{self, clean_opt, required};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};

pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, ApiError> {
    let rows = run_db(&state, |db| db.list_categories()).await?;
    Ok(Json(rows.into_iter().map(convert::category).collect()))
}

/// POST /api/categories: the slug is derived from the name when omitted.
pub async fn create_category(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> Result<Json<Created>, ApiError> {
    let name = required(&input.name, "name")?;
    let slug = slugify(input.slug.as_deref().filter(|s| !s.trim().is_empty()).unwrap_or(&name));
    if slug.is_empty() {
        return Err(ApiError::bad_request("slug must contain at least one letter or digit"));
    }
    let image_url = clean_opt(input.image_url);

    let (n, s) = (name.clone(), slug.clone());
    let id = run_db(&state, move |db| db.create_category(&n, &s, image_url.as_deref())).await?;
    info!("{} created category {} '{}' ({})", claims.username, id, name, slug);
    Ok(Json(Created { id }))
}

/// DELETE /api/categories/{id}: products in it become uncategorized.
pub async fn delete_category(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Success>, ApiError> {
    if !run_db(&state, move |db| db.delete_category(id)).await? {
        return Err(ApiError::not_found("Category not found"));
    }
    info!("{} deleted category {}", claims.username, id);
    Ok(Json(Success::ok()))
}

/// Lowercase, keep letters and digits (accented ones included), turn
/// whitespace, `-` and `_` into single hyphens and drop everything else.
pub fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    for ch in raw.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            slug.push(ch);
        } else if (ch.is_whitespace() || ch == '-' || ch == '_') && !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs() {
        assert_eq!(slugify("Pièces Moteur"), "pièces-moteur");
        assert_eq!(slugify("  Freinage & ABS  "), "freinage-abs");
        assert_eq!(slugify("body_parts--2"), "body-parts-2");
        assert_eq!(slugify("!!!"), "");
    }
}
