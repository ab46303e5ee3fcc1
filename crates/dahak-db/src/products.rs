use anyhow::Result;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use crate::models::{NewProduct, ProductRow};
use crate::{Database, DbError, constraint_code};

/// Hard ceiling on `limit` for product listings.
pub const MAX_PRODUCT_LIMIT: u32 = 200;

const PRODUCT_COLUMNS: &str = "p.id, p.name, p.description, p.price, p.condition,
    COALESCE(p.stock_status, 'In Stock'), p.category_id, c.name, p.brand, p.compatible_models,
    COALESCE(p.images_json, '[]'), COALESCE(p.is_featured, 0), COALESCE(p.quantity, 1), p.created_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    #[default]
    Newest,
    /// Most reserved first.
    Popular,
    PriceAsc,
    PriceDesc,
}

impl ProductSort {
    /// Unknown values fall back to `Newest`.
    pub fn parse(s: &str) -> Self {
        match s {
            "popular" => Self::Popular,
            "price_asc" => Self::PriceAsc,
            "price_desc" => Self::PriceDesc,
            _ => Self::Newest,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Category slug.
    pub category: Option<String>,
    pub brand: Option<String>,
    /// Matched against name, compatible models and brand.
    pub search: Option<String>,
    pub featured: bool,
    pub sort: ProductSort,
    pub limit: Option<u32>,
}

/// Assemble the listing query for `filter`. Every user-supplied value ends
/// up in the returned parameter list; the SQL text only varies by shape.
pub fn build_product_query(filter: &ProductFilter) -> (String, Vec<Value>) {
    let mut sql = format!(
        "SELECT {} FROM products p LEFT JOIN categories c ON p.category_id = c.id",
        PRODUCT_COLUMNS
    );
    let mut params: Vec<Value> = Vec::new();

    if filter.sort == ProductSort::Popular {
        sql.push_str(" LEFT JOIN reservations r ON r.product_id = p.id");
    }

    sql.push_str(" WHERE 1=1");

    if let Some(slug) = non_blank(&filter.category) {
        sql.push_str(" AND c.slug = ?");
        params.push(Value::Text(slug.to_string()));
    }
    if let Some(brand) = non_blank(&filter.brand) {
        sql.push_str(" AND p.brand LIKE ? ESCAPE '\\'");
        params.push(Value::Text(like_pattern(brand)));
    }
    if let Some(search) = non_blank(&filter.search) {
        sql.push_str(
            " AND (p.name LIKE ? ESCAPE '\\' OR p.compatible_models LIKE ? ESCAPE '\\' OR p.brand LIKE ? ESCAPE '\\')",
        );
        let pattern = like_pattern(search);
        for _ in 0..3 {
            params.push(Value::Text(pattern.clone()));
        }
    }
    if filter.featured {
        sql.push_str(" AND p.is_featured = 1");
    }

    match filter.sort {
        ProductSort::Popular => {
            sql.push_str(" GROUP BY p.id ORDER BY COUNT(r.id) DESC, p.created_at DESC, p.id DESC")
        }
        ProductSort::Newest => sql.push_str(" ORDER BY p.created_at DESC, p.id DESC"),
        ProductSort::PriceAsc => sql.push_str(" ORDER BY p.price ASC, p.created_at DESC, p.id DESC"),
        ProductSort::PriceDesc => sql.push_str(" ORDER BY p.price DESC, p.created_at DESC, p.id DESC"),
    }

    if let Some(limit) = filter.limit {
        sql.push_str(" LIMIT ?");
        params.push(Value::Integer(limit.min(MAX_PRODUCT_LIMIT) as i64));
    }

    (sql, params)
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// `%value%` with LIKE wildcards in `value` escaped.
fn like_pattern(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('%');
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

impl Database {
    pub fn list_products(&self, filter: &ProductFilter) -> Result<Vec<ProductRow>> {
        let (sql, values) = build_product_query(filter);
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(values.iter()), product_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_product(&self, id: i64) -> Result<Option<ProductRow>> {
        self.with_conn(|conn| query_product(conn, id))
    }

    pub fn create_product(&self, product: &NewProduct) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO products (name, description, price, condition, stock_status, category_id,
                                       brand, compatible_models, images_json, is_featured, quantity)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    product.name,
                    product.description,
                    product.price,
                    product.condition,
                    product.stock_status,
                    product.category_id,
                    product.brand,
                    product.compatible_models,
                    product.images_json,
                    product.is_featured,
                    product.quantity,
                ],
            )
            .map_err(map_category_fk)?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Overwrite every editable field. Returns `false` if no such product.
    pub fn update_product(&self, id: i64, product: &NewProduct) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE products SET name = ?1, description = ?2, price = ?3, condition = ?4,
                            stock_status = ?5, category_id = ?6, brand = ?7, compatible_models = ?8,
                            images_json = ?9, is_featured = ?10, quantity = ?11
                     WHERE id = ?12",
                    params![
                        product.name,
                        product.description,
                        product.price,
                        product.condition,
                        product.stock_status,
                        product.category_id,
                        product.brand,
                        product.compatible_models,
                        product.images_json,
                        product.is_featured,
                        product.quantity,
                        id,
                    ],
                )
                .map_err(map_category_fk)?;
            Ok(changed > 0)
        })
    }

    /// Delete a product together with its reservations.
    pub fn delete_product(&self, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM reservations WHERE product_id = ?1", [id])?;
            let changed = tx.execute("DELETE FROM products WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(changed > 0)
        })
    }

    /// Distinct non-empty brands, alphabetical.
    pub fn list_brands(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT TRIM(brand) AS b FROM products
                 WHERE brand IS NOT NULL AND TRIM(brand) <> ''
                 ORDER BY b COLLATE NOCASE",
            )?;
            let brands = stmt
                .query_map([], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(brands)
        })
    }
}

fn query_product(conn: &Connection, id: i64) -> Result<Option<ProductRow>> {
    let sql = format!(
        "SELECT {} FROM products p LEFT JOIN categories c ON p.category_id = c.id WHERE p.id = ?1",
        PRODUCT_COLUMNS
    );
    let row = conn.query_row(&sql, [id], product_from_row).optional()?;
    Ok(row)
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<ProductRow> {
    Ok(ProductRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        condition: row.get(4)?,
        stock_status: row.get(5)?,
        category_id: row.get(6)?,
        category_name: row.get(7)?,
        brand: row.get(8)?,
        compatible_models: row.get(9)?,
        images_json: row.get(10)?,
        is_featured: row.get(11)?,
        quantity: row.get(12)?,
        created_at: row.get(13)?,
    })
}

fn map_category_fk(err: rusqlite::Error) -> anyhow::Error {
    if constraint_code(&err) == Some(rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY) {
        DbError::MissingReference("category").into()
    } else {
        err.into()
    }
}
