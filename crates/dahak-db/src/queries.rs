use std::collections::BTreeMap;

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::models::{CategoryRow, MessageRow, NewMessage, NewReservation, ReservationRow, UserRow};
use crate::{Database, DbError, constraint_code};

const RESERVATION_SELECT: &str = "SELECT r.id, r.product_id, p.name, r.customer_name, r.phone, r.city,
        COALESCE(r.quantity, 1), r.message, COALESCE(r.status, 'pending'), r.created_at
     FROM reservations r
     LEFT JOIN products p ON r.product_id = p.id";

impl Database {
    // -- Users --

    pub fn create_user(&self, username: &str, password_hash: &str, role: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, password_hash, role) VALUES (?1, ?2, ?3)",
                (username, password_hash, role),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn set_password_hash(&self, username: &str, password_hash: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET password_hash = ?1 WHERE username = ?2",
                (password_hash, username),
            )?;
            Ok(changed > 0)
        })
    }

    pub fn count_users(&self) -> Result<i64> {
        self.with_conn(|conn| count(conn, "users"))
    }

    // -- Categories --

    pub fn list_categories(&self) -> Result<Vec<CategoryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, slug, image_url FROM categories ORDER BY name COLLATE NOCASE, id",
            )?;
            let rows = stmt
                .query_map([], category_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_category(&self, id: i64) -> Result<Option<CategoryRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, name, slug, image_url FROM categories WHERE id = ?1",
                    [id],
                    category_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Fails with [`DbError::DuplicateSlug`] if `slug` is taken.
    pub fn create_category(&self, name: &str, slug: &str, image_url: Option<&str>) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO categories (name, slug, image_url) VALUES (?1, ?2, ?3)",
                params![name, slug, image_url],
            )
            .map_err(|e| {
                if constraint_code(&e) == Some(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE) {
                    anyhow::Error::from(DbError::DuplicateSlug(slug.to_string()))
                } else {
                    e.into()
                }
            })?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Delete a category. Its products are kept and become uncategorized.
    pub fn delete_category(&self, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("UPDATE products SET category_id = NULL WHERE category_id = ?1", [id])?;
            let changed = tx.execute("DELETE FROM categories WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(changed > 0)
        })
    }

    // -- Reservations --

    /// Fails with [`DbError::MissingReference`] if the product does not exist.
    pub fn create_reservation(&self, r: &NewReservation) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO reservations (product_id, customer_name, phone, city, quantity, message)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![r.product_id, r.customer_name, r.phone, r.city, r.quantity, r.message],
            )
            .map_err(|e| {
                if constraint_code(&e) == Some(rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY) {
                    anyhow::Error::from(DbError::MissingReference("product"))
                } else {
                    e.into()
                }
            })?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Newest first. `limit = None` returns everything.
    pub fn list_reservations(&self, limit: Option<u32>) -> Result<Vec<ReservationRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} ORDER BY r.created_at DESC, r.id DESC LIMIT ?1",
                RESERVATION_SELECT
            );
            // SQLite treats a negative LIMIT as unbounded.
            let limit = limit.map(i64::from).unwrap_or(-1);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([limit], reservation_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_reservation_status(&self, id: i64, status: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE reservations SET status = ?1 WHERE id = ?2",
                params![status, id],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn delete_reservation(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM reservations WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    // -- Messages --

    pub fn create_message(&self, m: &NewMessage) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (name, email, phone, message) VALUES (?1, ?2, ?3, ?4)",
                params![m.name, m.email, m.phone, m.message],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn list_messages(&self) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, email, phone, message, COALESCE(read, 0), created_at
                 FROM messages
                 ORDER BY created_at DESC, id DESC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(MessageRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                        phone: row.get(3)?,
                        message: row.get(4)?,
                        read: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn mark_message_read(&self, id: i64, read: bool) -> Result<bool> {
        self.with_conn(|conn| {
            let changed =
                conn.execute("UPDATE messages SET read = ?1 WHERE id = ?2", params![read, id])?;
            Ok(changed > 0)
        })
    }

    pub fn delete_message(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM messages WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    // -- Settings --

    pub fn get_settings(&self) -> Result<BTreeMap<String, String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT key, COALESCE(value, '') FROM settings")?;
            let map = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<std::result::Result<BTreeMap<String, String>, _>>()?;
            Ok(map)
        })
    }

    /// Insert or overwrite every pair in one transaction. Keys not present
    /// in `settings` are left alone.
    pub fn upsert_settings(&self, settings: &BTreeMap<String, String>) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt =
                    tx.prepare("INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)")?;
                for (key, value) in settings {
                    stmt.execute((key, value))?;
                }
            }
            tx.commit()?;
            Ok(())
        })
    }

    // -- Stats --

    pub fn count_products(&self) -> Result<i64> {
        self.with_conn(|conn| count(conn, "products"))
    }

    pub fn count_reservations(&self) -> Result<i64> {
        self.with_conn(|conn| count(conn, "reservations"))
    }

    pub fn count_pending_reservations(&self) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM reservations WHERE COALESCE(status, 'pending') = 'pending'",
                [],
                |r| r.get(0),
            )?;
            Ok(n)
        })
    }

    pub fn count_messages(&self) -> Result<i64> {
        self.with_conn(|conn| count(conn, "messages"))
    }

    pub fn count_unread_messages(&self) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE COALESCE(read, 0) = 0",
                [],
                |r| r.get(0),
            )?;
            Ok(n)
        })
    }
}

fn count(conn: &Connection, table: &'static str) -> Result<i64> {
    let n = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?;
    Ok(n)
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, password_hash, COALESCE(role, 'admin') FROM users WHERE username = ?1",
    )?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password_hash: row.get(2)?,
                role: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<CategoryRow> {
    Ok(CategoryRow {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        image_url: row.get(3)?,
    })
}

fn reservation_from_row(row: &Row<'_>) -> rusqlite::Result<ReservationRow> {
    Ok(ReservationRow {
        id: row.get(0)?,
        product_id: row.get(1)?,
        product_name: row.get(2)?,
        customer_name: row.get(3)?,
        phone: row.get(4)?,
        city: row.get(5)?,
        quantity: row.get(6)?,
        message: row.get(7)?,
        status: row.get(8)?,
        created_at: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewProduct;

    fn new_product(category_id: Option<i64>) -> NewProduct {
        NewProduct {
            name: "Amortisseur".to_string(),
            description: Some("Avant gauche".to_string()),
            price: 120.0,
            condition: "Used".to_string(),
            stock_status: "In Stock".to_string(),
            category_id,
            brand: Some("Monroe".to_string()),
            compatible_models: None,
            images_json: r#"["/uploads/a.jpg"]"#.to_string(),
            is_featured: true,
            quantity: 2,
        }
    }

    fn new_reservation(product_id: Option<i64>) -> NewReservation {
        NewReservation {
            product_id,
            customer_name: "Samir".to_string(),
            phone: "0661000000".to_string(),
            city: "Alger".to_string(),
            quantity: 1,
            message: Some("Disponible samedi ?".to_string()),
        }
    }

    #[test]
    fn users_round_trip() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_user_by_username("admin").unwrap().is_none());
        let id = db.create_user("admin", "hash", "admin").unwrap();
        let user = db.get_user_by_username("admin").unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.role, "admin");
        assert_eq!(db.count_users().unwrap(), 1);
        assert!(db.create_user("admin", "other", "admin").is_err());
    }

    #[test]
    fn duplicate_slug_is_reported() {
        let db = Database::open_in_memory().unwrap();
        db.create_category("Moteur", "moteur", None).unwrap();
        let err = db.create_category("Moteur bis", "moteur", None).unwrap_err();
        assert!(matches!(err.downcast_ref::<DbError>(), Some(DbError::DuplicateSlug(s)) if s == "moteur"));
    }

    #[test]
    fn deleting_a_category_detaches_products() {
        let db = Database::open_in_memory().unwrap();
        let cat = db.create_category("Suspension", "suspension", Some("/uploads/s.png")).unwrap();
        let pid = db.create_product(&new_product(Some(cat))).unwrap();

        assert!(db.delete_category(cat).unwrap());
        assert!(db.get_category(cat).unwrap().is_none());

        let p = db.get_product(pid).unwrap().unwrap();
        assert_eq!(p.category_id, None);
        assert_eq!(p.category_name, None);
        assert!(!db.delete_category(cat).unwrap());
    }

    #[test]
    fn reservation_lifecycle() {
        let db = Database::open_in_memory().unwrap();
        let pid = db.create_product(&new_product(None)).unwrap();
        let rid = db.create_reservation(&new_reservation(Some(pid))).unwrap();

        let list = db.list_reservations(None).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].product_name.as_deref(), Some("Amortisseur"));
        assert_eq!(list[0].status, "pending");
        assert_eq!(db.count_pending_reservations().unwrap(), 1);

        assert!(db.update_reservation_status(rid, "confirmed").unwrap());
        assert_eq!(db.list_reservations(None).unwrap()[0].status, "confirmed");
        assert_eq!(db.count_pending_reservations().unwrap(), 0);
        assert!(db.update_reservation_status(rid, "shipped").is_err());
        assert!(!db.update_reservation_status(rid + 1, "cancelled").unwrap());

        assert!(db.delete_reservation(rid).unwrap());
        assert!(!db.delete_reservation(rid).unwrap());
    }

    #[test]
    fn reservation_for_unknown_product_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let err = db.create_reservation(&new_reservation(Some(999))).unwrap_err();
        assert!(matches!(err.downcast_ref::<DbError>(), Some(DbError::MissingReference("product"))));
    }

    #[test]
    fn reservation_list_limit_and_order() {
        let db = Database::open_in_memory().unwrap();
        let ids: Vec<i64> = (0..7)
            .map(|_| db.create_reservation(&new_reservation(None)).unwrap())
            .collect();
        let recent = db.list_reservations(Some(5)).unwrap();
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].id, ids[6]);
        assert_eq!(db.list_reservations(None).unwrap().len(), 7);
    }

    #[test]
    fn messages_can_be_marked_read() {
        let db = Database::open_in_memory().unwrap();
        let id = db
            .create_message(&NewMessage {
                name: "Nadia".to_string(),
                email: None,
                phone: "0770000000".to_string(),
                message: "Avez-vous un alternateur ?".to_string(),
            })
            .unwrap();
        assert_eq!(db.count_unread_messages().unwrap(), 1);
        assert!(db.mark_message_read(id, true).unwrap());
        assert!(db.list_messages().unwrap()[0].read);
        assert_eq!(db.count_unread_messages().unwrap(), 0);
        assert_eq!(db.count_messages().unwrap(), 1);
        assert!(db.delete_message(id).unwrap());
        assert_eq!(db.count_messages().unwrap(), 0);
    }

    #[test]
    fn settings_upsert_merges() {
        let db = Database::open_in_memory().unwrap();
        let mut first = BTreeMap::new();
        first.insert("phone".to_string(), "+213 555 00 00 00".to_string());
        first.insert("email".to_string(), "contact@example.com".to_string());
        db.upsert_settings(&first).unwrap();

        let mut second = BTreeMap::new();
        second.insert("phone".to_string(), "+213 666 11 11 11".to_string());
        db.upsert_settings(&second).unwrap();

        let settings = db.get_settings().unwrap();
        assert_eq!(settings.len(), 2);
        assert_eq!(settings["phone"], "+213 666 11 11 11");
        assert_eq!(settings["email"], "contact@example.com");
    }
}
