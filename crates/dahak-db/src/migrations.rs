use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                username        TEXT NOT NULL UNIQUE,
                password_hash   TEXT NOT NULL,
                role            TEXT NOT NULL DEFAULT 'admin'
            );

            CREATE TABLE IF NOT EXISTS categories (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL,
                slug        TEXT NOT NULL UNIQUE,
                image_url   TEXT
            );

            CREATE TABLE IF NOT EXISTS products (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                name                TEXT NOT NULL,
                description         TEXT,
                price               REAL NOT NULL,
                condition           TEXT NOT NULL CHECK (condition IN ('New', 'Used')),
                stock_status        TEXT NOT NULL DEFAULT 'In Stock'
                                    CHECK (stock_status IN ('In Stock', 'Out of Stock', 'On Order')),
                category_id         INTEGER REFERENCES categories(id),
                brand               TEXT,
                compatible_models   TEXT,
                images_json         TEXT NOT NULL DEFAULT '[]',
                is_featured         INTEGER NOT NULL DEFAULT 0,
                created_at          TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_products_category
                ON products(category_id);

            CREATE TABLE IF NOT EXISTS reservations (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                product_id      INTEGER REFERENCES products(id),
                customer_name   TEXT NOT NULL,
                phone           TEXT NOT NULL,
                city            TEXT NOT NULL,
                quantity        INTEGER NOT NULL DEFAULT 1,
                message         TEXT,
                status          TEXT NOT NULL DEFAULT 'pending'
                                CHECK (status IN ('pending', 'confirmed', 'cancelled')),
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_reservations_product
                ON reservations(product_id);

            CREATE TABLE IF NOT EXISTS messages (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL,
                email       TEXT,
                phone       TEXT NOT NULL,
                message     TEXT NOT NULL,
                read        INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS settings (
                key     TEXT PRIMARY KEY,
                value   TEXT NOT NULL
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (products.quantity)");
        // Databases carried over from the previous deployment already have it.
        if !has_column(conn, "products", "quantity")? {
            conn.execute_batch("ALTER TABLE products ADD COLUMN quantity INTEGER NOT NULL DEFAULT 1;")?;
        }
        conn.execute_batch("INSERT INTO schema_version (version) VALUES (2);")?;
    }

    info!("Database migrations complete");
    Ok(())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names.iter().any(|n| n == column))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version, 2);

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 2);
    }

    #[test]
    fn quantity_defaults_to_one() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        conn.execute(
            "INSERT INTO products (name, price, condition) VALUES ('Filtre', 10.0, 'New')",
            [],
        )
        .unwrap();
        let qty: i64 = conn
            .query_row("SELECT quantity FROM products", [], |r| r.get(0))
            .unwrap();
        assert_eq!(qty, 1);
    }

    #[test]
    fn legacy_schema_with_quantity_is_adopted() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                price REAL NOT NULL,
                condition TEXT NOT NULL,
                category_id INTEGER,
                quantity INTEGER DEFAULT 1
            );",
        )
        .unwrap();
        run(&conn).unwrap();
        assert!(has_column(&conn, "products", "quantity").unwrap());
    }

    #[test]
    fn condition_is_checked() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        let res = conn.execute(
            "INSERT INTO products (name, price, condition) VALUES ('Filtre', 10.0, 'Broken')",
            [],
        );
        assert!(res.is_err());
    }
}
