//! SQLite persistence for categories and flash cards.
//!
//! Two tables: `categories` (unique `name`) and `flash_cards`, which cascade
//! on category delete. Updates are partial: `NULL` parameters keep the stored
//! column via `COALESCE`. Timestamps are RFC 3339 strings.

use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OpenFlags, OptionalExtension, Row};
use tracing::{debug, info};

use super::types::{
    default_categories, Category, CategoryUpdate, FlashCard, FlashCardUpdate, NewCategory,
    NewFlashCard,
};
use crate::error::{GateError, Result};

const CATEGORY_SELECT: &str = "SELECT c.id, c.name, c.display_name, c.description, c.icon, \
        c.color, c.folder, c.created_at, c.updated_at, COUNT(fc.id) \
     FROM categories c \
     LEFT JOIN flash_cards fc ON c.id = fc.category_id";

const FLASH_CARD_SELECT: &str = "SELECT fc.id, fc.name, fc.image_url, fc.image_data, \
        fc.category_id, fc.created_at, fc.updated_at, c.display_name \
     FROM flash_cards fc \
     JOIN categories c ON fc.category_id = c.id";

pub struct CatalogDb {
    path: PathBuf,
}

impl CatalogDb {
    /// Opens (creating if needed) the catalog and seeds default categories.
    pub fn new(path: PathBuf) -> Result<Self> {
        let db = Self { path };
        db.init_schema()?;
        db.seed_default_categories()?;
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // ─────────────────────────────────────────────────────────────────────
    // Categories
    // ─────────────────────────────────────────────────────────────────────

    /// All categories with their card counts, ordered by display name.
    pub fn list_categories(&self) -> Result<Vec<Category>> {
        self.with_connection(|conn| {
            let sql = format!("{CATEGORY_SELECT} GROUP BY c.id ORDER BY c.display_name, c.id");
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|err| GateError::db("preparing categories query", err))?;
            let rows = stmt
                .query_map([], category_from_row)
                .map_err(|err| GateError::db("reading category rows", err))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(|err| GateError::db("decoding category row", err))
        })
    }

    pub fn get_category(&self, id: i64) -> Result<Option<Category>> {
        self.with_connection(|conn| query_category(conn, id))
    }

    pub fn create_category(&self, new: &NewCategory) -> Result<Category> {
        new.validate()?;
        let now = Utc::now().to_rfc3339();
        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO categories \
                    (name, display_name, description, icon, color, folder, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    new.name,
                    new.display_name,
                    new.description,
                    new.icon,
                    new.color,
                    new.folder,
                    now
                ],
            )
            .map_err(|err| map_constraint(err, "name", &new.name, "inserting category"))?;

            let id = conn.last_insert_rowid();
            info!(id, name = %new.name, "Category created");
            query_category(conn, id)?.ok_or(GateError::CategoryNotFound(id))
        })
    }

    /// Returns `None` when no category has this id.
    pub fn update_category(&self, id: i64, update: &CategoryUpdate) -> Result<Option<Category>> {
        update.validate()?;
        let now = Utc::now().to_rfc3339();
        self.with_connection(|conn| {
            let changed = conn
                .execute(
                    "UPDATE categories SET \
                        name = COALESCE(?1, name), \
                        display_name = COALESCE(?2, display_name), \
                        description = COALESCE(?3, description), \
                        icon = COALESCE(?4, icon), \
                        color = COALESCE(?5, color), \
                        folder = COALESCE(?6, folder), \
                        updated_at = ?7 \
                     WHERE id = ?8",
                    params![
                        update.name,
                        update.display_name,
                        update.description,
                        update.icon,
                        update.color,
                        update.folder,
                        now,
                        id
                    ],
                )
                .map_err(|err| {
                    map_constraint(
                        err,
                        "name",
                        update.name.as_deref().unwrap_or_default(),
                        "updating category",
                    )
                })?;

            if changed == 0 {
                return Ok(None);
            }
            debug!(id, "Category updated");
            query_category(conn, id)
        })
    }

    /// Deletes the category and, by cascade, its flash cards.
    /// Returns false when nothing was deleted.
    pub fn delete_category(&self, id: i64) -> Result<bool> {
        self.with_connection(|conn| {
            let deleted = conn
                .execute("DELETE FROM categories WHERE id = ?1", params![id])
                .map_err(|err| GateError::db("deleting category", err))?;
            if deleted > 0 {
                info!(id, "Category deleted");
            }
            Ok(deleted > 0)
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Flash Cards
    // ─────────────────────────────────────────────────────────────────────

    pub fn list_flash_cards(&self, category_id: i64) -> Result<Vec<FlashCard>> {
        self.query_flash_cards(
            &format!("{FLASH_CARD_SELECT} WHERE fc.category_id = ?1 ORDER BY fc.name, fc.id"),
            params![category_id],
        )
    }

    /// Every flash card, ordered by category display name then card name.
    pub fn list_all_flash_cards(&self) -> Result<Vec<FlashCard>> {
        self.query_flash_cards(
            &format!("{FLASH_CARD_SELECT} ORDER BY c.display_name, fc.name, fc.id"),
            params![],
        )
    }

    pub fn get_flash_card(&self, id: i64) -> Result<Option<FlashCard>> {
        self.with_connection(|conn| query_flash_card(conn, id))
    }

    pub fn find_flash_card(&self, name: &str, category_id: i64) -> Result<Option<FlashCard>> {
        self.with_connection(|conn| {
            conn.query_row(
                &format!("{FLASH_CARD_SELECT} WHERE fc.name = ?1 AND fc.category_id = ?2"),
                params![name, category_id],
                flash_card_from_row,
            )
            .optional()
            .map_err(|err| GateError::db("querying flash card by name", err))
        })
    }

    pub fn create_flash_card(&self, new: &NewFlashCard) -> Result<FlashCard> {
        new.validate()?;
        let now = Utc::now().to_rfc3339();
        self.with_connection(|conn| {
            ensure_category_exists(conn, new.category_id)?;
            conn.execute(
                "INSERT INTO flash_cards \
                    (name, image_url, image_data, category_id, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![new.name, new.image_url, new.image_data, new.category_id, now],
            )
            .map_err(|err| GateError::db("inserting flash card", err))?;

            let id = conn.last_insert_rowid();
            info!(id, name = %new.name, category_id = new.category_id, "Flash card created");
            query_flash_card(conn, id)?.ok_or(GateError::FlashCardNotFound(id))
        })
    }

    /// Returns `None` when no flash card has this id.
    pub fn update_flash_card(
        &self,
        id: i64,
        update: &FlashCardUpdate,
    ) -> Result<Option<FlashCard>> {
        update.validate()?;
        let now = Utc::now().to_rfc3339();
        self.with_connection(|conn| {
            if let Some(category_id) = update.category_id {
                ensure_category_exists(conn, category_id)?;
            }
            let changed = conn
                .execute(
                    "UPDATE flash_cards SET \
                        name = COALESCE(?1, name), \
                        image_url = COALESCE(?2, image_url), \
                        image_data = COALESCE(?3, image_data), \
                        category_id = COALESCE(?4, category_id), \
                        updated_at = ?5 \
                     WHERE id = ?6",
                    params![
                        update.name,
                        update.image_url,
                        update.image_data,
                        update.category_id,
                        now,
                        id
                    ],
                )
                .map_err(|err| GateError::db("updating flash card", err))?;

            if changed == 0 {
                return Ok(None);
            }
            debug!(id, "Flash card updated");
            query_flash_card(conn, id)
        })
    }

    pub fn delete_flash_card(&self, id: i64) -> Result<bool> {
        self.with_connection(|conn| {
            let deleted = conn
                .execute("DELETE FROM flash_cards WHERE id = ?1", params![id])
                .map_err(|err| GateError::db("deleting flash card", err))?;
            Ok(deleted > 0)
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Connection + Schema
    // ─────────────────────────────────────────────────────────────────────

    fn query_flash_cards<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Vec<FlashCard>> {
        self.with_connection(|conn| {
            let mut stmt = conn
                .prepare(sql)
                .map_err(|err| GateError::db("preparing flash cards query", err))?;
            let rows = stmt
                .query_map(params, flash_card_from_row)
                .map_err(|err| GateError::db("reading flash card rows", err))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(|err| GateError::db("decoding flash card row", err))
        })
    }

    fn init_schema(&self) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute_batch(
                "BEGIN;
                 CREATE TABLE IF NOT EXISTS categories (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE,
                    display_name TEXT NOT NULL,
                    description TEXT,
                    icon TEXT,
                    color TEXT,
                    folder TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                 );
                 CREATE TABLE IF NOT EXISTS flash_cards (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    image_url TEXT NOT NULL,
                    image_data BLOB,
                    category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                 );
                 CREATE INDEX IF NOT EXISTS idx_flash_cards_category_id ON flash_cards(category_id);
                 CREATE INDEX IF NOT EXISTS idx_categories_name ON categories(name);
                 COMMIT;",
            )
            .map_err(|err| GateError::db("initializing catalog schema", err))
        })
    }

    fn seed_default_categories(&self) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.with_connection(|conn| {
            let tx = conn
                .transaction()
                .map_err(|err| GateError::db("starting seed transaction", err))?;
            let mut inserted = 0;
            for category in default_categories() {
                inserted += tx
                    .execute(
                        "INSERT INTO categories \
                            (name, display_name, description, icon, color, folder, \
                             created_at, updated_at) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7) \
                         ON CONFLICT(name) DO NOTHING",
                        params![
                            category.name,
                            category.display_name,
                            category.description,
                            category.icon,
                            category.color,
                            category.folder,
                            now
                        ],
                    )
                    .map_err(|err| GateError::db("seeding default categories", err))?;
            }
            tx.commit()
                .map_err(|err| GateError::db("committing default categories", err))?;
            if inserted > 0 {
                debug!(inserted, "Seeded default categories");
            }
            Ok(())
        })
    }

    fn with_connection<T>(&self, op: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut conn = self.open()?;
        op(&mut conn)
    }

    fn open(&self) -> Result<Connection> {
        if let Some(parent) = self.path.parent() {
            fs_err::create_dir_all(parent)
                .map_err(|err| GateError::io("creating catalog data dir", err))?;
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX;

        let conn = Connection::open_with_flags(&self.path, flags)
            .map_err(|err| GateError::db("opening catalog db", err))?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|err| GateError::db("enabling WAL", err))?;
        conn.pragma_update(None, "busy_timeout", 5000)
            .map_err(|err| GateError::db("setting busy_timeout", err))?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|err| GateError::db("enabling foreign keys", err))?;

        Ok(conn)
    }
}

fn query_category(conn: &Connection, id: i64) -> Result<Option<Category>> {
    conn.query_row(
        &format!("{CATEGORY_SELECT} WHERE c.id = ?1 GROUP BY c.id"),
        params![id],
        category_from_row,
    )
    .optional()
    .map_err(|err| GateError::db("querying category", err))
}

fn query_flash_card(conn: &Connection, id: i64) -> Result<Option<FlashCard>> {
    conn.query_row(
        &format!("{FLASH_CARD_SELECT} WHERE fc.id = ?1"),
        params![id],
        flash_card_from_row,
    )
    .optional()
    .map_err(|err| GateError::db("querying flash card", err))
}

fn ensure_category_exists(conn: &Connection, id: i64) -> Result<()> {
    let exists: Option<i64> = conn
        .query_row("SELECT id FROM categories WHERE id = ?1", params![id], |row| {
            row.get(0)
        })
        .optional()
        .map_err(|err| GateError::db("checking category", err))?;
    exists.map(|_| ()).ok_or(GateError::CategoryNotFound(id))
}

fn map_constraint(
    err: rusqlite::Error,
    field: &'static str,
    value: &str,
    context: &str,
) -> GateError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            GateError::Validation {
                field,
                reason: format!("{value:?} already exists"),
            }
        }
        _ => GateError::db(context, err),
    }
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        display_name: row.get(2)?,
        description: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        icon: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        color: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        folder: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
        image_count: row.get::<_, i64>(9)?.max(0) as u32,
    })
}

fn flash_card_from_row(row: &Row<'_>) -> rusqlite::Result<FlashCard> {
    Ok(FlashCard {
        id: row.get(0)?,
        name: row.get(1)?,
        image_url: row.get(2)?,
        image_data: row.get(3)?,
        category_id: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
        category_display_name: row.get(7)?,
    })
}
