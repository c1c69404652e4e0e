use std::str::FromStr;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::crawler::models::Listing;

/// Outcome of an insert attempt. A duplicate token is a signal, not an
/// error: the crawl has reached rows saved by a previous run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS divar_listings (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    token               TEXT NOT NULL UNIQUE,
    url                 TEXT NOT NULL,
    title               TEXT NOT NULL,
    sub_title           TEXT,
    description         TEXT NOT NULL,
    post_date           TEXT NOT NULL,
    last_post_sort_date INTEGER NOT NULL,
    rahn                REAL,
    rent                REAL,
    total_price         REAL,
    meter_price         REAL,
    convertable         TEXT,
    suitable_for        TEXT,
    adv_by              TEXT,
    floor               TEXT,
    space               TEXT,
    year                TEXT,
    rooms               TEXT,
    parking             INTEGER NOT NULL DEFAULT 0,
    elevator            INTEGER NOT NULL DEFAULT 0,
    cabinet             INTEGER NOT NULL DEFAULT 0,
    scraped_at          TEXT NOT NULL DEFAULT (datetime('now'))
)
"#;

pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::query(SCHEMA).execute(&pool).await?;

        Ok(Self { pool })
    }

    /// Plain insert, no upsert: the unique constraint on `token` is the
    /// duplicate detector, and a violation is reported as an outcome rather
    /// than absorbed.
    pub async fn insert_listing(&self, listing: &Listing) -> Result<InsertOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO divar_listings (
                token, url, title, sub_title, description,
                post_date, last_post_sort_date,
                rahn, rent, total_price, meter_price,
                convertable, suitable_for, adv_by, floor,
                space, year, rooms,
                parking, elevator, cabinet
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&listing.token)
        .bind(&listing.url)
        .bind(&listing.title)
        .bind(&listing.sub_title)
        .bind(&listing.description)
        .bind(listing.post_date)
        .bind(listing.last_post_sort_date)
        .bind(listing.rahn)
        .bind(listing.rent)
        .bind(listing.total_price)
        .bind(listing.meter_price)
        .bind(&listing.convertable)
        .bind(&listing.suitable_for)
        .bind(&listing.adv_by)
        .bind(&listing.floor)
        .bind(&listing.space)
        .bind(&listing.year)
        .bind(&listing.rooms)
        .bind(listing.parking)
        .bind(listing.elevator)
        .bind(listing.cabinet)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Ok(InsertOutcome::Duplicate)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn listing(token: &str) -> Listing {
        Listing {
            token: token.to_string(),
            url: format!("https://divar.ir/v/{token}"),
            title: "اجارهٔ آپارتمان".to_string(),
            sub_title: None,
            description: String::new(),
            last_post_sort_date: 1_666_000_000_000_000,
            post_date: DateTime::from_timestamp_micros(1_666_000_000_000_000).unwrap(),
            rahn: Some(200.0),
            rent: Some(12.5),
            total_price: None,
            meter_price: None,
            convertable: None,
            suitable_for: None,
            adv_by: Some("شخصی".to_string()),
            floor: None,
            space: Some("75".to_string()),
            year: None,
            rooms: Some("2".to_string()),
            parking: true,
            elevator: false,
            cabinet: false,
        }
    }

    async fn temp_storage(name: &str) -> Storage {
        let path = std::env::temp_dir().join(format!("divar_{name}_{}.sqlite3", std::process::id()));
        let _ = std::fs::remove_file(&path);
        Storage::new(&format!("sqlite://{}", path.display()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn first_insert_succeeds_second_is_duplicate() {
        let storage = temp_storage("dup").await;

        assert_eq!(
            storage.insert_listing(&listing("abc123")).await.unwrap(),
            InsertOutcome::Inserted
        );
        assert_eq!(
            storage.insert_listing(&listing("abc123")).await.unwrap(),
            InsertOutcome::Duplicate
        );
        // a different token is not affected by the collision
        assert_eq!(
            storage.insert_listing(&listing("def456")).await.unwrap(),
            InsertOutcome::Inserted
        );
    }

    #[tokio::test]
    async fn round_trips_extracted_fields() {
        let storage = temp_storage("fields").await;
        storage.insert_listing(&listing("abc123")).await.unwrap();

        let (rahn, parking, space): (Option<f64>, bool, Option<String>) =
            sqlx::query_as("SELECT rahn, parking, space FROM divar_listings WHERE token = ?")
                .bind("abc123")
                .fetch_one(&storage.pool)
                .await
                .unwrap();

        assert_eq!(rahn, Some(200.0));
        assert!(parking);
        assert_eq!(space.as_deref(), Some("75"));
    }
}
