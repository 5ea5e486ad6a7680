//! Checkout billing table commands.
//!
//! # Usage
//!
//! ```bash
//! # Create the table (idempotent)
//! smilepet-cli billing setup
//!
//! # Insert one record from flags or a JSON file
//! smilepet-cli billing insert --owner 42 --email ana@example.com --name "Ana" --city "São Paulo"
//! smilepet-cli billing insert --file billing.json
//!
//! # Print recent records as JSON
//! smilepet-cli billing list --owner 42 --limit 5
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `NEON_DATABASE_URL` - used when `DATABASE_URL` is unset

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use thiserror::Error;

use smilepet_core::{BillingDetails, Email};

/// Errors that can occur during billing operations.
#[derive(Debug, Error)]
pub enum BillingError {
    /// Neither database URL variable is set.
    #[error("Missing environment variable: DATABASE_URL (or NEON_DATABASE_URL)")]
    MissingDatabaseUrl,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Input file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input file is not a valid billing record.
    #[error("Invalid billing JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Record has no owner tag.
    #[error("--owner is required (user id or email)")]
    MissingOwner,

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),
}

/// A billing record as inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingRecord {
    /// User id or email the record belongs to.
    pub owner: String,
    #[serde(default)]
    pub email: Option<Email>,
    #[serde(flatten)]
    pub billing: BillingDetails,
}

/// A stored billing record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredBilling {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: BillingRecord,
}

/// Flag values for `billing insert`.
#[derive(Debug, Default, Clone)]
pub struct InsertInput {
    pub file: Option<PathBuf>,
    pub owner: Option<String>,
    pub email: Option<String>,
    pub billing: BillingDetails,
}

const CREATE_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS checkout_billing (
    id          BIGSERIAL PRIMARY KEY,
    owner       TEXT NOT NULL,
    email       TEXT,
    name        TEXT NOT NULL DEFAULT '',
    document    TEXT NOT NULL DEFAULT '',
    phone       TEXT NOT NULL DEFAULT '',
    postal_code TEXT NOT NULL DEFAULT '',
    street      TEXT NOT NULL DEFAULT '',
    number      TEXT NOT NULL DEFAULT '',
    complement  TEXT,
    district    TEXT NOT NULL DEFAULT '',
    city        TEXT NOT NULL DEFAULT '',
    state       TEXT NOT NULL DEFAULT '',
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
)";

const CREATE_OWNER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS checkout_billing_owner_idx
    ON checkout_billing (owner, created_at DESC)";

/// Pick the connection string: `DATABASE_URL`, then `NEON_DATABASE_URL`.
fn database_url_from(
    database_url: Option<String>,
    neon_url: Option<String>,
) -> Result<String, BillingError> {
    database_url
        .filter(|url| !url.is_empty())
        .or_else(|| neon_url.filter(|url| !url.is_empty()))
        .ok_or(BillingError::MissingDatabaseUrl)
}

async fn connect() -> Result<PgPool, BillingError> {
    dotenvy::dotenv().ok();

    let url = database_url_from(
        std::env::var("DATABASE_URL").ok(),
        std::env::var("NEON_DATABASE_URL").ok(),
    )?;

    tracing::info!("Connecting to database...");
    Ok(PgPool::connect(&url).await?)
}

/// Create the `checkout_billing` table if it does not exist.
///
/// # Errors
///
/// Returns error if the database is unreachable or the DDL fails.
pub async fn setup() -> Result<(), BillingError> {
    let pool = connect().await?;

    sqlx::query(CREATE_TABLE).execute(&pool).await?;
    sqlx::query(CREATE_OWNER_INDEX).execute(&pool).await?;

    tracing::info!("checkout_billing table ready");
    Ok(())
}

/// Read a record from a JSON file.
fn record_from_file(path: &Path) -> Result<BillingRecord, BillingError> {
    let raw = std::fs::read_to_string(path).map_err(|source| BillingError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}

/// Build the record to insert from flags or `--file`.
///
/// # Errors
///
/// Returns error if the owner is missing, the email is invalid or the file
/// cannot be parsed.
pub fn build_record(input: InsertInput) -> Result<BillingRecord, BillingError> {
    let mut record = match input.file {
        Some(path) => record_from_file(&path)?,
        None => BillingRecord {
            owner: input.owner.unwrap_or_default(),
            email: input
                .email
                .as_deref()
                .map(|raw| Email::parse(raw).map_err(|e| BillingError::InvalidEmail(e.to_string())))
                .transpose()?,
            billing: input.billing,
        },
    };

    record.owner = record.owner.trim().to_string();
    if record.owner.is_empty() {
        return Err(BillingError::MissingOwner);
    }
    Ok(record)
}

/// Insert one record and return its id.
///
/// Document and postal code are stored as digits only.
///
/// # Errors
///
/// Returns error if the input is invalid or the insert fails.
pub async fn insert(input: InsertInput) -> Result<i64, BillingError> {
    let record = build_record(input)?;
    let pool = connect().await?;
    let billing = &record.billing;

    let id: i64 = sqlx::query_scalar(
        r"
        INSERT INTO checkout_billing
            (owner, email, name, document, phone, postal_code, street, number,
             complement, district, city, state)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING id
        ",
    )
    .bind(&record.owner)
    .bind(record.email.as_ref())
    .bind(&billing.name)
    .bind(billing.document_digits())
    .bind(&billing.phone)
    .bind(billing.postal_code_digits())
    .bind(&billing.street)
    .bind(&billing.number)
    .bind(billing.complement.as_deref())
    .bind(&billing.district)
    .bind(&billing.city)
    .bind(billing.state.to_uppercase())
    .fetch_one(&pool)
    .await?;

    tracing::info!(id, owner = %record.owner, "Billing record inserted");
    Ok(id)
}

/// Most recent records, optionally for one owner.
///
/// # Errors
///
/// Returns error if the query fails.
pub async fn list(owner: Option<&str>, limit: i64) -> Result<Vec<StoredBilling>, BillingError> {
    let pool = connect().await?;

    let rows = sqlx::query(
        r"
        SELECT id, owner, email, name, document, phone, postal_code, street, number,
               complement, district, city, state, created_at
        FROM checkout_billing
        WHERE $1::TEXT IS NULL OR owner = $1
        ORDER BY created_at DESC, id DESC
        LIMIT $2
        ",
    )
    .bind(owner)
    .bind(limit.clamp(1, 1000))
    .fetch_all(&pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<StoredBilling, BillingError> {
            Ok(StoredBilling {
                id: row.try_get("id")?,
                created_at: row.try_get("created_at")?,
                record: BillingRecord {
                    owner: row.try_get("owner")?,
                    email: row.try_get("email")?,
                    billing: BillingDetails {
                        name: row.try_get("name")?,
                        document: row.try_get("document")?,
                        phone: row.try_get("phone")?,
                        postal_code: row.try_get("postal_code")?,
                        street: row.try_get("street")?,
                        number: row.try_get("number")?,
                        complement: row.try_get("complement")?,
                        district: row.try_get("district")?,
                        city: row.try_get("city")?,
                        state: row.try_get("state")?,
                    },
                },
            })
        })
        .collect()
}
