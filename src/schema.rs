//! Database schema management for `aarogya-sentinel`.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs` when the postgres backend is selected.

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates `readings`, `symptom_reports` and `alerts`. Safe to call on every
/// startup; no-op if objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    // Water-quality readings. `seq` orders readings that share a timestamp.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS readings (
            id          UUID             PRIMARY KEY,
            seq         BIGSERIAL        NOT NULL,
            village     TEXT             NOT NULL,
            ph          DOUBLE PRECISION NOT NULL,
            turbidity   DOUBLE PRECISION NOT NULL,
            tds         DOUBLE PRECISION NOT NULL,
            lat         DOUBLE PRECISION,
            lng         DOUBLE PRECISION,
            recorded_at TIMESTAMPTZ      NOT NULL DEFAULT now()
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS symptom_reports (
            id           UUID        PRIMARY KEY,
            name         TEXT,
            age          INTEGER,
            gender       TEXT        NOT NULL,
            contact      TEXT,
            village      TEXT        NOT NULL,
            state        TEXT        NOT NULL,
            district     TEXT        NOT NULL,
            symptoms     TEXT        NOT NULL,
            disease      TEXT,
            water_source TEXT        NOT NULL DEFAULT 'Other',
            image_name   TEXT,
            remarks      TEXT,
            reported_at  TIMESTAMPTZ NOT NULL DEFAULT now()
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS alerts (
            id           UUID        PRIMARY KEY,
            seq          BIGSERIAL   NOT NULL,
            village      TEXT        NOT NULL,
            kind         TEXT        NOT NULL CHECK (kind IN ('water', 'disease')),
            message      TEXT        NOT NULL,
            status       TEXT        NOT NULL DEFAULT 'unresolved'
                                     CHECK (status IN ('unresolved', 'resolved')),
            triggered_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // At most one open alert per (village, kind); inserts rely on this for ON CONFLICT.
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS uq_alerts_open
            ON alerts (village, kind)
            WHERE status = 'unresolved';
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Basic indexes for common queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_readings_village_time
            ON readings (village, recorded_at DESC);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_symptom_reports_village_time
            ON symptom_reports (village, reported_at DESC);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_alerts_status_time
            ON alerts (status, triggered_at DESC);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
