//! Database layer: migrations, event writes, the voting projection and
//! cursor management.

use sqlx::{sqlite::SqlitePoolOptions, Sqlite, SqlitePool, Transaction};
use tracing::info;

use crate::errors::Result;
use crate::events::{DecodedEvent, EventKind, EventRecord, VotingRecord};

/// Establish a SQLite connection pool and run pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    let mut url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };

    // Every in-memory connection is its own database; keep exactly one.
    let in_memory = url.contains(":memory:");
    let max_connections = if in_memory { 1 } else { 5 };

    // Make sure the file is created if it doesn't exist yet.
    if !in_memory && !url.contains('?') {
        url.push_str("?mode=rwc");
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(&url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied successfully");
    Ok(pool)
}

// ─────────────────────────────────────────────────────────
// Cursor helpers
// ─────────────────────────────────────────────────────────

/// Read the saved `(last_ledger, last_cursor)` pair.
/// Returns `(0, None)` when nothing has been indexed yet.
pub async fn get_cursor(pool: &SqlitePool) -> Result<(i64, Option<String>)> {
    let row: Option<(i64, Option<String>)> =
        sqlx::query_as("SELECT last_ledger, last_cursor FROM indexer_cursor WHERE id = 1")
            .fetch_optional(pool)
            .await?;
    Ok(row.unwrap_or((0, None)))
}

// ─────────────────────────────────────────────────────────
// Event writes
// ─────────────────────────────────────────────────────────

/// Persist one page of decoded events, fold the new ones into the
/// `votings` projection and save the cursor, all in one transaction.
///
/// Events whose `event_id` is already stored are ignored, so a page that
/// is delivered twice changes nothing. Returns the number of new events.
pub async fn store_page(
    pool: &SqlitePool,
    events: &[DecodedEvent],
    next_ledger: i64,
    next_cursor: Option<&str>,
) -> Result<usize> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for ev in events {
        let rows_affected = sqlx::query(
            r#"
            INSERT OR IGNORE INTO events
                (event_id, event_type, voting_id, actor, detail, payload,
                 ledger, timestamp, contract_id, tx_hash)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&ev.event_id)
        .bind(ev.kind.as_str())
        .bind(ev.voting_id)
        .bind(&ev.actor)
        .bind(&ev.detail)
        .bind(ev.payload.to_string())
        .bind(ev.ledger)
        .bind(ev.timestamp)
        .bind(&ev.contract_id)
        .bind(&ev.tx_hash)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if rows_affected > 0 {
            project(&mut tx, ev).await?;
            count += 1;
        }
    }

    sqlx::query("UPDATE indexer_cursor SET last_ledger = ?1, last_cursor = ?2 WHERE id = 1")
        .bind(next_ledger)
        .bind(next_cursor)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(count)
}

/// Apply one newly stored event to the `votings` projection.
async fn project(tx: &mut Transaction<'_, Sqlite>, ev: &DecodedEvent) -> Result<()> {
    let Some(voting_id) = ev.voting_id else {
        return Ok(());
    };

    match ev.kind {
        EventKind::VotingCreated => {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO votings (voting_id, owner, question, time_end, created_ledger)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(voting_id)
            .bind(ev.actor.as_deref().unwrap_or_default())
            .bind(ev.detail.as_deref().unwrap_or_default())
            .bind(ev.payload["time_end"].as_i64().unwrap_or(0))
            .bind(ev.ledger)
            .execute(&mut **tx)
            .await?;
        }
        EventKind::VoterRegistered => {
            sqlx::query("UPDATE votings SET registered = registered + 1 WHERE voting_id = ?1")
                .bind(voting_id)
                .execute(&mut **tx)
                .await?;
        }
        EventKind::VoterVoted => {
            sqlx::query("UPDATE votings SET ballots = ballots + 1 WHERE voting_id = ?1")
                .bind(voting_id)
                .execute(&mut **tx)
                .await?;
        }
        EventKind::VotingClosed => {
            sqlx::query("UPDATE votings SET closed = 1, winner = ?2 WHERE voting_id = ?1")
                .bind(voting_id)
                .bind(&ev.detail)
                .execute(&mut **tx)
                .await?;
        }
        EventKind::Unknown => {}
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Event reads
// ─────────────────────────────────────────────────────────

const EVENT_COLUMNS: &str = "id, event_id, event_type, voting_id, actor, detail, payload, \
                             ledger, timestamp, contract_id, tx_hash, created_at";

/// Fetch all events for a given voting, ordered by ledger ascending.
pub async fn get_events_for_voting(pool: &SqlitePool, voting_id: i64) -> Result<Vec<EventRecord>> {
    let rows = sqlx::query_as::<_, EventRecord>(&format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE voting_id = ?1 ORDER BY ledger ASC, id ASC"
    ))
    .bind(voting_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Fetch all events, ordered by ledger ascending.
pub async fn get_all_events(pool: &SqlitePool) -> Result<Vec<EventRecord>> {
    let rows = sqlx::query_as::<_, EventRecord>(&format!(
        "SELECT {EVENT_COLUMNS} FROM events ORDER BY ledger ASC, id ASC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Close time of the newest indexed event, as a Unix timestamp.
pub async fn latest_event_timestamp(pool: &SqlitePool) -> Result<Option<i64>> {
    let row: (Option<i64>,) = sqlx::query_as("SELECT MAX(timestamp) FROM events")
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

// ─────────────────────────────────────────────────────────
// Projection reads
// ─────────────────────────────────────────────────────────

const VOTING_COLUMNS: &str =
    "voting_id, owner, question, time_end, registered, ballots, closed, winner, created_ledger";

/// All indexed votings, by id.
pub async fn get_votings(pool: &SqlitePool) -> Result<Vec<VotingRecord>> {
    let rows = sqlx::query_as::<_, VotingRecord>(&format!(
        "SELECT {VOTING_COLUMNS} FROM votings ORDER BY voting_id ASC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_voting(pool: &SqlitePool, voting_id: i64) -> Result<Option<VotingRecord>> {
    let row = sqlx::query_as::<_, VotingRecord>(&format!(
        "SELECT {VOTING_COLUMNS} FROM votings WHERE voting_id = ?1"
    ))
    .bind(voting_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Votings whose deadline has passed at `now` but that were never closed.
pub async fn get_due_votings(pool: &SqlitePool, now: i64) -> Result<Vec<VotingRecord>> {
    let rows = sqlx::query_as::<_, VotingRecord>(&format!(
        "SELECT {VOTING_COLUMNS} FROM votings \
         WHERE closed = 0 AND time_end <= ?1 ORDER BY time_end ASC, voting_id ASC"
    ))
    .bind(now)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
