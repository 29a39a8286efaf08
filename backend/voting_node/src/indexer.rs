//! Long-running background task that polls the Soroban RPC and writes
//! decoded voting events to the database.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::Config;
use crate::db;
use crate::rpc;

pub struct IndexerState {
    pub pool: SqlitePool,
    pub config: Config,
    pub client: Client,
}

/// Run the indexer loop until `shutdown` fires.
pub async fn run(state: Arc<IndexerState>, shutdown: CancellationToken) {
    info!("Indexer starting, contract: {}", state.config.contract_id);

    // Load the cursor from the DB; fall back to config start_ledger.
    let (last_ledger, saved_cursor) = match db::get_cursor(&state.pool).await {
        Ok(saved) => saved,
        Err(e) => {
            error!("Could not read indexer cursor: {e}");
            (0, None)
        }
    };

    let mut current_ledger = if last_ledger > 0 {
        u32::try_from(last_ledger).unwrap_or(state.config.start_ledger)
    } else {
        state.config.start_ledger
    };
    let mut cursor = saved_cursor;

    info!("Resuming from ledger {current_ledger}");

    loop {
        let poll = poll_once(
            &state.pool,
            &state.client,
            &state.config,
            current_ledger,
            cursor.as_deref(),
        );

        tokio::select! {
            _ = shutdown.cancelled() => break,
            result = poll => match result {
                Ok((next_ledger, next_cursor)) => {
                    current_ledger = next_ledger;
                    cursor = next_cursor;
                }
                Err(e) => error!("Indexer poll error: {e}"),
            },
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(Duration::from_secs(state.config.poll_interval_secs)) => {}
        }
    }

    info!("Indexer stopped at ledger {current_ledger}");
}

/// Perform a single poll iteration.
///
/// Returns `(next_start_ledger, next_cursor)`.
pub async fn poll_once(
    pool: &SqlitePool,
    client: &Client,
    config: &Config,
    start_ledger: u32,
    cursor: Option<&str>,
) -> crate::errors::Result<(u32, Option<String>)> {
    let (raw_events, next_cursor, latest_ledger) = rpc::fetch_events(
        client,
        &config.rpc_url,
        &config.contract_id,
        start_ledger,
        cursor,
        config.events_per_page,
    )
    .await?;

    let decoded = rpc::decode_events(&raw_events, &config.contract_id);

    // Advance the ledger cursor:
    // - The RPC cursor string resumes pagination exactly where this page ended.
    // - The ledger only matters when no cursor is held, so move it to the
    //   latest known ledger.
    let next_ledger = latest_ledger
        .and_then(|l| u32::try_from(l).ok())
        .map(|l| l.max(start_ledger))
        .unwrap_or(start_ledger);
    let next_cursor = next_cursor.or_else(|| cursor.map(str::to_string));

    // Events and cursor land together so restarts are deterministic.
    let inserted = db::store_page(
        pool,
        &decoded,
        i64::from(next_ledger),
        next_cursor.as_deref(),
    )
    .await?;

    if !raw_events.is_empty() {
        info!(
            "Polled {} raw events → {} new records stored",
            raw_events.len(),
            inserted
        );
    }

    Ok((next_ledger, next_cursor))
}
