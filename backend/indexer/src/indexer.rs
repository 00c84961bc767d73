//! Long-running background task that polls the Soroban RPC and writes
//! decoded confidential ledger events to the database.
//!
//! Terminal moments in a project's life (finalization, withdrawal) are
//! logged individually; the funding stream is summarised per poll.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sqlx::SqlitePool;
use tracing::{error, info};

use crate::config::Config;
use crate::db;
use crate::events::LedgerEvent;
use crate::rpc;

pub struct IndexerState {
    pub pool: SqlitePool,
    pub config: Config,
    pub client: Client,
}

/// Spawn the indexer loop as a background [`tokio`] task.
pub async fn run(state: Arc<IndexerState>) {
    info!(
        "Indexer starting, ledger contract: {}",
        state.config.contract_id
    );

    let (mut current_ledger, mut cursor) = resume_point(&state).await;
    info!("Scanning from ledger {current_ledger}");

    loop {
        match poll_once(
            &state.pool,
            &state.client,
            &state.config,
            current_ledger,
            cursor.as_deref(),
        )
        .await
        {
            Ok((next_ledger, next_cursor)) => {
                current_ledger = next_ledger;
                cursor = next_cursor;
            }
            Err(e) => {
                error!("Poll iteration failed: {e}");
            }
        }

        tokio::time::sleep(Duration::from_secs(state.config.poll_interval_secs)).await;
    }
}

/// Where to start scanning: the persisted cursor if one exists, otherwise
/// the configured start ledger.
async fn resume_point(state: &IndexerState) -> (u32, Option<String>) {
    let last_ledger = db::get_last_ledger(&state.pool).await.unwrap_or(0);
    let cursor = db::get_cursor_string(&state.pool).await.unwrap_or(None);
    let ledger = if last_ledger > 0 {
        last_ledger as u32
    } else {
        state.config.start_ledger
    };
    (ledger, cursor)
}

/// Perform a single poll iteration.
///
/// Returns `(next_start_ledger, next_cursor)`.
async fn poll_once(
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

    if !raw_events.is_empty() {
        let decoded = rpc::decode_events(&raw_events, &config.contract_id);
        log_milestones(&decoded);

        let contributions = decoded
            .iter()
            .filter(|ev| ev.event_type == "contribution_received")
            .count();
        let inserted = db::insert_events(pool, &decoded).await?;
        info!(
            "Stored {inserted} new of {} decoded events ({contributions} contributions)",
            decoded.len()
        );
    }

    // While a pagination cursor is live the start ledger must not move, or
    // the next page request would skip records. Once the page stream is
    // drained, jump forward to the latest ledger RPC reported.
    let next_ledger = latest_ledger
        .map(|l| (l as u32).max(start_ledger))
        .unwrap_or(start_ledger);

    db::save_cursor(pool, next_ledger as i64, next_cursor.as_deref()).await?;

    Ok((next_ledger, next_cursor))
}

/// One log line per project lifecycle milestone in the batch.
fn log_milestones(decoded: &[LedgerEvent]) {
    for ev in decoded {
        let project = ev.project_id.as_deref().unwrap_or("?");
        match ev.event_type.as_str() {
            "project_finalized" => info!(
                project,
                status = ev.detail.as_deref().unwrap_or("?"),
                "project reached terminal status"
            ),
            "funds_withdrawn" => info!(project, "raised total released to creator"),
            _ => {}
        }
    }
}
