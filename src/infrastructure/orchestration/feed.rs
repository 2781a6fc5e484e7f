//! Market data listener task.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::application::feed::FeedAdapter;
use crate::application::lifecycle::wait_for_shutdown;
use crate::domain::id::TokenId;
use crate::port::MarketDataStream;

/// Connect, subscribe, then forward events into the feed adapter until
/// shutdown.
///
/// A failed first connect is not fatal: the stream keeps retrying while the
/// REST fallback covers the gap.
pub(crate) async fn run_feed<S: MarketDataStream>(
    mut stream: S,
    tokens: Vec<TokenId>,
    feed: Arc<FeedAdapter>,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(
        exchange = stream.exchange_name(),
        tokens = tokens.len(),
        "Starting market data feed"
    );

    tokio::select! {
        () = wait_for_shutdown(&mut shutdown) => return,
        () = start(&mut stream, &tokens) => {}
    }

    loop {
        tokio::select! {
            () = wait_for_shutdown(&mut shutdown) => break,
            event = stream.next_event() => match event {
                Some(event) => feed.handle_event(event),
                None => {
                    warn!("Market data stream ended");
                    break;
                }
            },
        }
    }

    if let Err(e) = stream.close().await {
        debug!(error = %e, "Error closing market data stream");
    }
    info!("Market data feed stopped");
}

async fn start<S: MarketDataStream>(stream: &mut S, tokens: &[TokenId]) {
    if let Err(e) = stream.connect().await {
        warn!(error = %e, "Market data unavailable at startup, polling over REST");
    }
    if let Err(e) = stream.subscribe(tokens).await {
        warn!(error = %e, "Subscribe failed, will retry after reconnect");
    }
}
