//! Periodic build refresh.
//!
//! One timer for the process lifetime. The timer itself is never
//! cancelled; each tick is gated by a visibility check in the update
//! handler, so no work (and no network traffic) happens while another
//! view is active. Tick-driven refreshes swallow errors -- only
//! explicit user refreshes surface banners.

use std::time::Duration;

use owbc_core::prelude::*;
use tokio::sync::mpsc::UnboundedSender;

use crate::message::Message;
use crate::state::{AppState, View};

/// Fixed poll interval for build state.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Spawn the poll timer. Runs until the receiving side of the channel
/// is dropped at process exit.
pub fn spawn(tx: UnboundedSender<Message>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(POLL_INTERVAL);
        // The first tick of a tokio interval fires immediately; the
        // initial view refresh already covers it.
        interval.tick().await;
        loop {
            interval.tick().await;
            if tx.send(Message::PollTick).is_err() {
                debug!("poll channel closed, stopping timer");
                break;
            }
        }
    });
}

/// Whether a tick should trigger a refresh right now.
pub fn should_poll(state: &AppState) -> bool {
    state.view == View::Builds
}
