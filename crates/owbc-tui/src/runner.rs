//! Main event loop: terminal, engine, and task runner wired together.
//!
//! Single-threaded and cooperative. Each iteration draws a frame, picks
//! up one message (poll timer first, then terminal input), and runs the
//! update plus any task it produced to completion before drawing again.
//! Tasks therefore always see the state exactly as the triggering
//! update left it.

use owbc_api::ApiClient;
use owbc_app::handler::Task;
use owbc_app::message::Message;
use owbc_app::state::{AppState, View};
use owbc_app::{poller, tasks, update};
use owbc_core::prelude::*;
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::{event, render};

/// Run the console until the user quits.
pub async fn run(mut state: AppState, mut api: ApiClient) -> Result<()> {
    install_panic_hook();
    let mut term = ratatui::init();

    let (tx, mut rx) = mpsc::unbounded_channel();
    poller::spawn(tx);

    // Populate the starting view before the first frame.
    tasks::run(Task::RefreshLists, &mut state, &mut api).await;
    debug_assert_eq!(state.view, View::Lists);

    let result = event_loop(&mut term, &mut state, &mut api, &mut rx).await;
    ratatui::restore();
    result
}

/// A panic inside a draw closure would otherwise leave the terminal in
/// the alternate screen with raw mode on; restore it before the default
/// handler prints the message.
fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        previous(info);
    }));
}

async fn event_loop(
    term: &mut ratatui::DefaultTerminal,
    state: &mut AppState,
    api: &mut ApiClient,
    rx: &mut UnboundedReceiver<Message>,
) -> Result<()> {
    while state.running {
        term.draw(|frame| render::view(frame, state))
            .context("failed to draw frame")?;

        // Poll ticks first so a backlog never starves under key input;
        // otherwise block briefly on the terminal.
        let message = match rx.try_recv() {
            Ok(message) => Some(message),
            Err(_) => event::poll()?,
        };

        let mut next = message;
        while let Some(message) = next.take() {
            let result = update(state, message);
            if let Some(task) = result.task {
                tasks::run(task, state, api).await;
            }
            next = result.message;
        }
    }
    info!("console exiting");
    Ok(())
}
