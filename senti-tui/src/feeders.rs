use crate::tui::{TuiActor, TuiMsg};
use senti_actors::PageEvent;
use senti_actors::actor::Addr;
use senti_actors::system::ShutdownHandle;
use std::time::Duration;
use tokio::{self, sync::mpsc, time};

/// Background tasks that feed the TUI actor: terminal input, redraw ticks and
/// page events. All of them stop on shutdown.
pub fn spawn_tui_feeders(
    tui: Addr<TuiActor>,
    mut page_events: mpsc::UnboundedReceiver<PageEvent>,
    shutdown: ShutdownHandle,
) {
    let tui_in = tui.clone();
    let mut shutdown_input = shutdown.subscribe();
    tokio::spawn(async move {
        loop {
            // Poll with a timeout so the blocking read never outlives shutdown by much.
            let polled = tokio::task::spawn_blocking(|| {
                match crossterm::event::poll(Duration::from_millis(100)) {
                    Ok(true) => crossterm::event::read().map(Some),
                    Ok(false) => Ok(None),
                    Err(e) => Err(e),
                }
            });
            tokio::select! {
                _ = shutdown_input.recv() => break,
                ev = polled => {
                    match ev {
                        Ok(Ok(Some(e))) => {
                            if tui_in.send(TuiMsg::InputEvent(e)).await.is_err() {
                                break;
                            }
                        }
                        Ok(Ok(None)) => {}
                        Ok(Err(e)) => {
                            let _ = tui_in.send(TuiMsg::OpError(format!("input: {e}"))).await;
                        }
                        Err(_) => break,
                    }
                }
            }
        }
    });

    let tui_tick = tui.clone();
    let mut shutdown_tick = shutdown.subscribe();
    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_millis(80));
        loop {
            tokio::select! {
                _ = shutdown_tick.recv() => break,
                _ = interval.tick() => {
                    let _ = tui_tick.try_send(TuiMsg::Tick);
                }
            }
        }
    });

    let mut shutdown_page = shutdown.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown_page.recv() => break,
                ev = page_events.recv() => {
                    let Some(ev) = ev else { break };
                    if tui.send(TuiMsg::Page(ev)).await.is_err() {
                        break;
                    }
                }
            }
        }
    });
}
