use anyhow::{Context, Result};
use senti_actors::{builder::Builder, page::PageActor};
use senti_api::{HttpSentimentApi, SentimentApi};
use senti_config::{ApiBase, SentiConfig, UiConfig};
use senti_page::ControllerSettings;
use senti_tui::{TuiActor, spawn_tui_feeders};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const PAGE_MAILBOX: usize = 256;
const TUI_MAILBOX: usize = 256;

pub struct Tether {
    builder: Builder,
}

impl Tether {
    pub fn new() -> Self {
        Self {
            builder: Builder::new(),
        }
    }
    pub fn builder_mut(&mut self) -> &mut Builder {
        &mut self.builder
    }
    pub async fn run(self) -> Result<()> {
        self.builder.run_until_ctrl_c().await
    }
}

pub fn controller_settings(ui: &UiConfig) -> ControllerSettings {
    ControllerSettings {
        default_model: ui.default_model,
        feedback_delay: Duration::from_millis(ui.feedback_delay_ms),
        max_batch_lines: ui.max_batch_lines,
    }
}

pub fn build_from_config(t: &mut Tether, cfg: &SentiConfig, base: &ApiBase) -> Result<()> {
    let b = t.builder_mut();
    let shutdown = b.shutdown_handle();

    // -------- PHASE 1: RESERVE --------
    let r_page = b.reserve::<PageActor>("page:main", PAGE_MAILBOX);
    let r_tui = b.reserve::<TuiActor>("tui:main", TUI_MAILBOX);

    // -------- PHASE 2: PAGE (owns the API client) --------
    let api: Arc<dyn SentimentApi> = Arc::new(
        HttpSentimentApi::new(base.as_str())
            .context("failed to build API client")?
            .with_timeout(Duration::from_secs(cfg.api.timeout_secs)),
    );
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    b.start_reserved(
        r_page,
        PageActor::new(api, controller_settings(&cfg.ui), events_tx),
    );

    // -------- PHASE 3: START TUI LAST --------
    let page_addr = b
        .addr::<PageActor>("page:main")
        .context("page actor not registered")?;
    let tui = TuiActor::new(page_addr, shutdown.clone())?;
    b.start_reserved(r_tui, tui);

    let tui_addr = b
        .addr::<TuiActor>("tui:main")
        .context("tui actor not registered")?;
    spawn_tui_feeders(tui_addr, events_rx, shutdown);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use senti_common::Model;
    use senti_config::SentiConfigLoader;

    #[test]
    fn settings_come_from_ui_section() {
        let cfg = SentiConfigLoader::new()
            .with_yaml_str("ui:\n  default_model: roberta2L\n  feedback_delay_ms: 1500\n  max_batch_lines: 4")
            .load()
            .unwrap();
        let s = controller_settings(&cfg.ui);
        assert_eq!(s.default_model, Model::Roberta2L);
        assert_eq!(s.feedback_delay, Duration::from_millis(1500));
        assert_eq!(s.max_batch_lines, 4);
    }
}
