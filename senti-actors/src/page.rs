//! Actor that owns the page state and runs its side effects.
//!
//! Requests and the feedback timer run as spawned tasks that report back
//! through the actor's own mailbox, so the mailbox never blocks on the
//! network and a newer submission can always get in.

use crate::actor::{Actor, Addr, Context};
use anyhow::Result;
use async_trait::async_trait;
use senti_api::{ApiError, FeedbackAck, SentimentApi};
use senti_common::{Mode, Model, Sentiment};
use senti_page::{ControllerSettings, Displayed, Effect, Notice, PageController, PageView, Ticket};
use std::sync::Arc;
use tokio::{sync::mpsc, task::JoinHandle};

pub enum PageMsg {
    SetText(String),
    SetModel(Model),
    SetMode(Mode),
    Submit,
    AnswerCorrect,
    AnswerIncorrect,
    ChooseLabel(Sentiment),
    SubmitCorrection,

    PredictionDone {
        ticket: Ticket,
        outcome: Result<Displayed, ApiError>,
    },
    FeedbackDue(Ticket),
    FeedbackDone {
        ticket: Ticket,
        outcome: Result<FeedbackAck, ApiError>,
    },
}

/// Published to the view after each handled message.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    View(PageView),
    Notice(Notice),
}

pub struct PageActor {
    api: Arc<dyn SentimentApi>,
    page: PageController,
    events: mpsc::UnboundedSender<PageEvent>,
    feedback_timer: Option<JoinHandle<()>>,
}

impl PageActor {
    pub fn new(
        api: Arc<dyn SentimentApi>,
        settings: ControllerSettings,
        events: mpsc::UnboundedSender<PageEvent>,
    ) -> Self {
        let actor = Self {
            api,
            page: PageController::new(settings),
            events,
            feedback_timer: None,
        };
        actor.publish_view();
        actor
    }

    fn publish_view(&self) {
        let _ = self.events.send(PageEvent::View(self.page.view()));
    }

    fn publish_notices(&mut self) {
        for notice in self.page.take_notices() {
            tracing::debug!(title = %notice.title, message = %notice.message, "page.notice");
            let _ = self.events.send(PageEvent::Notice(notice));
        }
    }

    fn cancel_feedback_timer(&mut self) {
        if let Some(handle) = self.feedback_timer.take() {
            handle.abort();
        }
    }

    fn run(&mut self, effect: Effect, me: Addr<PageActor>) {
        match effect {
            Effect::PredictSingle {
                ticket,
                text,
                model,
            } => {
                let api = self.api.clone();
                tokio::spawn(async move {
                    let outcome = api
                        .predict_single(&text, model)
                        .await
                        .map(Displayed::Single);
                    let _ = me.send(PageMsg::PredictionDone { ticket, outcome }).await;
                });
            }
            Effect::PredictBatch {
                ticket,
                lines,
                model,
            } => {
                let api = self.api.clone();
                tokio::spawn(async move {
                    let outcome = api
                        .predict_batch(&lines, model)
                        .await
                        .map(Displayed::Batch);
                    let _ = me.send(PageMsg::PredictionDone { ticket, outcome }).await;
                });
            }
            Effect::ArmFeedbackPrompt { ticket, delay } => {
                self.cancel_feedback_timer();
                self.feedback_timer = Some(tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = me.send(PageMsg::FeedbackDue(ticket)).await;
                }));
            }
            Effect::SubmitFeedback { ticket, record } => {
                let api = self.api.clone();
                tokio::spawn(async move {
                    let outcome = api.submit_feedback(&record).await;
                    let _ = me.send(PageMsg::FeedbackDone { ticket, outcome }).await;
                });
            }
        }
    }
}

impl Drop for PageActor {
    fn drop(&mut self) {
        self.cancel_feedback_timer();
    }
}

#[async_trait]
impl Actor for PageActor {
    type Msg = PageMsg;

    async fn handle(&mut self, msg: Self::Msg, ctx: &mut Context<Self>) -> Result<()> {
        let effect = match msg {
            PageMsg::SetText(text) => {
                self.page.set_text(text);
                // The input box renders its own text.
                return Ok(());
            }
            PageMsg::SetModel(model) => {
                self.page.set_model(model);
                None
            }
            PageMsg::SetMode(mode) => {
                self.page.set_mode(mode);
                None
            }
            PageMsg::Submit => match self.page.submit() {
                Ok(effect) => {
                    self.cancel_feedback_timer();
                    Some(effect)
                }
                Err(_) => None,
            },
            PageMsg::AnswerCorrect => self.page.answer_correct(),
            PageMsg::AnswerIncorrect => {
                self.page.answer_incorrect();
                None
            }
            PageMsg::ChooseLabel(label) => {
                self.page.choose_label(label);
                None
            }
            PageMsg::SubmitCorrection => self.page.submit_correction(),
            PageMsg::PredictionDone { ticket, outcome } => {
                self.page.complete_prediction(ticket, outcome)
            }
            PageMsg::FeedbackDue(ticket) => {
                if self.page.is_current(ticket) {
                    self.feedback_timer = None;
                }
                self.page.feedback_due(ticket);
                None
            }
            PageMsg::FeedbackDone { ticket, outcome } => {
                self.page.complete_feedback(ticket, outcome);
                None
            }
        };

        if let Some(effect) = effect {
            self.run(effect, ctx.addr());
        }
        self.publish_notices();
        self.publish_view();
        Ok(())
    }
}
