//! Page state machine.
//!
//! [`PageController`] owns every piece of mutable page state and decides what
//! happens next, but never performs I/O itself. Operations that need the
//! network or a timer return an [`Effect`]; the runtime executes it and feeds
//! the outcome back through `complete_*` / [`PageController::feedback_due`].
//!
//! Every effect carries the [`Ticket`] that was current when it was issued.
//! A completion whose ticket is no longer current belongs to a superseded
//! submission and is dropped, so the last submit always wins.

use crate::validate::{validate, Submission, ValidationError};
use senti_api::{ApiError, FeedbackAck};
use senti_common::{BatchResult, FeedbackRecord, Mode, Model, PredictionResult, Sentiment};
use std::time::Duration;

/// Generation number of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Resulted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedbackPhase {
    #[default]
    None,
    Question,
    Correction,
    Done,
}

/// What the page is currently showing.
#[derive(Debug, Clone, PartialEq)]
pub enum Displayed {
    Single(PredictionResult),
    Batch(BatchResult),
}

/// Work the runtime must carry out on the controller's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    PredictSingle {
        ticket: Ticket,
        text: String,
        model: Model,
    },
    PredictBatch {
        ticket: Ticket,
        lines: Vec<String>,
        model: Model,
    },
    /// Call [`PageController::feedback_due`] with `ticket` once `delay` has
    /// elapsed, unless a newer submission started in the meantime.
    ArmFeedbackPrompt { ticket: Ticket, delay: Duration },
    SubmitFeedback {
        ticket: Ticket,
        record: FeedbackRecord,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A transient, non-blocking message for the user (a toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    fn error(title: &str, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.to_string(),
            message: message.into(),
        }
    }

    fn success(title: &str, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub default_model: Model,
    pub feedback_delay: Duration,
    pub max_batch_lines: usize,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            default_model: Model::default(),
            feedback_delay: Duration::from_millis(3000),
            max_batch_lines: 10,
        }
    }
}

/// Snapshot of everything a view needs to render the page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    pub model: Model,
    pub mode: Mode,
    pub phase: Phase,
    pub feedback: FeedbackPhase,
    pub result: Option<Displayed>,
    pub correction_labels: Vec<Sentiment>,
    pub chosen_label: Option<Sentiment>,
    pub feedback_in_flight: bool,
    pub max_batch_lines: usize,
    pub ticket: Ticket,
}

impl Default for PageView {
    fn default() -> Self {
        PageController::new(ControllerSettings::default()).view()
    }
}

pub struct PageController {
    settings: ControllerSettings,
    text: String,
    model: Model,
    mode: Mode,
    phase: Phase,
    feedback: FeedbackPhase,
    result: Option<Displayed>,
    prediction_id: Option<String>,
    chosen_label: Option<Sentiment>,
    feedback_in_flight: bool,
    generation: u64,
    notices: Vec<Notice>,
}

impl PageController {
    pub fn new(settings: ControllerSettings) -> Self {
        Self {
            model: settings.default_model,
            settings,
            text: String::new(),
            mode: Mode::Single,
            phase: Phase::Idle,
            feedback: FeedbackPhase::None,
            result: None,
            prediction_id: None,
            chosen_label: None,
            feedback_in_flight: false,
            generation: 0,
            notices: Vec::new(),
        }
    }

    // ----- inputs ---------------------------------------------------------

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Takes effect for future submissions only. The correction choices are
    /// re-derived from the new model immediately.
    pub fn set_model(&mut self, model: Model) {
        if self.model == model {
            return;
        }
        tracing::debug!(from = %self.model, to = %model, "page.model");
        self.model = model;
        if let Some(label) = self.chosen_label {
            if !model.labels().contains(&label) {
                self.chosen_label = None;
            }
        }
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            tracing::debug!(mode = mode.as_str(), "page.mode");
            self.mode = mode;
        }
    }

    // ----- prediction -----------------------------------------------------

    /// Validate the current text and start a prediction.
    ///
    /// On rejection a notice is queued and nothing else changes. On success
    /// the previous result, prediction id and feedback state are discarded
    /// before the request is issued.
    pub fn submit(&mut self) -> Result<Effect, ValidationError> {
        let submission = match validate(&self.text, self.mode, self.settings.max_batch_lines) {
            Ok(s) => s,
            Err(e) => {
                tracing::debug!(error = %e, "page.submit.rejected");
                self.notices.push(Notice::error(e.title(), e.to_string()));
                return Err(e);
            }
        };

        self.generation += 1;
        let ticket = Ticket(self.generation);
        self.phase = Phase::Loading;
        self.result = None;
        self.prediction_id = None;
        self.feedback = FeedbackPhase::None;
        self.chosen_label = None;
        self.feedback_in_flight = false;

        tracing::debug!(ticket = ticket.0, model = %self.model, mode = self.mode.as_str(), "page.submit");
        Ok(match submission {
            Submission::Single(text) => Effect::PredictSingle {
                ticket,
                text,
                model: self.model,
            },
            Submission::Batch(lines) => Effect::PredictBatch {
                ticket,
                lines,
                model: self.model,
            },
        })
    }

    /// Apply the outcome of a prediction request.
    ///
    /// Returns the feedback-prompt timer to arm for a single-mode success.
    pub fn complete_prediction(
        &mut self,
        ticket: Ticket,
        outcome: Result<Displayed, ApiError>,
    ) -> Option<Effect> {
        if !self.is_current(ticket) || self.phase != Phase::Loading {
            tracing::debug!(ticket = ticket.0, current = self.generation, "page.prediction.stale");
            return None;
        }

        match outcome {
            Ok(Displayed::Single(result)) => {
                tracing::debug!(ticket = ticket.0, label = %result.label, "page.prediction.single");
                self.prediction_id = result.id.clone();
                self.result = Some(Displayed::Single(result));
                self.phase = Phase::Resulted;
                self.prediction_id.as_ref().map(|_| Effect::ArmFeedbackPrompt {
                    ticket,
                    delay: self.settings.feedback_delay,
                })
            }
            Ok(Displayed::Batch(result)) => {
                tracing::debug!(ticket = ticket.0, lines = result.per_line.len(), "page.prediction.batch");
                self.result = Some(Displayed::Batch(result));
                self.phase = Phase::Resulted;
                None
            }
            Err(e) => {
                tracing::debug!(ticket = ticket.0, error = %e, "page.prediction.failed");
                self.phase = Phase::Idle;
                self.notices
                    .push(Notice::error("Analysis failed", e.user_message()));
                None
            }
        }
    }

    /// The feedback delay for `ticket` has elapsed. Returns whether the
    /// question is now shown.
    pub fn feedback_due(&mut self, ticket: Ticket) -> bool {
        let eligible = self.is_current(ticket)
            && self.phase == Phase::Resulted
            && self.feedback == FeedbackPhase::None
            && self.prediction_id.is_some()
            && matches!(self.result, Some(Displayed::Single(_)));
        if eligible {
            tracing::debug!(ticket = ticket.0, "page.feedback.question");
            self.feedback = FeedbackPhase::Question;
        }
        eligible
    }

    // ----- feedback -------------------------------------------------------

    /// "Yes, the prediction was correct."
    pub fn answer_correct(&mut self) -> Option<Effect> {
        if self.feedback != FeedbackPhase::Question || self.feedback_in_flight {
            return None;
        }
        let id = self.prediction_id.clone()?;
        self.feedback_in_flight = true;
        Some(Effect::SubmitFeedback {
            ticket: self.current_ticket(),
            record: FeedbackRecord::correct(id),
        })
    }

    /// "No": move on to the corrected-label picker without contacting the
    /// backend yet.
    pub fn answer_incorrect(&mut self) -> bool {
        if self.feedback != FeedbackPhase::Question || self.feedback_in_flight {
            return false;
        }
        self.feedback = FeedbackPhase::Correction;
        self.chosen_label = None;
        true
    }

    /// Pick a corrected label. Labels the current model cannot produce are
    /// refused.
    pub fn choose_label(&mut self, label: Sentiment) -> bool {
        if self.feedback != FeedbackPhase::Correction
            || self.feedback_in_flight
            || !self.correction_labels().contains(&label)
        {
            return false;
        }
        self.chosen_label = Some(label);
        true
    }

    pub fn can_submit_correction(&self) -> bool {
        self.feedback == FeedbackPhase::Correction
            && !self.feedback_in_flight
            && self.chosen_label.is_some()
            && self.prediction_id.is_some()
    }

    pub fn submit_correction(&mut self) -> Option<Effect> {
        if !self.can_submit_correction() {
            return None;
        }
        let id = self.prediction_id.clone()?;
        let label = self.chosen_label?;
        self.feedback_in_flight = true;
        Some(Effect::SubmitFeedback {
            ticket: self.current_ticket(),
            record: FeedbackRecord::corrected(id, label),
        })
    }

    /// Apply the outcome of a feedback submission. Failures leave the
    /// current step in place so the user can try again.
    pub fn complete_feedback(&mut self, ticket: Ticket, outcome: Result<FeedbackAck, ApiError>) {
        if !self.is_current(ticket) || !self.feedback_in_flight {
            tracing::debug!(ticket = ticket.0, current = self.generation, "page.feedback.stale");
            return;
        }
        self.feedback_in_flight = false;
        match outcome {
            Ok(_) => {
                tracing::debug!(ticket = ticket.0, "page.feedback.done");
                self.feedback = FeedbackPhase::Done;
                self.notices.push(Notice::success(
                    "Feedback sent",
                    "Thanks for your feedback!",
                ));
            }
            Err(e) => {
                tracing::debug!(ticket = ticket.0, error = %e, "page.feedback.failed");
                self.notices
                    .push(Notice::error("Feedback failed", e.user_message()));
            }
        }
    }

    // ----- queries --------------------------------------------------------

    pub fn correction_labels(&self) -> &'static [Sentiment] {
        self.model.labels()
    }

    pub fn current_ticket(&self) -> Ticket {
        Ticket(self.generation)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.generation
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn feedback(&self) -> FeedbackPhase {
        self.feedback
    }

    pub fn model(&self) -> Model {
        self.model
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn result(&self) -> Option<&Displayed> {
        self.result.as_ref()
    }

    pub fn prediction_id(&self) -> Option<&str> {
        self.prediction_id.as_deref()
    }

    pub fn chosen_label(&self) -> Option<Sentiment> {
        self.chosen_label
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    /// Drain queued notices, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn view(&self) -> PageView {
        PageView {
            model: self.model,
            mode: self.mode,
            phase: self.phase,
            feedback: self.feedback,
            result: self.result.clone(),
            correction_labels: self.correction_labels().to_vec(),
            chosen_label: self.chosen_label,
            feedback_in_flight: self.feedback_in_flight,
            max_batch_lines: self.settings.max_batch_lines,
            ticket: self.current_ticket(),
        }
    }
}
