//! Interaction logic for the sentiment page: input validation and the
//! prediction / feedback state machine. No I/O happens here.

pub mod controller;
pub mod validate;

pub use controller::{
    ControllerSettings, Displayed, Effect, FeedbackPhase, Notice, NoticeLevel, PageController,
    PageView, Phase, Ticket,
};
pub use validate::{Submission, ValidationError, batch_lines, validate};
