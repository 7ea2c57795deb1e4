use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use senti_common::Mode;
use senti_page::FeedbackPhase;

/// Which widget receives plain character keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Input,
    Feedback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Insert(char),
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleHelp,
    NextModel,
    PrevModel,
    ToggleMode,
    Submit,
    Newline,
    ClearInput,
    Answer(bool),
    /// Zero-based index into the model's correction labels.
    PickLabel(usize),
    SubmitCorrection,
    FocusInput,
    FocusFeedback,
    Edit(Edit),
}

/// The bits of UI state that change what a key means.
#[derive(Debug, Clone, Copy)]
pub struct KeyState {
    pub mode: Mode,
    pub focus: Focus,
    pub feedback: FeedbackPhase,
    pub help_open: bool,
}

pub fn map_key(key: KeyEvent, st: KeyState) -> Option<Action> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    match key.code {
        KeyCode::Char('c') | KeyCode::Char('q') if ctrl => return Some(Action::Quit),
        _ => {}
    }

    if st.help_open {
        return match key.code {
            KeyCode::F(1) | KeyCode::Esc => Some(Action::ToggleHelp),
            _ => None,
        };
    }

    match key.code {
        KeyCode::F(1) => return Some(Action::ToggleHelp),
        KeyCode::F(2) | KeyCode::Tab => return Some(Action::NextModel),
        KeyCode::BackTab => return Some(Action::PrevModel),
        KeyCode::F(3) => return Some(Action::ToggleMode),
        KeyCode::F(4) if feedback_open(st.feedback) => return Some(Action::FocusFeedback),
        KeyCode::Enter if ctrl || alt => return Some(Action::Submit),
        KeyCode::Char('s') if ctrl => return Some(Action::Submit),
        _ => {}
    }

    if st.focus == Focus::Feedback {
        if let Some(consumed) = map_feedback_key(key, st.feedback) {
            return consumed;
        }
    }

    match key.code {
        KeyCode::Enter => Some(match st.mode {
            Mode::Single => Action::Submit,
            Mode::Batch => Action::Newline,
        }),
        KeyCode::Esc => Some(Action::ClearInput),
        KeyCode::Left => Some(Action::Edit(Edit::Left)),
        KeyCode::Right => Some(Action::Edit(Edit::Right)),
        KeyCode::Home => Some(Action::Edit(Edit::Home)),
        KeyCode::End => Some(Action::Edit(Edit::End)),
        KeyCode::Backspace => Some(Action::Edit(Edit::Backspace)),
        KeyCode::Delete => Some(Action::Edit(Edit::Delete)),
        KeyCode::Char(ch) if !ctrl && !alt => Some(Action::Edit(Edit::Insert(ch))),
        _ => None,
    }
}

fn feedback_open(phase: FeedbackPhase) -> bool {
    matches!(phase, FeedbackPhase::Question | FeedbackPhase::Correction)
}

/// Keys the feedback widget consumes. `Some(None)` swallows the key;
/// `None` lets it fall through to the input box.
fn map_feedback_key(key: KeyEvent, phase: FeedbackPhase) -> Option<Option<Action>> {
    let action = match (phase, key.code) {
        (_, KeyCode::Esc) => Action::FocusInput,
        (FeedbackPhase::Question, KeyCode::Char('y' | 'Y')) => Action::Answer(true),
        (FeedbackPhase::Question, KeyCode::Char('n' | 'N')) => Action::Answer(false),
        (FeedbackPhase::Question, KeyCode::Enter) => return Some(None),
        (FeedbackPhase::Correction, KeyCode::Char(ch @ '1'..='3')) => {
            Action::PickLabel(ch as usize - '1' as usize)
        }
        (FeedbackPhase::Correction, KeyCode::Enter) => Action::SubmitCorrection,
        _ => return None,
    };
    Some(Some(action))
}
