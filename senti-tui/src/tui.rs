use crate::{
    keymap::{Action, Edit, Focus, KeyState, map_key},
    view::{self, ViewSnap},
};
use anyhow::Result;
use async_trait::async_trait;
use crossterm::{
    event::{
        Event as CtEvent, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
        supports_keyboard_enhancement,
    },
};
use ratatui::{Terminal, backend::CrosstermBackend};
use senti_actors::{
    PageEvent, PageMsg,
    actor::{Actor, Addr, Context},
    page::PageActor,
    system::ShutdownHandle,
};
use senti_common::{Mode, Model};
use senti_page::{FeedbackPhase, Notice, PageView, Phase};
use std::{
    collections::VecDeque,
    io::{self, Stdout},
    time::{Duration, Instant},
};

const BRAILLE_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const NOTICE_TTL: Duration = Duration::from_secs(5);

/// Selector values changed locally that the page has not echoed back yet.
#[derive(Debug, Default, Clone, Copy)]
struct PendingSelection {
    model: Option<Model>,
    mode: Option<Mode>,
}

impl PendingSelection {
    /// Keeps unconfirmed local choices in `next`; an echo that matches one
    /// confirms it.
    fn reconcile(&mut self, next: &mut PageView) {
        if let Some(model) = self.model {
            if next.model == model {
                self.model = None;
            } else {
                next.model = model;
                next.correction_labels = model.labels().to_vec();
                if next
                    .chosen_label
                    .is_some_and(|l| !model.labels().contains(&l))
                {
                    next.chosen_label = None;
                }
            }
        }
        if let Some(mode) = self.mode {
            if next.mode == mode {
                self.mode = None;
            } else {
                next.mode = mode;
            }
        }
    }
}

pub enum TuiMsg {
    InputEvent(CtEvent),
    Tick,
    Page(PageEvent),
    OpError(String),
    Shutdown,
}

pub struct TuiActor {
    page: Addr<PageActor>,

    // terminal
    term: Terminal<CrosstermBackend<Stdout>>,
    keyboard_enhanced: bool,
    tick_rate: Duration,
    last_tick: Instant,

    // ui state
    input: String,
    input_cursor: usize,
    view: PageView,
    pending: PendingSelection,
    focus: Focus,
    notices: VecDeque<(Notice, Instant)>,
    help_open: bool,
    dirty: bool,
    spin_idx: usize,

    shutdown: ShutdownHandle,
}

impl TuiActor {
    pub fn new(page: Addr<PageActor>, shutdown: ShutdownHandle) -> Result<Self> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen)?;
        // Ctrl+Enter is only reported by terminals that speak the kitty protocol.
        let keyboard_enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
        if keyboard_enhanced {
            execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
            )?;
        }
        let backend = CrosstermBackend::new(stdout);
        let mut term = Terminal::new(backend)?;
        term.clear()?;

        Ok(Self {
            page,
            term,
            keyboard_enhanced,
            tick_rate: Duration::from_millis(80),
            last_tick: Instant::now(),
            input: String::new(),
            input_cursor: 0,
            view: PageView::default(),
            pending: PendingSelection::default(),
            focus: Focus::Input,
            notices: VecDeque::new(),
            help_open: false,
            dirty: true,
            spin_idx: 0,
            shutdown,
        })
    }

    fn restore_terminal(&mut self) {
        if self.keyboard_enhanced {
            let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
            self.keyboard_enhanced = false;
        }
        disable_raw_mode().ok();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }

    fn cursor_left(&mut self) {
        if self.input_cursor == 0 {
            return;
        }
        self.input_cursor -= 1;
        while self.input_cursor > 0 && !self.input.is_char_boundary(self.input_cursor) {
            self.input_cursor -= 1;
        }
    }

    fn cursor_right(&mut self) {
        if self.input_cursor >= self.input.len() {
            return;
        }
        self.input_cursor += 1;
        while self.input_cursor < self.input.len()
            && !self.input.is_char_boundary(self.input_cursor)
        {
            self.input_cursor += 1;
        }
    }

    /// Start of the current line.
    fn cursor_home(&mut self) {
        self.input_cursor = self.input[..self.input_cursor]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0);
    }

    /// End of the current line.
    fn cursor_end(&mut self) {
        self.input_cursor = self.input[self.input_cursor..]
            .find('\n')
            .map(|i| self.input_cursor + i)
            .unwrap_or(self.input.len());
    }

    fn insert_char(&mut self, ch: char) {
        self.input.insert(self.input_cursor, ch);
        self.input_cursor += ch.len_utf8();
    }

    fn backspace(&mut self) {
        if self.input_cursor == 0 {
            return;
        }
        let mut prev = self.input_cursor.saturating_sub(1);
        while prev > 0 && !self.input.is_char_boundary(prev) {
            prev -= 1;
        }
        self.input.drain(prev..self.input_cursor);
        self.input_cursor = prev;
    }

    fn delete(&mut self) {
        if self.input_cursor >= self.input.len() {
            return;
        }
        let start = self.input_cursor;
        let mut end = start + 1;
        while end < self.input.len() && !self.input.is_char_boundary(end) {
            end += 1;
        }
        self.input.drain(start..end);
    }

    fn edit(&mut self, op: Edit) {
        match op {
            Edit::Insert(ch) => self.insert_char(ch),
            Edit::Backspace => self.backspace(),
            Edit::Delete => self.delete(),
            Edit::Left => self.cursor_left(),
            Edit::Right => self.cursor_right(),
            Edit::Home => self.cursor_home(),
            Edit::End => self.cursor_end(),
        }
    }

    fn spinner(&self) -> &'static str {
        if self.view.phase == Phase::Loading {
            BRAILLE_FRAMES[self.spin_idx % BRAILLE_FRAMES.len()]
        } else {
            " "
        }
    }

    fn step_spinner(&mut self) {
        if self.view.phase == Phase::Loading {
            self.spin_idx = (self.spin_idx + 1) % BRAILLE_FRAMES.len();
            self.dirty = true;
        }
    }

    fn expire_notices(&mut self) {
        let before = self.notices.len();
        self.notices.retain(|(_, at)| at.elapsed() < NOTICE_TTL);
        if self.notices.len() != before {
            self.dirty = true;
        }
    }

    fn draw(&mut self) -> Result<()> {
        let snap = ViewSnap {
            input: &self.input,
            input_cursor: self.input_cursor,
            page: &self.view,
            focus: self.focus,
            notice: self.notices.back().map(|(n, _)| n),
            help_open: self.help_open,
            spinner: self.spinner(),
        };
        view::draw(&mut self.term, &snap)
    }

    fn key_state(&self) -> KeyState {
        KeyState {
            mode: self.view.mode,
            focus: self.focus,
            feedback: self.view.feedback,
            help_open: self.help_open,
        }
    }

    async fn to_page(&self, msg: PageMsg) {
        if self.page.send(msg).await.is_err() {
            tracing::warn!("page actor mailbox closed");
        }
    }

    /// Returns `false` when the UI should shut down.
    async fn apply(&mut self, action: Action) -> bool {
        self.dirty = true;
        match action {
            Action::Quit => return false,
            Action::ToggleHelp => self.help_open = !self.help_open,
            // Model and mode are updated locally too, so repeated presses
            // advance before the page echoes its view back.
            Action::NextModel => {
                self.view.model = self.view.model.next();
                self.pending.model = Some(self.view.model);
                self.to_page(PageMsg::SetModel(self.view.model)).await;
            }
            Action::PrevModel => {
                self.view.model = self.view.model.prev();
                self.pending.model = Some(self.view.model);
                self.to_page(PageMsg::SetModel(self.view.model)).await;
            }
            Action::ToggleMode => {
                self.view.mode = self.view.mode.toggled();
                self.pending.mode = Some(self.view.mode);
                self.to_page(PageMsg::SetMode(self.view.mode)).await;
            }
            Action::Submit => {
                self.focus = Focus::Input;
                self.to_page(PageMsg::SetText(self.input.clone())).await;
                self.to_page(PageMsg::Submit).await;
            }
            Action::Newline => self.insert_char('\n'),
            Action::ClearInput => {
                self.input.clear();
                self.input_cursor = 0;
            }
            Action::Answer(true) => self.to_page(PageMsg::AnswerCorrect).await,
            Action::Answer(false) => self.to_page(PageMsg::AnswerIncorrect).await,
            Action::PickLabel(idx) => {
                if let Some(label) = self.view.correction_labels.get(idx).copied() {
                    self.to_page(PageMsg::ChooseLabel(label)).await;
                }
            }
            Action::SubmitCorrection => self.to_page(PageMsg::SubmitCorrection).await,
            Action::FocusInput => self.focus = Focus::Input,
            Action::FocusFeedback => self.focus = Focus::Feedback,
            Action::Edit(op) => {
                self.focus = Focus::Input;
                self.edit(op);
            }
        }
        true
    }

    fn on_page_view(&mut self, mut next: PageView) {
        self.pending.reconcile(&mut next);
        let was = self.view.feedback;
        match next.feedback {
            FeedbackPhase::Question if was != FeedbackPhase::Question => {
                self.focus = Focus::Feedback
            }
            FeedbackPhase::None | FeedbackPhase::Done => self.focus = Focus::Input,
            _ => {}
        }
        self.view = next;
        self.dirty = true;
    }

    fn push_notice(&mut self, notice: Notice) {
        self.notices.push_back((notice, Instant::now()));
        while self.notices.len() > 4 {
            self.notices.pop_front();
        }
        self.dirty = true;
    }
}

impl Drop for TuiActor {
    fn drop(&mut self) {
        self.restore_terminal();
    }
}

#[async_trait]
impl Actor for TuiActor {
    type Msg = TuiMsg;

    async fn handle(&mut self, msg: Self::Msg, ctx: &mut Context<Self>) -> Result<()> {
        match msg {
            TuiMsg::InputEvent(ev) => {
                if let CtEvent::Key(k) = ev
                    && k.kind != KeyEventKind::Release
                    && let Some(action) = map_key(k, self.key_state())
                    && !self.apply(action).await
                {
                    let _ = ctx.addr().try_send(TuiMsg::Shutdown);
                }
                if let CtEvent::Resize(..) = ev {
                    self.dirty = true;
                }
            }
            TuiMsg::Page(PageEvent::View(v)) => self.on_page_view(v),
            TuiMsg::Page(PageEvent::Notice(n)) => self.push_notice(n),
            TuiMsg::OpError(e) => {
                tracing::warn!(error = %e, "tui.op_error");
                self.push_notice(Notice {
                    level: senti_page::NoticeLevel::Error,
                    title: "Terminal error".into(),
                    message: e,
                });
            }
            TuiMsg::Tick => {
                self.step_spinner();
                self.expire_notices();
                if self.dirty || self.last_tick.elapsed() >= self.tick_rate {
                    self.draw()?;
                    self.last_tick = Instant::now();
                    self.dirty = false;
                }
            }
            TuiMsg::Shutdown => {
                self.restore_terminal();
                self.shutdown.signal();
                ctx.stop();
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use senti_common::Sentiment;

    fn view(model: Model, mode: Mode) -> PageView {
        PageView {
            model,
            mode,
            correction_labels: model.labels().to_vec(),
            ..PageView::default()
        }
    }

    #[test]
    fn stale_view_does_not_roll_back_local_selection() {
        let mut pending = PendingSelection {
            model: Some(Model::Roberta2L),
            mode: Some(Mode::Batch),
        };

        // published before the page saw SetModel/SetMode
        let mut stale = view(Model::Bertweet, Mode::Single);
        stale.chosen_label = Some(Sentiment::Neutral);
        pending.reconcile(&mut stale);
        assert_eq!(stale.model, Model::Roberta2L);
        assert_eq!(stale.mode, Mode::Batch);
        assert_eq!(stale.correction_labels, Model::Roberta2L.labels());
        assert_eq!(stale.chosen_label, None);
        assert!(pending.model.is_some());

        let mut echo = view(Model::Roberta2L, Mode::Batch);
        pending.reconcile(&mut echo);
        assert!(pending.model.is_none());
        assert!(pending.mode.is_none());
    }

    #[test]
    fn confirmed_selection_follows_page_again() {
        let mut pending = PendingSelection::default();
        let mut next = view(Model::Bertweet2L, Mode::Batch);
        pending.reconcile(&mut next);
        assert_eq!(next.model, Model::Bertweet2L);
        assert_eq!(next.mode, Mode::Batch);
    }

    #[test]
    fn repeated_presses_wait_for_the_latest_echo() {
        let start = Model::default();
        let mut pending = PendingSelection {
            model: Some(start.next().next()),
            mode: None,
        };
        let mut first_echo = view(start.next(), Mode::Single);
        pending.reconcile(&mut first_echo);
        assert_eq!(first_echo.model, start.next().next());
        assert_eq!(first_echo.model.next(), start.next().next().next());
    }
}
