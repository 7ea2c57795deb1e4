use crate::card::{self, CardLine};
use crate::keymap::Focus;
use crate::styles;
use anyhow::Result;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use senti_common::Mode;
use senti_page::{Notice, PageView};
use std::io::Stdout;
use unicode_width::UnicodeWidthStr;

pub struct ViewSnap<'a> {
    pub input: &'a str,
    pub input_cursor: usize,
    pub page: &'a PageView,
    pub focus: Focus,
    pub notice: Option<&'a Notice>,
    pub help_open: bool,
    pub spinner: &'static str,
}

pub fn draw(term: &mut Terminal<CrosstermBackend<Stdout>>, snap: &ViewSnap<'_>) -> Result<()> {
    term.draw(|frame| render(frame, snap))?;
    Ok(())
}

fn input_height(snap: &ViewSnap<'_>) -> u16 {
    match snap.page.mode {
        Mode::Single => 5,
        Mode::Batch => (snap.page.max_batch_lines as u16).clamp(3, 12) + 2,
    }
}

fn render(frame: &mut Frame<'_>, snap: &ViewSnap<'_>) {
    let area = frame.area();
    let feedback = card::feedback_lines(snap.page, snap.focus == Focus::Feedback);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(input_height(snap)),
            Constraint::Length(1),
            Constraint::Min(4),
            Constraint::Length(if feedback.is_empty() { 0 } else { feedback.len() as u16 + 2 }),
            Constraint::Length(1),
        ])
        .split(area);

    // Header
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" Sentiment Analysis ", styles::header()),
        Span::styled("— Analyze the sentiment of your text", styles::dim()),
    ]));
    frame.render_widget(header, layout[0]);

    // Model + mode selector
    let controls = Line::from(vec![
        Span::styled(" Model: ", styles::label()),
        Span::styled(snap.page.model.display_name(), styles::value()),
        Span::styled(" [F2]", styles::dim()),
        Span::styled("   Mode: ", styles::label()),
        Span::styled(
            match snap.page.mode {
                Mode::Single => "Single",
                Mode::Batch => "Batch",
            },
            styles::value(),
        ),
        Span::styled(" [F3]", styles::dim()),
        Span::styled("   Help [F1]", styles::dim()),
    ]);
    frame.render_widget(Paragraph::new(controls), layout[1]);

    render_input(frame, layout[2], snap);

    // Submit status
    let status = if snap.page.phase == senti_page::Phase::Loading {
        Line::from(vec![
            Span::raw(" "),
            Span::styled(snap.spinner, styles::busy()),
            Span::styled(" Analyzing...", styles::busy()),
        ])
    } else {
        let how = match snap.page.mode {
            Mode::Single => "Enter",
            Mode::Batch => "Ctrl+S",
        };
        Line::from(vec![
            Span::styled(" Classify", styles::idle()),
            Span::styled(format!(" ({how})"), styles::dim()),
        ])
    };
    frame.render_widget(Paragraph::new(status), layout[3]);

    // Result card / batch list
    let card_w = layout[4].width.saturating_sub(2) as usize;
    let result = Paragraph::new(to_lines(card::result_lines(snap.page, card_w)))
        .block(Block::default().borders(Borders::ALL).title(" Result "))
        .wrap(Wrap { trim: false });
    frame.render_widget(result, layout[4]);

    if !feedback.is_empty() {
        let border = if snap.focus == Focus::Feedback {
            styles::focused_border()
        } else {
            styles::border()
        };
        let widget = Paragraph::new(to_lines(feedback)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(" Feedback "),
        );
        frame.render_widget(widget, layout[5]);
    }

    // Notice line
    if let Some(n) = snap.notice {
        let line = Line::from(vec![
            Span::styled(format!(" {}", n.title), styles::notice(n.level)),
            Span::styled(format!(" — {}", n.message), styles::value()),
        ]);
        frame.render_widget(Paragraph::new(line), layout[6]);
    }

    if snap.help_open {
        render_help(frame, area);
    }
}

fn render_input(frame: &mut Frame<'_>, area: Rect, snap: &ViewSnap<'_>) {
    let title = match snap.page.mode {
        Mode::Single => " Text ".to_string(),
        Mode::Batch => format!(
            " Lines ({}/{}) ",
            senti_page::batch_lines(snap.input).len(),
            snap.page.max_batch_lines
        ),
    };
    let border = if snap.focus == Focus::Input {
        styles::focused_border()
    } else {
        styles::border()
    };

    let (row, col) = caret(snap.input, snap.input_cursor);
    let inner_h = area.height.saturating_sub(2);
    let scroll = row.saturating_sub(inner_h.saturating_sub(1));

    let input = Paragraph::new(snap.input)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(title),
        )
        .scroll((scroll, 0));
    frame.render_widget(Clear, area);
    frame.render_widget(input, area);

    if snap.focus == Focus::Input && !snap.help_open {
        frame.set_cursor_position(Position {
            x: area.x + 1 + col,
            y: area.y + 1 + row - scroll,
        });
    }
}

fn render_help(frame: &mut Frame<'_>, area: Rect) {
    let rows = [
        ("Enter", "classify (single) / new line (batch)"),
        ("Ctrl+Enter, Ctrl+S", "classify in either mode"),
        ("Esc", "clear the text"),
        ("F2 / Tab", "next model (Shift+Tab: previous)"),
        ("F3", "toggle single / batch"),
        ("F4", "focus the feedback question"),
        ("y / n", "answer the feedback question"),
        ("1 2 3, Enter", "pick and send the correct label"),
        ("Ctrl+C, Ctrl+Q", "quit"),
    ];
    let lines: Vec<Line> = rows
        .iter()
        .map(|(k, v)| {
            Line::from(vec![
                Span::styled(format!(" {k:<20}"), styles::key_hint()),
                Span::styled(*v, styles::value()),
            ])
        })
        .collect();

    let w = area.width.min(64);
    let h = (lines.len() as u16 + 2).min(area.height);
    let popup = Rect {
        x: area.x + (area.width - w) / 2,
        y: area.y + (area.height - h) / 2,
        width: w,
        height: h,
    };
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Keys (F1 / Esc to close) "),
        ),
        popup,
    );
}

fn to_lines(lines: Vec<CardLine>) -> Vec<Line<'static>> {
    lines
        .into_iter()
        .map(|l| {
            Line::from(
                l.spans
                    .into_iter()
                    .map(|(text, style)| Span::styled(text, style))
                    .collect::<Vec<_>>(),
            )
        })
        .collect()
}

/// Row and display column of the byte offset `cursor` within `input`.
pub(crate) fn caret(input: &str, cursor: usize) -> (u16, u16) {
    let before = &input[..cursor.min(input.len())];
    let row = before.matches('\n').count() as u16;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let col = UnicodeWidthStr::width(&before[line_start..]) as u16;
    (row, col)
}

#[cfg(test)]
mod tests {
    use super::caret;

    #[test]
    fn caret_tracks_lines_and_wide_chars() {
        assert_eq!(caret("", 0), (0, 0));
        assert_eq!(caret("abc", 2), (0, 2));
        assert_eq!(caret("ab\ncd", 3), (1, 0));
        assert_eq!(caret("ab\ncd", 5), (1, 2));
        assert_eq!(caret("日本", "日本".len()), (0, 4));
    }
}
