//! Text layout for the result card, batch list and feedback widget.
//!
//! Everything here is plain data so it can be checked without a terminal;
//! `view` turns the lines into ratatui widgets.

use crate::styles;
use ratatui::style::Style;
use senti_common::{BatchResult, PredictionResult, Sentiment};
use senti_page::{Displayed, FeedbackPhase, PageView};
use unicode_width::UnicodeWidthStr;

#[derive(Clone, Debug, PartialEq)]
pub struct CardLine {
    pub spans: Vec<(String, Style)>,
}

impl CardLine {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            spans: vec![(text.into(), style)],
        }
    }

    pub fn blank() -> Self {
        Self { spans: Vec::new() }
    }

    fn push(mut self, text: impl Into<String>, style: Style) -> Self {
        self.spans.push((text.into(), style));
        self
    }

    pub fn text(&self) -> String {
        self.spans.iter().map(|(t, _)| t.as_str()).collect()
    }
}

pub fn marker(s: Sentiment) -> &'static str {
    match s {
        Sentiment::Positive => "💚",
        Sentiment::Neutral => "🟡",
        Sentiment::Negative => "❤️",
    }
}

const LABEL_COL: usize = 10;
const PCT_COL: usize = 7;

/// A horizontal bar `width` cells wide, filled in proportion to `p`.
pub fn bar(p: f64, width: usize) -> String {
    let p = if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 };
    let filled = ((p * width as f64).round() as usize).min(width);
    let mut out = String::with_capacity(width * 3);
    out.extend(std::iter::repeat_n('█', filled));
    out.extend(std::iter::repeat_n('░', width - filled));
    out
}

fn probability_lines(result: &PredictionResult, width: usize) -> Vec<CardLine> {
    let bar_w = width.saturating_sub(LABEL_COL + PCT_COL + 2).max(4);
    result
        .probabilities
        .ordered()
        .into_iter()
        .map(|(label, p)| {
            let style = styles::probability(label);
            CardLine::new(format!("  {label:<w$}", w = LABEL_COL - 2), style)
                .push(bar(p, bar_w), style)
                .push(format!("{:>w$.1}%", p * 100.0, w = PCT_COL - 1), styles::value())
        })
        .collect()
}

fn single_lines(result: &PredictionResult, width: usize) -> Vec<CardLine> {
    let mut out = vec![
        CardLine::new(format!("{} ", marker(result.label)), styles::value())
            .push(result.label.title(), styles::sentiment_bold(result.label)),
        CardLine::blank(),
    ];
    out.extend(probability_lines(result, width));
    out
}

fn batch_lines(result: &BatchResult, width: usize) -> Vec<CardLine> {
    let overall = result.overall.label;
    let mut out = vec![
        CardLine::new("Overall: ", styles::label())
            .push(format!("{} ", marker(overall)), styles::value())
            .push(overall.title(), styles::sentiment_bold(overall)),
        CardLine::blank(),
    ];

    let num_w = result.per_line.len().to_string().len();
    for (i, line) in result.per_line.iter().enumerate() {
        let tag = format!("  {}", line.label.title());
        let prefix = format!("{:>num_w$}. ", i + 1);
        let room = width.saturating_sub(prefix.width() + tag.width());
        out.push(
            CardLine::new(prefix, styles::dim())
                .push(truncate_to_width(&line.text, room), styles::value())
                .push(tag, styles::sentiment_bold(line.label)),
        );
    }
    out
}

/// Lines for whatever the page currently shows.
pub fn result_lines(view: &PageView, width: usize) -> Vec<CardLine> {
    match &view.result {
        Some(Displayed::Single(r)) => single_lines(r, width),
        Some(Displayed::Batch(b)) => batch_lines(b, width),
        None => vec![CardLine::new(
            "No result yet. Type some text and press Enter (Ctrl+S in batch mode).",
            styles::dim(),
        )],
    }
}

/// Lines for the feedback widget; empty when there is nothing to ask.
pub fn feedback_lines(view: &PageView, focused: bool) -> Vec<CardLine> {
    let hint = if focused { styles::key_hint() } else { styles::dim() };
    match view.feedback {
        FeedbackPhase::None => Vec::new(),
        FeedbackPhase::Question => {
            let mut lines = vec![
                CardLine::new("Was this prediction correct? ", styles::label())
                    .push("[y]es", hint)
                    .push(" / ", styles::dim())
                    .push("[n]o", hint),
            ];
            if view.feedback_in_flight {
                lines.push(CardLine::new("Sending...", styles::busy()));
            } else if !focused {
                lines.push(CardLine::new("Press F4 to answer.", styles::dim()));
            }
            lines
        }
        FeedbackPhase::Correction => {
            let mut picker = CardLine::new("Correct label: ", styles::label());
            for (i, label) in view.correction_labels.iter().enumerate() {
                let style = if view.chosen_label == Some(*label) {
                    styles::chosen()
                } else {
                    styles::sentiment(*label)
                };
                picker = picker
                    .push(format!("[{}] {}", i + 1, label.title()), style)
                    .push("  ", styles::dim());
            }
            let status = if view.feedback_in_flight {
                CardLine::new("Sending...", styles::busy())
            } else if view.chosen_label.is_some() {
                CardLine::new("Enter to submit", hint)
            } else {
                CardLine::new("Pick a label to submit", styles::dim())
            };
            vec![picker, status]
        }
        FeedbackPhase::Done => vec![CardLine::new(
            "Thanks for your feedback!",
            styles::notice(senti_page::NoticeLevel::Success),
        )],
    }
}

/// Cut `s` to at most `max` display columns, marking the cut with `…`.
pub fn truncate_to_width(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}
