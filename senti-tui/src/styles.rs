use ratatui::style::{Color, Modifier, Style};
use senti_common::Sentiment;
use senti_page::NoticeLevel;

pub fn header() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

pub fn label() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

pub fn value() -> Style {
    Style::default().fg(Color::White)
}

pub fn dim() -> Style {
    Style::default().fg(Color::DarkGray)
}

pub fn key_hint() -> Style {
    Style::default().fg(Color::Cyan)
}

pub fn busy() -> Style {
    Style::default().fg(Color::Yellow)
}

pub fn idle() -> Style {
    Style::default().fg(Color::Green)
}

pub fn sentiment(s: Sentiment) -> Style {
    let fg = match s {
        Sentiment::Positive => Color::LightGreen,
        Sentiment::Neutral => Color::Yellow,
        Sentiment::Negative => Color::LightRed,
    };
    Style::default().fg(fg)
}

pub fn sentiment_bold(s: Sentiment) -> Style {
    sentiment(s).add_modifier(Modifier::BOLD)
}

/// Style for a probability row whose label may be one we do not know.
pub fn probability(label: &str) -> Style {
    match label.parse::<Sentiment>() {
        Ok(s) => sentiment(s),
        Err(_) => value(),
    }
}

pub fn chosen() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

pub fn notice(level: NoticeLevel) -> Style {
    match level {
        NoticeLevel::Info => Style::default().fg(Color::Gray),
        NoticeLevel::Success => Style::default()
            .fg(Color::LightGreen)
            .add_modifier(Modifier::BOLD),
        NoticeLevel::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

pub fn focused_border() -> Style {
    Style::default().fg(Color::Cyan)
}

pub fn border() -> Style {
    Style::default().fg(Color::Gray)
}
