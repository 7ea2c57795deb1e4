//! Non-interactive subcommands: one request, printed result, exit code.

use anyhow::{Context, Result, bail};
use senti_api::{HttpSentimentApi, SentimentApi};
use senti_common::{BatchResult, FeedbackRecord, Mode, Model, PredictionResult, Sentiment};
use senti_config::{ApiBase, SentiConfig};
use senti_page::{Submission, validate};
use std::fmt::Write as _;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

const BAR_WIDTH: usize = 24;

pub fn client(cfg: &SentiConfig, base: &ApiBase) -> Result<HttpSentimentApi> {
    Ok(HttpSentimentApi::new(base.as_str())?
        .with_timeout(Duration::from_secs(cfg.api.timeout_secs)))
}

pub fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

pub async fn predict(api: &dyn SentimentApi, text: &str, model: Model) -> Result<()> {
    let text = match validate(text, Mode::Single, usize::MAX)? {
        Submission::Single(text) => text,
        Submission::Batch(_) => bail!("single input produced a batch submission"),
    };
    let result = api.predict_single(&text, model).await?;
    print!("{}", render_single(&result));
    Ok(())
}

pub async fn batch(api: &dyn SentimentApi, text: &str, model: Model, max_lines: usize) -> Result<()> {
    let lines = match validate(text, Mode::Batch, max_lines)? {
        Submission::Batch(lines) => lines,
        Submission::Single(_) => bail!("batch input produced a single submission"),
    };
    let result = api.predict_batch(&lines, model).await?;
    print!("{}", render_batch(&result));
    Ok(())
}

pub async fn feedback(
    api: &dyn SentimentApi,
    id: String,
    correct: bool,
    label: Option<Sentiment>,
) -> Result<()> {
    let record = match (correct, label) {
        (true, None) => FeedbackRecord::correct(id),
        (false, Some(label)) => FeedbackRecord::corrected(id, label),
        _ => bail!("pass either --correct or --label"),
    };
    api.submit_feedback(&record).await?;
    println!("Thanks for your feedback!");
    Ok(())
}

fn render_single(r: &PredictionResult) -> String {
    let mut out = String::new();
    let _ = write!(out, "{}", r.label.title());
    if let Some(id) = &r.id {
        let _ = write!(out, "  (id {id})");
    }
    out.push('\n');
    for (label, p) in r.probabilities.ordered() {
        let _ = writeln!(
            out,
            "  {label:<9} {} {:>5.1}%",
            senti_tui::bar(p, BAR_WIDTH),
            p * 100.0
        );
    }
    out
}

fn render_batch(b: &BatchResult) -> String {
    let mut out = format!("Overall: {}\n", b.overall.label.title());
    let num_w = b.per_line.len().to_string().len();
    for (i, line) in b.per_line.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>num_w$}. {:<9} {}",
            i + 1,
            line.label.title(),
            line.text
        );
    }
    out
}
