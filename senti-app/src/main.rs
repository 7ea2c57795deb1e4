use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use senti_common::observability::{LogConfig, LogFormat, init_logging};
use senti_common::{Model, Sentiment};
use senti_config::{ApiBase, SentiConfig, SentiConfigLoader};
use std::path::PathBuf;
use tether::{Tether, build_from_config};

mod oneshot;
mod tether;

const DEFAULT_CONFIG_FILE: &str = "senti.yaml";

#[derive(Debug, Parser)]
#[command(name = "senti", version, about = "Sentiment analysis client")]
struct Cli {
    /// Config file; `senti.yaml` in the working directory is used when present.
    #[arg(long, short, global = true, env = "SENTI_CONFIG")]
    config: Option<PathBuf>,

    /// Mirror logs to stderr (one-shot commands only).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive terminal client (default).
    Tui,
    /// Classify one text.
    Predict {
        #[arg(long, short)]
        model: Option<Model>,
        /// Words are joined with single spaces.
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Classify several lines, each on its own.
    Batch {
        #[arg(long, short)]
        model: Option<Model>,
        /// Read lines from a file (`-` for stdin) instead of the arguments.
        #[arg(long, short, conflicts_with = "lines")]
        file: Option<PathBuf>,
        lines: Vec<String>,
    },
    /// Tell the backend whether a prediction was right.
    Feedback {
        /// Prediction id printed by `predict`.
        #[arg(long)]
        id: String,
        #[arg(long, conflicts_with = "label", required_unless_present = "label")]
        correct: bool,
        /// The label the prediction should have had.
        #[arg(long)]
        label: Option<Sentiment>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<SentiConfig> {
    let loader = SentiConfigLoader::new();
    let loader = match path {
        Some(p) => loader.with_file(p),
        None => loader.with_optional_file(DEFAULT_CONFIG_FILE),
    };
    loader.load().context("failed to load configuration")
}

fn log_config(cfg: &SentiConfig, emit_stderr: bool) -> Result<LogConfig> {
    let format: LogFormat = cfg.logging.format.parse()?;
    Ok(LogConfig {
        log_dir: cfg.logging.dir.as_ref().map(PathBuf::from),
        emit_stderr,
        format,
        default_filter: cfg.logging.filter.clone(),
        ..LogConfig::default()
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Config (env wins), then logging from it.
    let cfg = load_config(cli.config.as_ref())?;
    let interactive = matches!(cli.command, None | Some(Command::Tui));
    let log_path = init_logging(log_config(&cfg, cli.verbose && !interactive)?)?;

    // 2) The API base is resolved exactly once and injected from here on.
    let base = ApiBase::resolve(&cfg.api).context("failed to resolve API base URL")?;
    tracing::info!(base = %base, log = %log_path.display(), "senti starting");

    match cli.command {
        None | Some(Command::Tui) => {
            let mut tether = Tether::new();
            build_from_config(&mut tether, &cfg, &base)?;
            tether.run().await
        }
        Some(Command::Predict { model, text }) => {
            let api = oneshot::client(&cfg, &base)?;
            let model = model.unwrap_or(cfg.ui.default_model);
            oneshot::predict(&api, &text.join(" "), model).await
        }
        Some(Command::Batch { model, file, lines }) => {
            let api = oneshot::client(&cfg, &base)?;
            let model = model.unwrap_or(cfg.ui.default_model);
            let text = match file {
                Some(path) => oneshot::read_input(&path)?,
                None => lines.join("\n"),
            };
            oneshot::batch(&api, &text, model, cfg.ui.max_batch_lines).await
        }
        Some(Command::Feedback { id, correct, label }) => {
            let api = oneshot::client(&cfg, &base)?;
            oneshot::feedback(&api, id, correct, label).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_tui() {
        let cli = Cli::try_parse_from(["senti"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn predict_parses_model_and_joins_words() {
        let cli = Cli::try_parse_from(["senti", "predict", "-m", "bertweet2L", "so", "good"]).unwrap();
        match cli.command {
            Some(Command::Predict { model, text }) => {
                assert_eq!(model, Some(Model::Bertweet2L));
                assert_eq!(text.join(" "), "so good");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn unknown_model_is_rejected() {
        assert!(Cli::try_parse_from(["senti", "predict", "--model", "gpt", "hi"]).is_err());
    }

    #[test]
    fn feedback_needs_exactly_one_verdict() {
        assert!(Cli::try_parse_from(["senti", "feedback", "--id", "x"]).is_err());
        assert!(
            Cli::try_parse_from(["senti", "feedback", "--id", "x", "--correct", "--label", "neutral"])
                .is_err()
        );
        let cli =
            Cli::try_parse_from(["senti", "feedback", "--id", "x", "--label", "neutral"]).unwrap();
        match cli.command {
            Some(Command::Feedback { id, correct, label }) => {
                assert_eq!(id, "x");
                assert!(!correct);
                assert_eq!(label, Some(Sentiment::Neutral));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn batch_file_conflicts_with_inline_lines() {
        assert!(Cli::try_parse_from(["senti", "batch", "--file", "in.txt", "a line"]).is_err());
    }

    #[test]
    fn log_config_follows_file_settings() {
        let cfg = SentiConfigLoader::new()
            .with_yaml_str("logging:\n  format: json\n  filter: debug\n  dir: /tmp/senti-logs")
            .load()
            .unwrap();
        let lc = log_config(&cfg, false).unwrap();
        assert_eq!(lc.format, LogFormat::Json);
        assert_eq!(lc.default_filter, "debug");
        assert_eq!(lc.log_dir, Some(PathBuf::from("/tmp/senti-logs")));
        assert!(!lc.emit_stderr);
    }
}
