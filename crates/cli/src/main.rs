use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use sarathi_agents::{Corrector, IntentResolver, MatchAgent, SpeechAgent};
use sarathi_core::{
    decode_record, encode_record, parse_tier_order, Containment, CorrectionConfig, LexiconTable,
    OutputEncoding, ResolverConfig, TranscriptionRequest, TranscriptionResult, TranslationRequest,
    TranslationResult,
};
use sarathi_llm::{
    ChatCompletionsClient, LlmConfig, DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL, DEFAULT_STT_MODEL,
};
use sarathi_observability::{init_tracing, AppMetrics};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "sarathi")]
#[command(about = "Sarathi intent matcher: one JSON record per line in, one per line out")]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve `{userQuery, nativeQuery, options, language}` records (default).
    Match,
    /// Translate `{text, target_lang}` records.
    Translate,
    /// Transcribe `{audio, language}` records holding base64 audio.
    Transcribe,
}

#[derive(Debug, Args)]
struct Settings {
    #[arg(long, env = "SARATHI_TIER_ORDER", default_value = "direct,fuzzy,semantic")]
    tier_order: String,

    #[arg(long, env = "SARATHI_FUZZY_THRESHOLD", default_value_t = 0.6)]
    fuzzy_threshold: f32,

    #[arg(long, env = "SARATHI_VERIFY_THRESHOLD", default_value_t = 0.8)]
    verify_threshold: f32,

    #[arg(long, env = "SARATHI_CONTAINMENT", default_value = "option-in-query")]
    containment: String,

    #[arg(long, env = "SARATHI_FOLD_DIACRITICS")]
    fold_diacritics: bool,

    #[arg(long, env = "SARATHI_CLASSIFIER_TIMEOUT_SECS", default_value_t = 10)]
    classifier_timeout_secs: u64,

    #[arg(long, env = "SARATHI_TRANSLATION_TIMEOUT_SECS", default_value_t = 15)]
    translation_timeout_secs: u64,

    #[arg(long, env = "SARATHI_TRANSCRIPTION_TIMEOUT_SECS", default_value_t = 30)]
    transcription_timeout_secs: u64,

    #[arg(long, env = "SARATHI_LLM_BASE_URL", default_value = DEFAULT_BASE_URL)]
    llm_base_url: String,

    #[arg(long, env = "SARATHI_LLM_MODEL", default_value = DEFAULT_CHAT_MODEL)]
    llm_model: String,

    #[arg(long, env = "SARATHI_STT_MODEL", default_value = DEFAULT_STT_MODEL)]
    stt_model: String,

    /// JSON substitution table; the built-in table is used when absent.
    #[arg(long, env = "SARATHI_LEXICON")]
    lexicon: Option<PathBuf>,

    #[arg(long, env = "SARATHI_OUTPUT_ENCODING", default_value = "utf8")]
    output_encoding: String,

    /// Answer the first non-blank record and exit.
    #[arg(long)]
    once: bool,
}

impl Settings {
    fn resolver_config(&self) -> Result<ResolverConfig> {
        ResolverConfig {
            tier_order: parse_tier_order(&self.tier_order).context("invalid --tier-order")?,
            fuzzy_threshold: self.fuzzy_threshold,
            verify_threshold: self.verify_threshold,
            containment: Containment::parse(&self.containment)
                .context("invalid --containment")?,
            fold_diacritics: self.fold_diacritics,
            classifier_timeout: Duration::from_secs(self.classifier_timeout_secs),
        }
        .validate()
        .context("invalid resolver configuration")
    }

    fn correction_config(&self) -> Result<CorrectionConfig> {
        if self.translation_timeout_secs == 0 {
            anyhow::bail!("--translation-timeout-secs must be positive");
        }
        Ok(CorrectionConfig {
            translation_timeout: Duration::from_secs(self.translation_timeout_secs),
        })
    }

    fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            base_url: self.llm_base_url.clone(),
            chat_model: self.llm_model.clone(),
            stt_model: self.stt_model.clone(),
            classifier_timeout: Duration::from_secs(self.classifier_timeout_secs),
            translation_timeout: Duration::from_secs(self.translation_timeout_secs),
            transcription_timeout: Duration::from_secs(self.transcription_timeout_secs),
            ..LlmConfig::default()
        }
    }

    fn lexicon(&self) -> Result<LexiconTable> {
        match &self.lexicon {
            Some(path) => LexiconTable::from_path(path)
                .with_context(|| format!("failed loading lexicon from {}", path.display())),
            None => Ok(LexiconTable::builtin()),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing("sarathi_cli");
    let cli = Cli::parse();
    let settings = &cli.settings;

    let encoding = OutputEncoding::parse(&settings.output_encoding)
        .context("invalid --output-encoding")?;
    let metrics = AppMetrics::shared();
    let client = Arc::new(
        ChatCompletionsClient::new(settings.llm_config()).context("failed building HTTP client")?,
    );

    let mut input = BufReader::new(tokio::io::stdin());
    let mut output = tokio::io::stdout();
    let frame = Framing {
        once: settings.once,
        encoding,
    };

    let answered = match cli.command.unwrap_or(Command::Match) {
        Command::Match => {
            let agent = MatchAgent::new(
                IntentResolver::new(client.clone(), settings.resolver_config()?, metrics.clone()),
                Corrector::new(
                    client,
                    Arc::new(settings.lexicon()?),
                    settings.correction_config()?,
                    metrics.clone(),
                ),
                metrics.clone(),
            );
            let agent = &agent;
            serve(
                &mut input,
                &mut output,
                frame,
                |line| async move { agent.handle_line(&line).await },
                |reason| agent.reject(reason),
            )
            .await?
        }
        Command::Translate => {
            let corrector = Corrector::new(
                client,
                Arc::new(settings.lexicon()?),
                settings.correction_config()?,
                metrics.clone(),
            );
            let corrector = &corrector;
            serve(
                &mut input,
                &mut output,
                frame,
                |line| async move {
                    match decode_record::<TranslationRequest>(&line) {
                        Ok(request) => corrector.translate(&request).await,
                        Err(err) => rejected_translation(err.to_string()),
                    }
                },
                rejected_translation,
            )
            .await?
        }
        Command::Transcribe => {
            let agent = SpeechAgent::new(
                client,
                Duration::from_secs(settings.transcription_timeout_secs),
                metrics.clone(),
            );
            let agent = &agent;
            serve(
                &mut input,
                &mut output,
                frame,
                |line| async move {
                    match decode_record::<TranscriptionRequest>(&line) {
                        Ok(request) => agent.handle(request).await,
                        Err(err) => rejected_transcription(err.to_string()),
                    }
                },
                rejected_transcription,
            )
            .await?
        }
    };

    info!(answered, metrics = ?metrics.snapshot(), "input closed");
    Ok(())
}

fn rejected_translation(reason: String) -> TranslationResult {
    TranslationResult {
        translated: String::new(),
        error: Some(reason),
    }
}

fn rejected_transcription(reason: String) -> TranscriptionResult {
    TranscriptionResult {
        text: String::new(),
        error: Some(reason),
    }
}

#[derive(Debug, Clone, Copy)]
struct Framing {
    once: bool,
    encoding: OutputEncoding,
}

/// Writes exactly one record per non-blank input line, flushing after each.
/// Lines that are not UTF-8 are answered through `reject`; only I/O errors
/// stop the loop early.
async fn serve<I, O, F, Fut, G, T>(
    input: &mut I,
    output: &mut O,
    frame: Framing,
    mut handle: F,
    mut reject: G,
) -> Result<u64>
where
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = T>,
    G: FnMut(String) -> T,
    T: Serialize,
{
    let mut raw = Vec::new();
    let mut answered = 0_u64;

    loop {
        raw.clear();
        let read = input
            .read_until(b'\n', &mut raw)
            .await
            .context("failed reading input")?;
        if read == 0 {
            break;
        }

        let response = match std::str::from_utf8(trim_line_ending(&raw)) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => handle(line.to_string()).await,
            Err(err) => reject(format!("record is not valid UTF-8: {err}")),
        };

        let mut encoded =
            encode_record(&response, frame.encoding).context("failed encoding response")?;
        encoded.push('\n');
        output.write_all(encoded.as_bytes()).await?;
        output.flush().await?;
        answered += 1;

        if frame.once {
            break;
        }
    }

    Ok(answered)
}

fn trim_line_ending(raw: &[u8]) -> &[u8] {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    raw.strip_suffix(b"\r").unwrap_or(raw)
}
