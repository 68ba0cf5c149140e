//! stepwise - step-by-step reasoning from the command line
//!
//! Streams each reasoning step to stdout as it arrives and finishes with the
//! final answer. Logs go to stderr.

use clap::Parser;
use futures::StreamExt;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stepwise::config::{ConfigLayer, EndpointLayer, LimitsLayer, DEFAULT_CONFIG_PATH};
use stepwise::llm::{LlmService, LoggingService, OpenAIService};
use stepwise::render::{render_snapshot, render_summary};
use stepwise::Reasoner;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "stepwise", version, about = "Step-by-step reasoning with an LLM")]
struct Cli {
    /// Question to reason about; reads stdin when omitted or `-`
    prompt: Option<String>,

    /// TOML config file with an [openai] table
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// API key (overrides the config file and environment)
    #[arg(long)]
    api_key: Option<String>,

    /// Base URL of the chat completions endpoint
    #[arg(long)]
    base_url: Option<String>,

    /// Model name sent with each request
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Maximum intermediate steps before forcing the final answer
    #[arg(long)]
    max_steps: Option<u32>,

    /// Output token budget per intermediate step
    #[arg(long)]
    step_tokens: Option<u32>,

    /// Output token budget for the final answer
    #[arg(long)]
    final_tokens: Option<u32>,

    /// Print only the finished session instead of streaming steps
    #[arg(long)]
    no_stream: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigLayer {
        ConfigLayer {
            openai: EndpointLayer {
                api_key: self.api_key.clone(),
                base_url: self.base_url.clone(),
                model_name: self.model.clone(),
            },
            limits: LimitsLayer {
                max_steps: self.max_steps,
                step_max_tokens: self.step_tokens,
                final_max_tokens: self.final_tokens,
            },
        }
    }

    fn read_prompt(&self) -> std::io::Result<String> {
        match self.prompt.as_deref() {
            Some(prompt) if prompt != "-" => Ok(prompt.to_string()),
            _ => {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                Ok(buf.trim().to_string())
            }
        }
    }
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "stepwise=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    // Configuration: file < environment < command line
    let file = match &cli.config {
        Some(path) => ConfigLayer::from_file(path)?,
        None => ConfigLayer::from_optional_file(Path::new(DEFAULT_CONFIG_PATH))?,
    };
    let settings = file
        .merge(ConfigLayer::from_env())
        .merge(cli.overrides())
        .resolve()?;

    let prompt = cli.read_prompt()?;
    if prompt.is_empty() {
        return Err("empty prompt".into());
    }

    tracing::info!(
        model = %settings.llm.model_name,
        base_url = %settings.llm.base_url,
        "Using chat completion endpoint"
    );
    let service: Arc<dyn LlmService> = Arc::new(OpenAIService::new(&settings.llm)?);
    let reasoner = Reasoner::new(Arc::new(LoggingService::new(service)), settings.limits);

    let mut stdout = std::io::stdout().lock();
    if cli.no_stream {
        let result = reasoner.run_session(prompt).await;
        stdout.write_all(render_summary(&result).as_bytes())?;
    } else {
        let mut session = reasoner.stream_session(prompt);
        while let Some(snapshot) = session.next().await {
            stdout.write_all(render_snapshot(&snapshot).as_bytes())?;
            stdout.write_all(b"\n")?;
            stdout.flush()?;
        }
    }

    Ok(())
}
