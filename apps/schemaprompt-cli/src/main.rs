use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use console::style;
use dialoguer::{Confirm, Editor, Input, Select, theme::ColorfulTheme};
use schemaprompt_engine::{
    EngineError, PromptError, Session,
    cancel::CancellationToken,
    compat::CompatibilityChecker,
    config::{self, EngineConfig},
    interaction::{PromptRequest, UserInteraction, parse_number},
    label::load_labels,
    message::PROMPT_SUFFIX,
};
use serde_json::{Number, Value};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// Exit status for an operator abort (128 + SIGINT).
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Interactive, schema-driven data entry", long_about = None)]
struct Args {
    /// Schema file (JSON or YAML)
    schema: PathBuf,

    /// Label file mirroring the schema shape
    #[arg(short, long)]
    labels: Option<PathBuf>,

    /// Engine config file (JSON or YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum record nesting depth
    #[arg(long)]
    max_depth: Option<usize>,

    /// Skip the final "Submit this data?" confirmation
    #[arg(short, long)]
    yes: bool,

    /// Only report whether the schema can be prompted for
    #[arg(long)]
    check: bool,

    /// Write the collected JSON here instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Directory for JSONL session transcripts
    #[arg(long)]
    transcript_dir: Option<PathBuf>,
}

/// Terminal backend built on dialoguer; prompts go to stderr.
struct DialoguerInteraction {
    theme: ColorfulTheme,
}

impl DialoguerInteraction {
    fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

/// Prompt text without the trailing `": "`, which the theme draws itself.
fn prompt_text(message: &str) -> &str {
    message.strip_suffix(PROMPT_SUFFIX).unwrap_or(message)
}

fn map_prompt_error(err: dialoguer::Error, cancel: Option<&CancellationToken>) -> PromptError {
    match err {
        dialoguer::Error::IO(e) if e.kind() == io::ErrorKind::Interrupted => {
            // dialoguer leaves the cursor hidden after Ctrl+C
            let _ = console::Term::stderr().show_cursor();
            if let Some(token) = cancel {
                token.cancel();
            }
            PromptError::Cancelled
        }
        dialoguer::Error::IO(e) => PromptError::Io(e),
    }
}

fn cancelled_already(cancel: Option<&CancellationToken>) -> bool {
    cancel.is_some_and(CancellationToken::is_cancelled)
}

#[async_trait]
impl UserInteraction for DialoguerInteraction {
    async fn ask_yes_no(
        &self,
        request: PromptRequest<'_>,
        cancel: Option<&CancellationToken>,
    ) -> Result<bool, PromptError> {
        if cancelled_already(cancel) {
            return Err(PromptError::Cancelled);
        }
        Confirm::with_theme(&self.theme)
            .with_prompt(prompt_text(request.message))
            .default(true)
            .interact()
            .map_err(|e| map_prompt_error(e, cancel))
    }

    async fn ask_line(
        &self,
        request: PromptRequest<'_>,
        cancel: Option<&CancellationToken>,
    ) -> Result<String, PromptError> {
        if cancelled_already(cancel) {
            return Err(PromptError::Cancelled);
        }
        Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt_text(request.message))
            .allow_empty(!request.required)
            .validate_with(move |input: &String| request.check(&Value::String(input.clone())))
            .interact_text()
            .map_err(|e| map_prompt_error(e, cancel))
    }

    async fn ask_long_text(
        &self,
        request: PromptRequest<'_>,
        cancel: Option<&CancellationToken>,
    ) -> Result<String, PromptError> {
        if cancelled_already(cancel) {
            return Err(PromptError::Cancelled);
        }
        eprintln!(
            "{} {}",
            style(prompt_text(request.message)).cyan(),
            style("(opening editor, save and close to continue)").dim()
        );
        let mut draft = String::new();
        loop {
            let edited = Editor::new()
                .extension(".md")
                .edit(&draft)
                .map_err(|e| map_prompt_error(e.into(), cancel))?;
            let text = match edited {
                Some(text) => text,
                // Closing the editor without saving ends an array.
                None if cancel.is_some() => {
                    if let Some(token) = cancel {
                        token.cancel();
                    }
                    return Err(PromptError::Cancelled);
                }
                None => String::new(),
            };
            match request.check(&Value::String(text.clone())) {
                Ok(()) => return Ok(text),
                Err(issues) => {
                    warn!("Rejected long text: {}", issues);
                    eprintln!("{}", style(issues).red());
                    draft = text;
                }
            }
        }
    }

    async fn ask_number(
        &self,
        request: PromptRequest<'_>,
        cancel: Option<&CancellationToken>,
    ) -> Result<Number, PromptError> {
        if cancelled_already(cancel) {
            return Err(PromptError::Cancelled);
        }
        let raw = Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt_text(request.message))
            .allow_empty(!request.required)
            .validate_with(move |input: &String| match parse_number(input) {
                Some(n) => request.check(&Value::Number(n)),
                None => Err(format!("`{}` is not a number", input.trim())),
            })
            .interact_text()
            .map_err(|e| map_prompt_error(e, cancel))?;
        parse_number(&raw).ok_or_else(|| PromptError::Terminal(format!("`{raw}` is not a number")))
    }

    async fn ask_choice(
        &self,
        request: PromptRequest<'_>,
        choices: &[String],
        cancel: Option<&CancellationToken>,
    ) -> Result<String, PromptError> {
        if cancelled_already(cancel) {
            return Err(PromptError::Cancelled);
        }
        if choices.is_empty() {
            return Err(PromptError::Terminal("nothing to choose from".to_string()));
        }
        loop {
            let selection = Select::with_theme(&self.theme)
                .with_prompt(prompt_text(request.message))
                .items(choices)
                .default(0)
                .interact()
                .map_err(|e| map_prompt_error(e, cancel))?;
            let picked = choices[selection].clone();
            match request.check(&Value::String(picked.clone())) {
                Ok(()) => return Ok(picked),
                Err(issues) => eprintln!("{}", style(issues).red()),
            }
        }
    }

    fn start_step(&self, name: &str) {
        info!("Step started: {}", name);
        eprintln!("\n{}", style(name).bold().cyan());
    }

    fn end_step(&self, name: &str) {
        info!("Step ended: {}", name);
        eprintln!("{}", style(format!("{name} complete")).dim());
    }

    fn show_marker(&self, line: &str) {
        eprintln!("{}", style(line).dim());
    }

    fn render_value(&self, value: &Value) {
        eprintln!("\n{}:", style("Collected data").bold().green());
        match serde_json::to_string_pretty(value) {
            Ok(pretty) => eprintln!("{pretty}"),
            Err(_) => eprintln!("{value}"),
        }
    }
}

fn setup_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("info,schemaprompt_cli=debug,schemaprompt_engine=debug")
    } else {
        EnvFilter::new("warn,schemaprompt_cli=info,schemaprompt_engine=info")
    };

    fmt::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// CLI flags win over the config file.
fn apply_overrides(mut config: EngineConfig, args: &Args) -> EngineConfig {
    if let Some(max_depth) = args.max_depth {
        config.max_depth = max_depth;
    }
    if args.yes {
        config.require_confirmation = false;
    }
    if let Some(dir) = &args.transcript_dir {
        config.transcript_dir = Some(dir.clone());
    }
    config
}

async fn resolve_config(args: &Args) -> Result<EngineConfig> {
    let base = match &args.config {
        Some(path) => config::load_engine_config(path).await?,
        None => EngineConfig::default(),
    };
    let resolved = apply_overrides(base, args);
    resolved.validate().context("Invalid command-line overrides")?;
    Ok(resolved)
}

async fn write_output(value: &Value, out: Option<&Path>) -> Result<()> {
    let pretty = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            tokio::fs::write(path, format!("{pretty}\n"))
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{}",
                style(format!("Saved to {}", path.display())).green()
            );
        }
        None => println!("{pretty}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Setup Logging
    setup_logging(args.debug);

    // 2. Resolve configuration and load the schema
    let engine_config = resolve_config(&args).await?;
    let raw_schema = config::load_schema_document(&args.schema).await?;

    if args.check {
        let checker = CompatibilityChecker::new(engine_config.max_depth);
        return match checker.explain(&raw_schema) {
            Ok(()) => {
                println!("{}: compatible", args.schema.display());
                Ok(())
            }
            Err(incompatibility) => Err(anyhow::Error::new(incompatibility))
                .with_context(|| format!("{} cannot be prompted for", args.schema.display())),
        };
    }

    let labels = match &args.labels {
        Some(path) => Some(load_labels(path).await?),
        None => None,
    };

    // Banner
    eprintln!(
        "\n{}",
        style("   SCHEMAPROMPT   ").bold().on_blue().white()
    );
    eprintln!("{}", style(format!("Schema: {}", args.schema.display())).dim());

    let ui = DialoguerInteraction::new();
    let session = Session::new(&ui).with_config(engine_config);
    match session.run(&raw_schema, labels.as_ref()).await {
        Ok(value) => write_output(&value, args.out.as_deref()).await?,
        Err(EngineError::Interrupted { message }) => {
            warn!("{}", message);
            eprintln!("{}", style("Aborted.").yellow());
            std::process::exit(EXIT_INTERRUPTED);
        }
        Err(e) => return Err(e).context("Data entry failed"),
    }

    Ok(())
}
