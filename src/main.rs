//! smarttask CLI entry point.
//!
//! Provides `parse` for one-shot extraction and `session` for an
//! interactive task board on stdin.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use smarttask::board::TaskBoard;
use smarttask::config::{AppConfig, LoggingConfig};
use smarttask::credentials::load_default_credentials;
use smarttask::extractors::{
    ExtractorKind, RemoteModelExtractor, RuleBasedExtractor, TaskExtractor,
};
use smarttask::logging::{self, LoggingGuard};
use smarttask::providers::openai::OpenAiProvider;
use smarttask::types::{Task, TaskFields};

/// smarttask: structured tasks from plain sentences.
#[derive(Parser)]
#[command(name = "smarttask", version, about)]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Extract task fields from one sentence and print them.
    Parse {
        /// Extractor to use instead of the configured one (`rules` or `remote`).
        #[arg(long)]
        extractor: Option<ExtractorKind>,
        /// Print the fields as JSON.
        #[arg(long)]
        json: bool,
        /// The task sentence; multiple words are joined with spaces.
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Read tasks and commands from stdin until `/quit` or end of input.
    Session {
        /// Extractor to use instead of the configured one (`rules` or `remote`).
        #[arg(long)]
        extractor: Option<ExtractorKind>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let credentials = load_default_credentials(|key| std::env::var(key).ok())
        .context("failed to load credentials")?;
    let env = credentials.layered(|key| std::env::var(key).ok());
    let config = AppConfig::load(&env).context("failed to load configuration")?;

    let _logging_guard = init_logging(&config.logging)?;
    debug!(?config, "configuration loaded");

    match cli.command {
        Command::Parse {
            extractor,
            json,
            text,
        } => {
            let extractor = build_extractor(&config, extractor)?;
            handle_parse(extractor.as_ref(), &text.join(" "), json).await
        }
        Command::Session { extractor } => {
            let extractor = build_extractor(&config, extractor)?;
            handle_session(extractor).await
        }
    }
}

/// Console logging, plus JSON files when a logs directory is configured.
fn init_logging(config: &LoggingConfig) -> anyhow::Result<Option<LoggingGuard>> {
    match &config.logs_dir {
        Some(dir) => logging::init_production(dir, &config.level).map(Some),
        None => logging::init_cli(&config.level).map(|()| None),
    }
}

/// Construct the selected extractor, injecting the transport for `remote`.
fn build_extractor(
    config: &AppConfig,
    requested: Option<ExtractorKind>,
) -> anyhow::Result<Arc<dyn TaskExtractor>> {
    let kind = requested.unwrap_or(config.extractor.kind);
    config.validate_for(kind)?;

    match kind {
        ExtractorKind::Rules => Ok(Arc::new(RuleBasedExtractor::new())),
        ExtractorKind::Remote => {
            let api_key = config
                .llm
                .api_key()
                .ok_or_else(|| anyhow::anyhow!("missing API key for the remote extractor"))?;
            let provider = OpenAiProvider::new(
                config.llm.model.clone(),
                api_key.to_owned(),
                &config.llm.base_url,
                config.llm.timeout(),
            )
            .context("failed to create OpenAI provider")?;
            info!(model = %config.llm.model, endpoint = %provider.endpoint(), "remote extractor ready");

            Ok(Arc::new(
                RemoteModelExtractor::new(Arc::new(provider)).with_sampling(
                    Some(config.llm.temperature),
                    Some(config.llm.max_tokens),
                ),
            ))
        }
    }
}

/// Extract one sentence and print the result.
async fn handle_parse(extractor: &dyn TaskExtractor, text: &str, json: bool) -> anyhow::Result<()> {
    let extraction = extractor.extract_detailed(text).await;
    if let Some(reason) = &extraction.fallback {
        eprintln!("note: could not extract fields ({reason}); showing defaults");
    }

    if json {
        let rendered =
            serde_json::to_string_pretty(&extraction.fields).context("failed to render JSON")?;
        println!("{rendered}");
    } else {
        print!("{}", render_fields(&extraction.fields));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

const HELP: &str = "\
Type a task sentence to add it, or one of:
  /list                          show all tasks
  /show <id>                     show one task
  /edit <id> <field>=<value>     change name, assignee, dueDate, dueTime or priority
  /delete <id>                   remove a task
  /help                          show this help
  /quit                          leave the session
Ids may be shortened to any unique prefix.";

/// One line of session input.
#[derive(Debug, PartialEq, Eq)]
enum SessionCommand {
    Add(String),
    List,
    Show(String),
    Edit {
        id: String,
        field: String,
        value: String,
    },
    Delete(String),
    Help,
    Quit,
    Invalid(String),
}

/// Parse a session line; `None` for blank lines.
fn parse_session_line(line: &str) -> Option<SessionCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Some(SessionCommand::Add(line.to_owned()));
    };

    let (command, args) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(c, a)| (c, a.trim()));

    let parsed = match (command.to_ascii_lowercase().as_str(), args) {
        ("list" | "ls", "") => SessionCommand::List,
        ("help" | "?", _) => SessionCommand::Help,
        ("quit" | "exit" | "q", _) => SessionCommand::Quit,
        ("show", id) if !id.is_empty() => SessionCommand::Show(id.to_owned()),
        ("delete" | "rm", id) if !id.is_empty() => SessionCommand::Delete(id.to_owned()),
        ("edit", args) => match args
            .split_once(char::is_whitespace)
            .and_then(|(id, assignment)| {
                let (field, value) = assignment.trim().split_once('=')?;
                Some((id, field.trim(), value.trim()))
            }) {
            Some((id, field, value)) if !field.is_empty() => SessionCommand::Edit {
                id: id.to_owned(),
                field: field.to_owned(),
                value: value.to_owned(),
            },
            _ => SessionCommand::Invalid("usage: /edit <id> <field>=<value>".to_owned()),
        },
        _ => SessionCommand::Invalid(format!("unknown command {line:?}; try /help")),
    };
    Some(parsed)
}

/// Run the interactive board until `/quit` or end of input.
async fn handle_session(extractor: Arc<dyn TaskExtractor>) -> anyhow::Result<()> {
    let mut board = TaskBoard::new(extractor);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{HELP}");
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let Some(command) = parse_session_line(&line) else {
            continue;
        };
        match command {
            SessionCommand::Add(text) => match board.submit(&text).await {
                Ok(submission) => {
                    if submission.used_fallback {
                        eprintln!("note: could not extract fields; the task was added with defaults");
                    }
                    print!("{}", render_task(&submission.task));
                }
                Err(e) => eprintln!("error: {e}"),
            },
            SessionCommand::List => {
                if board.is_empty() {
                    println!("no tasks yet");
                }
                for task in board.tasks() {
                    println!("{}", render_summary(task));
                }
            }
            SessionCommand::Show(id) => match board.resolve_id(&id) {
                Ok(id) => {
                    if let Some(task) = board.get(id) {
                        print!("{}", render_task(task));
                    }
                }
                Err(e) => eprintln!("error: {e}"),
            },
            SessionCommand::Edit { id, field, value } => {
                if let Err(e) = edit_task(&mut board, &id, &field, &value) {
                    eprintln!("error: {e}");
                }
            }
            SessionCommand::Delete(id) => {
                let resolved = board.resolve_id(&id).map(str::to_owned);
                match resolved.and_then(|id| board.delete(&id)) {
                    Ok(task) => println!("deleted {}", short_id(&task.id)),
                    Err(e) => eprintln!("error: {e}"),
                }
            }
            SessionCommand::Help => println!("{HELP}"),
            SessionCommand::Quit => break,
            SessionCommand::Invalid(message) => eprintln!("error: {message}"),
        }
    }
    Ok(())
}

/// Apply a single-field edit to the task behind `id`.
fn edit_task(board: &mut TaskBoard, id: &str, field: &str, value: &str) -> anyhow::Result<()> {
    let id = board.resolve_id(id)?.to_owned();
    let mut edit = board
        .get(&id)
        .map(|task| task.fields.to_edit())
        .ok_or_else(|| anyhow::anyhow!("no task with id {id}"))?;
    edit.set(field, value)?;
    let task = board.update(&id, edit)?;
    print!("{}", render_task(task));
    Ok(())
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn render_fields(fields: &TaskFields) -> String {
    format!(
        "Name:      {}\nAssignee:  {}\nDue date:  {}\nDue time:  {}\nPriority:  {}\n",
        fields.name, fields.assignee, fields.due_date, fields.due_time, fields.priority
    )
}

fn render_task(task: &Task) -> String {
    format!("Id:        {}\n{}", task.id, render_fields(&task.fields))
}

fn render_summary(task: &Task) -> String {
    let fields = &task.fields;
    let mut line = format!("{}  {}  {}", short_id(&task.id), fields.priority, fields.name);
    if fields.is_assigned() {
        line.push_str(&format!("  @{}", fields.assignee));
    }
    if fields.has_due_date() {
        line.push_str(&format!("  due {}", fields.due_date));
    }
    if fields.has_due_time() {
        line.push_str(&format!("  {}", fields.due_time));
    }
    line
}
