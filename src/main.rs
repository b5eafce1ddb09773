use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::EnvFilter;

use zenith::app::App;
use zenith::config::Config;
use zenith::gemini::{GeminiClient, GenerationRequest};
use zenith::model::AiModel;
use zenith::orchestrator::{Orchestrator, TurnUpdate};
use zenith::prompt::{self, Persona};
use zenith::tui::AppEvent;
use zenith::{handler, lexicon::Lexicon, page, tui, ui};

#[derive(Parser)]
#[command(name = "zenith")]
#[command(about = "Sidebar-style AI assistant: chat with Gemini, grounded in the page you're reading")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat (TUI)
    Chat {
        /// Plain-text page extraction to ground the conversation in
        #[arg(short, long)]
        page: Option<PathBuf>,
        /// Logical model: flash, pro, or deep
        #[arg(short, long)]
        model: Option<String>,
        /// Persona: general, slang, or local
        #[arg(long)]
        persona: Option<String>,
        /// Start with page context disabled
        #[arg(long)]
        no_context: bool,
    },
    /// One-shot question, answer printed to stdout
    Ask {
        /// Your question
        prompt: String,
        /// Plain-text page extraction to use as context
        #[arg(short, long)]
        page: Option<PathBuf>,
        /// Logical model: flash, pro, or deep
        #[arg(short, long)]
        model: Option<String>,
        /// Persona: general, slang, or local
        #[arg(long)]
        persona: Option<String>,
    },
    /// List logical models and their backend resolution
    Models,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    match cli.command {
        Commands::Chat {
            page,
            model,
            persona,
            no_context,
        } => run_chat(page, model, persona, no_context).await?,
        Commands::Ask {
            prompt,
            page,
            model,
            persona,
        } => run_ask(&prompt, page, model, persona).await?,
        Commands::Models => list_models(),
    }

    Ok(())
}

/// Log to a file next to the config; the TUI owns the terminal.
fn init_tracing() -> Result<()> {
    let dir = Config::app_dir()?;
    std::fs::create_dir_all(&dir)?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("zenith.log"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("zenith=info")),
        )
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

fn resolve_options(
    config: &Config,
    model: Option<String>,
    persona: Option<String>,
) -> Result<(GeminiClient, AiModel, Persona)> {
    let Some(api_key) = config.resolved_api_key() else {
        bail!(
            "No API key configured. Set GEMINI_API_KEY or add \"api_key\" to the zenith config file."
        );
    };

    let model = match model {
        Some(s) => match AiModel::from_str(&s) {
            Some(model) => model,
            None => bail!("Unknown model '{s}'. Expected one of: flash, pro, deep"),
        },
        None => config.default_model.unwrap_or(AiModel::Flash),
    };

    let persona = match persona {
        Some(s) => match Persona::from_str(&s) {
            Some(persona) => persona,
            None => bail!("Unknown persona '{s}'. Expected one of: general, slang, local"),
        },
        None => config.persona(),
    };

    Ok((GeminiClient::new(&api_key), model, persona))
}

async fn run_chat(
    page: Option<PathBuf>,
    model: Option<String>,
    persona: Option<String>,
    no_context: bool,
) -> Result<()> {
    let config = Config::load().unwrap_or_default();
    let (client, model, persona) = resolve_options(&config, model, persona)?;

    let page_context = page::load(page.as_deref())?;
    let context_enabled = !no_context && config.context_enabled.unwrap_or(true);

    let orchestrator = Orchestrator::new(client);
    let mut app = App::new(orchestrator, page_context, model, context_enabled, persona);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run_loop(&mut app, &mut terminal).await;
    tui::restore()?;
    result
}

enum LoopEvent {
    Input(Option<AppEvent>),
    Turn(Result<TurnUpdate>),
}

async fn run_loop(app: &mut App<GeminiClient>, terminal: &mut tui::Tui) -> Result<()> {
    let mut events = tui::EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        // Branch bodies must not touch `app`: the turn future borrows it.
        let next = tokio::select! {
            event = events.next() => LoopEvent::Input(event),
            update = app.orchestrator.tick() => LoopEvent::Turn(update),
        };

        match next {
            LoopEvent::Input(Some(event)) => handler::handle_event(app, event)?,
            LoopEvent::Input(None) => break,
            LoopEvent::Turn(update) => {
                update?;
                app.scroll_chat_to_bottom();
            }
        }
    }

    Ok(())
}

async fn run_ask(
    question: &str,
    page: Option<PathBuf>,
    model: Option<String>,
    persona: Option<String>,
) -> Result<()> {
    let config = Config::load().unwrap_or_default();
    let (client, model, persona) = resolve_options(&config, model, persona)?;

    let context = match page {
        Some(path) => Some(page::load(Some(&path))?),
        None => None,
    };

    let lexicon = Lexicon::sheng();
    let hints = lexicon.annotate(question);
    let payload = prompt::compose(question, context.as_deref(), &hints);
    let (model_id, generation_config) = model.resolve();

    let request = GenerationRequest {
        model_id: model_id.to_string(),
        config: generation_config,
        payload,
        system_instruction: persona.instruction().to_string(),
    };

    println!(
        "🤖 Querying {} with your question...\n",
        model.display_name().bold().magenta()
    );

    match client.generate(&request).await {
        Ok(response) => {
            println!("{}", "Response:".bold().green());
            println!("{}", response);
        }
        Err(e) => {
            println!("{}: {}", "Error querying Gemini".red(), e);
            println!(
                "Check your API key and network connection. Logs: {}",
                "~/.config/zenith/zenith.log".bold()
            );
        }
    }

    Ok(())
}

fn list_models() {
    println!("\n{}", "🧠 Logical Models".bold().blue());
    println!("{}", "=".repeat(50).dimmed());

    for model in AiModel::all() {
        let (backend_id, config) = model.resolve();
        let note = match config.thinking_budget {
            Some(budget) => format!(" (thinking budget {budget})"),
            None => String::new(),
        };
        println!(
            "  {} {} → {}{}",
            model.as_str().bold().yellow(),
            model.display_name().green(),
            backend_id.dimmed(),
            note.dimmed()
        );
    }
}
