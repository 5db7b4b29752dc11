use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use anyhow::{Context, Result, anyhow};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use letta_chat_core::envfile::{AGENT_ID_KEY, API_KEY_KEY};
use letta_chat_core::letta::AgentService;
use letta_chat_core::render::view::format_timestamp;
use letta_chat_core::{
    normalize, render_message, setup, ChatMessage, ChatRole, Config, CopyButton, EnvFile,
    LettaClient, SetupError, Step, SystemClipboard, SUGGESTIONS,
};
use letta_chat_core::suggestions::suggestion;

#[derive(Parser)]
#[command(name = "letta-chat")]
#[command(about = "Chat with a Letta agent and set one up")]
struct Cli {
    /// Letta API key
    #[arg(long, global = true, env = "LETTA_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Letta API base URL
    #[arg(long, global = true, env = "LETTA_BASE_URL")]
    base_url: Option<String>,

    /// Env file holding the agent ID
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or validate the chat agent and record its ID
    Setup,
    /// Render a message read from stdin as HTML
    Render {
        /// Message role (user or assistant)
        #[arg(short, long, default_value = "assistant")]
        role: String,
        /// Stamp the message with the current time
        #[arg(long)]
        timestamp: bool,
    },
    /// Send a message to the agent and print the reply
    Chat {
        /// Your message; omit to see suggestions
        message: Option<String>,
        /// Send suggestion N from `letta-chat suggestions` instead
        #[arg(short, long, conflicts_with = "message")]
        suggestion: Option<usize>,
        /// Print the reply as HTML
        #[arg(long)]
        html: bool,
        /// Copy the raw reply to the clipboard
        #[arg(long)]
        copy: bool,
    },
    /// List suggested prompts
    Suggestions,
    /// Show the saved config, updating it when values are given
    Config {
        /// Model for newly created agents
        #[arg(long)]
        model: Option<String>,
        /// Embedding model for newly created agents
        #[arg(long)]
        embedding: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match Config::load() {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e.context("Failed to load config")),
    };

    if let Err(e) = result {
        print_error(&e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let base_url = cli
        .base_url
        .clone()
        .unwrap_or_else(|| config.base_url().to_string());
    let env = resolve_env_file(cli.env_file.as_deref(), &config)?;

    match cli.command {
        Commands::Setup => run_setup(cli.api_key, &base_url, &env, &config).await,
        Commands::Render { role, timestamp } => render_stdin(&role, timestamp),
        Commands::Chat { message, suggestion: picked, html, copy } => {
            let message = match picked {
                Some(number) => Some(
                    suggestion(number)
                        .ok_or_else(|| anyhow!("No suggestion numbered {}", number))?
                        .prompt(),
                ),
                None => message,
            };
            match message {
                Some(message) => chat(&message, cli.api_key, &base_url, &env, html, copy).await,
                None => {
                    list_suggestions();
                    Ok(())
                }
            }
        }
        Commands::Suggestions => {
            list_suggestions();
            Ok(())
        }
        Commands::Config { model, embedding } => configure(config, model, embedding),
    }
}

fn resolve_env_file(flag: Option<&Path>, config: &Config) -> Result<EnvFile> {
    if let Some(path) = flag.or(config.env_file.as_deref()) {
        return Ok(EnvFile::new(path));
    }
    let cwd = std::env::current_dir().context("Could not determine working directory")?;
    Ok(EnvFile::in_dir(&cwd))
}

fn print_error(e: &anyhow::Error) {
    if let Some(setup_error) = e.downcast_ref::<SetupError>() {
        eprintln!("{} {}", "❌".red(), setup_error.to_string().red());
        let steps = setup_error.remediation();
        if !steps.is_empty() {
            println!("📝 Please:");
            for step in steps {
                println!("{}", step);
            }
        }
    } else {
        eprintln!("{} {}", "❌".red(), format!("{:#}", e).red());
    }
}

async fn run_setup(api_key: Option<String>, base_url: &str, env: &EnvFile, config: &Config) -> Result<()> {
    println!("{}", "🚀 Setting up Letta agent...".bold());

    setup(
        api_key,
        |key: &str| {
            println!("✅ Connected to Letta at {}", base_url.cyan());
            LettaClient::with_base_url(key, base_url)
        },
        env,
        config.preset(),
        |step| print_step(step, env),
    )
    .await
    .context("Setup failed")?;

    println!("\n{}", "✨ Setup complete! Your agent is ready to use.".bold().green());
    println!("💡 Run {} to start chatting", "letta-chat chat \"Hello\"".bold());
    Ok(())
}

fn print_step(step: Step, env: &EnvFile) {
    match step {
        Step::FoundExisting(id) => println!("🔍 Found existing agent ID: {}", id.yellow()),
        Step::Validating => println!("🧪 Validating existing agent..."),
        Step::Validated => println!("{}", "✅ Existing agent validation successful!".green()),
        Step::ValidationFailed(reason) => {
            println!("{}", "⚠️  Existing agent validation failed, creating new agent...".yellow());
            println!("Error details: {}", reason.dimmed());
        }
        Step::Creating => println!("🤖 Creating new chat agent..."),
        Step::Created(id) => println!("✅ Agent created with ID: {}", id.green()),
        Step::SmokeTesting => println!("🧪 Testing new agent..."),
        Step::Reply(reply) => println!("🎉 Agent response: {}", reply),
        Step::Persisted => println!("📝 Updated {} with agent ID", env.path().display()),
        Step::KeptExisting => println!("📝 Using existing agent ID from {}", env.path().display()),
    }
}

fn render_stdin(role: &str, timestamp: bool) -> Result<()> {
    let role = ChatRole::from_str(role)
        .ok_or_else(|| anyhow!("Unknown role '{}': expected user or assistant", role))?;

    let mut content = String::new();
    std::io::stdin()
        .read_to_string(&mut content)
        .context("Failed to read message from stdin")?;

    let mut message = ChatMessage::new(role, content.trim_end_matches('\n'));
    if timestamp {
        message = message.stamped_now();
    }

    println!("{}", render_message(&message));
    Ok(())
}

async fn chat(
    text: &str,
    api_key: Option<String>,
    base_url: &str,
    env: &EnvFile,
    html: bool,
    copy: bool,
) -> Result<()> {
    let contents = env.load()?;
    let api_key = api_key
        .or_else(|| contents.get(API_KEY_KEY))
        .ok_or(SetupError::MissingApiKey)?;
    let agent_id = std::env::var(AGENT_ID_KEY)
        .ok()
        .filter(|id| !id.trim().is_empty())
        .or_else(|| letta_chat_core::provision::existing_agent_id(&contents))
        .ok_or_else(|| SetupError::MissingAgentId(env.path().display().to_string()))?;

    let client = LettaClient::with_base_url(&api_key, base_url);
    let batch = client
        .send_message(&agent_id, text)
        .await
        .context("Failed to message the agent")?;
    let raw = batch.assistant_reply().ok_or(SetupError::NoAssistantReply)?;
    let reply = ChatMessage::assistant(raw).stamped_now();

    if html {
        println!("{}", render_message(&reply));
    } else {
        let time = reply.timestamp.as_ref().map(format_timestamp).unwrap_or_default();
        println!("{} {}", "🤖 TrustyKitty".bold().blue(), time.dimmed());
        println!("{}", normalize(&reply.content));
    }

    if copy {
        let mut button = CopyButton::new();
        let now = Instant::now();
        if button.copy(&mut SystemClipboard, &reply.content, now) {
            println!("📋 {}", button.title(now).green());
        }
    }

    Ok(())
}

fn list_suggestions() {
    println!("\n{}", "💬 Try asking".bold().blue());
    println!("{}", "=".repeat(30).dimmed());
    for (i, suggestion) in SUGGESTIONS.iter().enumerate() {
        println!("  {}. {} {}", i + 1, suggestion.title.green(), suggestion.subtitle.dimmed());
    }
    println!("\n💡 Send one with {}", "letta-chat chat --suggestion N".bold());
}

fn configure(mut config: Config, model: Option<String>, embedding: Option<String>) -> Result<()> {
    let changed = model.is_some() || embedding.is_some();
    if let Some(model) = model {
        config.model = Some(model);
    }
    if let Some(embedding) = embedding {
        config.embedding = Some(embedding);
    }

    let path = Config::get_config_path()?;
    if changed {
        config.save().context("Failed to save config")?;
        println!("✅ Saved {}", path.display());
    } else {
        println!("📄 {}", path.display());
    }

    let preset = config.preset();
    println!("  base_url:  {}", config.base_url().cyan());
    println!("  model:     {}", preset.model.cyan());
    println!("  embedding: {}", preset.embedding.cyan());
    if let Some(env_file) = &config.env_file {
        println!("  env_file:  {}", env_file.display());
    }
    Ok(())
}
