//! Command-line interface for pulse.
//!
//! Provides the long-running `run` command plus one-shot versions of each
//! trigger and read-only inspection commands.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::adapters::{
    display_price, CoinbaseFeed, GeminiClient, Notifier, TelegramClient, XClient,
};
use crate::config::ResolvedConfig;
use crate::core::{
    spawn_notifier, ContentPipeline, DrainOutcome, EventSink, Publisher, PulseContext,
    QueueHandle, RefillOutcome, Scheduler, WorkQueue,
};
use crate::domain::{describe_period, preview, PulseEvent};
use crate::logging;

/// How long one-shot commands wait for queued notifications to go out
const NOTIFY_FLUSH: Duration = Duration::from_secs(10);

/// pulse - Scheduled market-topic content pipeline
#[derive(Parser, Debug)]
#[command(name = "pulse")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the refill, drain, and heartbeat triggers until killed
    Run,

    /// Run one refill cycle now
    Cycle,

    /// Publish the next queued post now
    Publish,

    /// Send one heartbeat now
    Heartbeat,

    /// List pending posts
    Queue {
        /// Maximum number of posts to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Commands {
    /// Commands that drive the pipeline also write the log file
    fn logs_to_file(&self) -> bool {
        matches!(
            self,
            Self::Run | Self::Cycle | Self::Publish | Self::Heartbeat
        )
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let config = crate::config::config()?;

        let _guard = if self.command.logs_to_file() {
            Some(logging::init(&config.log_dir)?)
        } else {
            logging::init_console();
            None
        };

        let result = match self.command {
            Commands::Run => run(config).await,
            Commands::Cycle => cycle(config).await,
            Commands::Publish => publish(config).await,
            Commands::Heartbeat => heartbeat(config).await,
            Commands::Queue { limit } => show_queue(config, limit).await,
            Commands::Config => show_config(config),
        };

        // Logged here so it reaches the file before the guard flushes
        if let Err(e) = &result {
            error!(kind = "fatal", "Fatal error: {:#}", e);
        }

        result
    }
}

/// Wire adapters, queue, and notifier into a context.
///
/// With `announce`, the startup notice is emitted before the queue loads.
async fn build_context(
    config: &ResolvedConfig,
    require_publisher: bool,
    announce: bool,
) -> Result<(Arc<PulseContext>, JoinHandle<()>)> {
    let (events, rx) = EventSink::channel();

    let notifier = config
        .credentials
        .telegram
        .clone()
        .map(|t| Arc::new(TelegramClient::from_config(t)) as Arc<dyn Notifier>);
    let notifier_task = spawn_notifier(
        rx,
        notifier,
        config.content.clone(),
        config.timeouts.notify(),
    );

    let publisher = match config.credentials.x.clone() {
        Some(creds) => Some(Publisher::new(
            Arc::new(XClient::new(creds)),
            config.content.max_post_length,
            config.timeouts.publish(),
        )),
        None if require_publisher => anyhow::bail!(
            "X credentials missing: set X_API_KEY, X_API_SECRET, X_ACCESS_TOKEN, X_ACCESS_TOKEN_SECRET"
        ),
        None => None,
    };

    if announce {
        events.emit(PulseEvent::Started {
            refill_every: describe_period(config.schedule.refill_every()),
            drain_every: describe_period(config.schedule.drain_every()),
            heartbeat_every: describe_period(config.schedule.heartbeat_every()),
        });
    }

    let queue = QueueHandle::spawn(WorkQueue::load(&config.queue_file).await);

    let mut ctx = PulseContext::new(
        queue,
        events,
        Arc::new(CoinbaseFeed::new(&config.content.price_pair)),
        config.timeouts.price(),
        config.schedule.clone(),
    );

    match &config.credentials.gemini_api_key {
        Some(key) => {
            let generator = Arc::new(GeminiClient::new(key, &config.content.model));
            ctx = ctx.with_pipeline(ContentPipeline::new(
                generator,
                config.content.clone(),
                config.timeouts.clone(),
            ));
        }
        None => info!("GEMINI_API_KEY not set, content generation disabled"),
    }

    if let Some(publisher) = publisher {
        ctx = ctx.with_publisher(publisher);
    }

    Ok((Arc::new(ctx), notifier_task))
}

/// Drop the context and give the notifier a moment to drain its backlog
async fn finish(ctx: Arc<PulseContext>, notifier_task: JoinHandle<()>) {
    drop(ctx);
    if tokio::time::timeout(NOTIFY_FLUSH, notifier_task).await.is_err() {
        info!("Gave up waiting for pending notifications");
    }
}

/// Run the bot until killed
async fn run(config: &ResolvedConfig) -> Result<()> {
    info!(queue = %config.queue_file.display(), "Pulse bot starting");

    let (ctx, _notifier_task) = build_context(config, true, true).await?;

    Scheduler::new(ctx).run().await
}

/// One refill cycle
async fn cycle(config: &ResolvedConfig) -> Result<()> {
    let (ctx, notifier_task) = build_context(config, false, false).await?;
    let outcome = ctx.refill().await;
    finish(ctx, notifier_task).await;

    match outcome {
        RefillOutcome::Queued { added, pending } => {
            println!("Queued {} posts ({} pending)", added, pending)
        }
        RefillOutcome::QueueFailed => anyhow::bail!("Generated posts could not be queued"),
        other => println!("Nothing queued: {:?}", other),
    }
    Ok(())
}

/// Publish the next item
async fn publish(config: &ResolvedConfig) -> Result<()> {
    let (ctx, notifier_task) = build_context(config, true, false).await?;
    let outcome = ctx.drain().await;
    finish(ctx, notifier_task).await;

    match outcome {
        DrainOutcome::Published(published) => {
            println!("Posted {}", published.permalink);
            Ok(())
        }
        DrainOutcome::Empty => {
            println!("Queue is empty");
            Ok(())
        }
        DrainOutcome::Failed => anyhow::bail!("Post failed; the item was removed from the queue"),
        other => anyhow::bail!("Nothing published: {:?}", other),
    }
}

/// One heartbeat
async fn heartbeat(config: &ResolvedConfig) -> Result<()> {
    let (ctx, notifier_task) = build_context(config, false, false).await?;
    let report = ctx.heartbeat().await;
    finish(ctx, notifier_task).await;

    println!(
        "Queue: {} posts, {}: {}",
        report.queue_len,
        config.content.ticker,
        display_price(report.price)
    );
    Ok(())
}

/// List pending posts
async fn show_queue(config: &ResolvedConfig, limit: usize) -> Result<()> {
    let queue = WorkQueue::load(&config.queue_file).await;

    if queue.is_empty() {
        println!("Queue is empty");
        return Ok(());
    }

    println!("{:<6} {:<6} {:<80}", "INDEX", "IMAGE", "POST");
    println!("{}", "-".repeat(94));

    for item in queue.items().take(limit) {
        let image = if item.image_prompt.is_some() { "yes" } else { "no" };
        println!("{:<6} {:<6} {:<80}", item.index, image, preview(&item.text, 80));
    }

    if queue.len() > limit {
        println!("... and {} more", queue.len() - limit);
    }

    Ok(())
}

/// Indented YAML rendering of one settings section
fn section<T: serde::Serialize>(name: &str, value: &T) -> Result<String> {
    let yaml = serde_yaml::to_string(value)
        .with_context(|| format!("Failed to render {} settings", name))?;
    let body = yaml
        .lines()
        .map(|line| format!("  {}", line))
        .collect::<Vec<_>>()
        .join("\n");
    Ok(format!("{}:\n{}", name, body))
}

/// Show resolved configuration
fn show_config(config: &ResolvedConfig) -> Result<()> {
    let present = |set: bool| if set { "set" } else { "missing" };
    let creds = &config.credentials;

    match &config.config_file {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (none, using defaults)"),
    }
    println!("Home:        {}", config.home.display());
    println!("Queue file:  {}", config.queue_file.display());
    println!("Log dir:     {}", config.log_dir.display());
    println!();
    println!("{}", section("Schedule", &config.schedule)?);
    println!("{}", section("Timeouts", &config.timeouts)?);
    println!("{}", section("Content", &config.content)?);
    println!();
    println!("Credentials:");
    println!("  GEMINI_API_KEY: {}", present(creds.gemini_api_key.is_some()));
    println!("  Telegram:       {}", present(creds.telegram.is_some()));
    println!("  X:              {}", present(creds.x.is_some()));

    Ok(())
}
