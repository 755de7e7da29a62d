//! Fact-check pipeline CLI
//!
//! `pipeline run` takes the next topic from the queue through research,
//! extraction, rendering, validation and publishing. The other commands
//! manage the queue and help editors with existing report records.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pipeline_core::config::{Capability, Config, Credentials};
use pipeline_core::notify::{FanoutNotifier, LogNotifier, Notifier, WebhookNotifier};
use pipeline_core::orchestrator::{Deadlines, Orchestrator, RunOptions};
use pipeline_core::publish::{GitCli, HttpBlobStore, Mirror, Publisher, RestKvStore};
use pipeline_core::queue::{NewTopic, Priority, StatusExtras, TopicFilter, TopicQueue, TopicStatus};
use report::{HttpLinkProbe, Report, Validator};
use research::{
    ApiCredentials, ArtifactStore, ExtractionDriver, OpenAIChat, OpenAIDeepResearch,
    PerplexityDeepResearch, ResearchDriver, TemplateLibrary,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pipeline")]
#[command(about = "Research, render and publish fact-check reports")]
struct Cli {
    /// Config file (defaults to ./factdesk.toml when present)
    #[arg(long, global = true, env = "FACTDESK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline for the next topic
    Run {
        /// Run a known topic, skipping stages that already finished
        #[arg(long)]
        slug: Option<String>,
        /// Stop after research
        #[arg(long)]
        research_only: bool,
        /// Log what would happen without writing anything
        #[arg(long)]
        dry_run: bool,
        /// Redo extraction and publishing even when their outputs exist
        #[arg(long)]
        force: bool,
        #[arg(long)]
        skip_link_check: bool,
    },

    /// Manage the topic queue
    Queue {
        #[command(subcommand)]
        command: QueueCommands,
    },

    /// Render an existing report record to HTML
    Render {
        slug: String,
        /// Write here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Validate an existing report record
    Validate {
        slug: String,
        #[arg(long)]
        skip_link_check: bool,
    },
}

#[derive(Subcommand)]
enum QueueCommands {
    /// List topics
    List {
        #[arg(long)]
        status: Option<TopicStatus>,
        #[arg(long)]
        category: Option<String>,
    },

    /// Queue a new topic
    Add {
        name: String,
        #[arg(long)]
        category: String,
        #[arg(long, default_value = "medium")]
        priority: Priority,
        #[arg(long)]
        template: Option<String>,
        /// Use this slug instead of deriving one from the name
        #[arg(long)]
        slug: Option<String>,
    },

    /// Put a failed or needs-review topic back in line
    Reset { slug: String },

    /// Mark a topic failed
    Fail {
        slug: String,
        #[arg(long, default_value = "failed by operator")]
        reason: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pipeline_core=debug,research=debug,report=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load config")?;

    let code = match cli.command {
        Commands::Run {
            slug,
            research_only,
            dry_run,
            force,
            skip_link_check,
        } => {
            let options = RunOptions {
                slug,
                research_only,
                dry_run,
                force,
                skip_link_check,
            };
            cmd_run(&config, &options).await?
        }
        Commands::Queue { command } => cmd_queue(&config, command)?,
        Commands::Render { slug, out } => cmd_render(&config, &slug, out)?,
        Commands::Validate {
            slug,
            skip_link_check,
        } => cmd_validate(&config, &slug, skip_link_check).await?,
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

async fn cmd_run(config: &Config, options: &RunOptions) -> Result<i32> {
    let credentials = Credentials::from_env();
    let orchestrator = build_orchestrator(config, &credentials)?;

    let outcome = orchestrator
        .run(options)
        .await
        .context("Pipeline run failed")?;
    tracing::info!(outcome = ?outcome, "Run finished");
    Ok(outcome.exit_code())
}

fn cmd_queue(config: &Config, command: QueueCommands) -> Result<i32> {
    let queue = TopicQueue::new(&config.paths.queue);

    match command {
        QueueCommands::List { status, category } => {
            let topics = queue.list(&TopicFilter { status, category })?;
            if topics.is_empty() {
                println!("No topics");
            }
            for topic in topics {
                println!(
                    "{:<12} {:<6} {:<40} {} ({})",
                    topic.status.as_str(),
                    topic.priority.as_str(),
                    topic.slug,
                    topic.name,
                    topic.category
                );
                if let Some(error) = &topic.last_error {
                    println!("{:>20} {}", "last error:", error);
                }
            }
        }
        QueueCommands::Add {
            name,
            category,
            priority,
            template,
            slug,
        } => {
            let mut new = NewTopic::new(name, category).with_priority(priority);
            if let Some(template) = template {
                new = new.with_template(template);
            }
            if let Some(slug) = slug {
                new = new.with_slug(slug);
            }
            let topic = queue.add(new).context("Failed to queue topic")?;
            println!("{}", topic.slug);
        }
        QueueCommands::Reset { slug } => {
            let topic = queue.reset(&slug).context("Failed to reset topic")?;
            println!("{} is {}", topic.slug, topic.status);
        }
        QueueCommands::Fail { slug, reason } => {
            let topic = queue
                .set_status(&slug, TopicStatus::Failed, StatusExtras::error(reason))
                .context("Failed to mark topic failed")?;
            println!("{} is {}", topic.slug, topic.status);
        }
    }
    Ok(0)
}

fn cmd_render(config: &Config, slug: &str, out: Option<PathBuf>) -> Result<i32> {
    let report = load_report(config, slug)?;
    let html = report::render(&report);
    match out {
        Some(path) => {
            research::artifacts::write_atomic(&path, html.as_bytes())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{}", path.display());
        }
        None => println!("{}", html),
    }
    Ok(0)
}

async fn cmd_validate(config: &Config, slug: &str, skip_link_check: bool) -> Result<i32> {
    let report = load_report(config, slug)?;
    let html = report::render(&report);
    let validator =
        build_validator(config).with_link_check(config.validation.link_check && !skip_link_check);
    let outcome = validator.validate(&report, Some(&html)).await;

    for finding in &outcome.findings {
        println!("{}", finding);
    }
    println!(
        "{} error(s), {} warning(s){}",
        outcome.error_count(),
        outcome.warning_count(),
        if outcome.links_checked { "" } else { ", links not checked" }
    );
    Ok(if outcome.is_publishable() { 0 } else { 1 })
}

// ============================================================================
// Wiring
// ============================================================================

fn load_report(config: &Config, slug: &str) -> Result<Report> {
    let store = ArtifactStore::new(&config.paths.artifacts);
    match store.read_report(slug)? {
        Some(report) => Ok(report.with_context(|| format!("Report record for '{}' is invalid", slug))?),
        None => bail!(
            "No report record at {}",
            store.report_path(slug).display()
        ),
    }
}

fn build_validator(config: &Config) -> Validator {
    let timeout = Duration::from_secs(config.validation.link_timeout_secs);
    let mut validator = Validator::new(Arc::new(HttpLinkProbe::new(timeout)))
        .with_link_check(config.validation.link_check)
        .with_deadline(timeout);
    if let Some(max) = config.validation.max_parallel_links {
        validator = validator.with_max_parallel(max);
    }
    validator
}

fn build_orchestrator(config: &Config, credentials: &Credentials) -> Result<Orchestrator> {
    let store = ArtifactStore::new(&config.paths.artifacts);
    let templates = TemplateLibrary::with_dir(&config.paths.templates);
    let research = ResearchDriver::new(store.clone(), templates).with_settings(config.poll_settings());

    let mut publisher = Publisher::new(&config.paths.site_reports, &config.paths.site_index);
    if config.publish.git_commit {
        publisher = publisher.with_vcs(Arc::new(GitCli::new(&config.publish.repo_root)));
    }
    if config.publish.mirror {
        let blob_token = credentials.require(Capability::BlobStore)?.clone();
        let kv_token = credentials.require(Capability::KvStore)?.clone();
        let kv_url = credentials
            .kv_url
            .clone()
            .ok_or_else(|| Capability::KvStore.missing())?;
        publisher = publisher.with_mirror(Mirror::new(
            Arc::new(HttpBlobStore::new(blob_token)),
            Arc::new(RestKvStore::new(kv_url, kv_token)),
        ));
    }

    let mut notifier = FanoutNotifier::new().with(Arc::new(LogNotifier));
    if let Some(url) = &credentials.notify_webhook_url {
        notifier = notifier.with(Arc::new(WebhookNotifier::new(url.clone())));
    }
    let notifier: Arc<dyn Notifier> = Arc::new(notifier);

    let mut orchestrator = Orchestrator::new(
        TopicQueue::new(&config.paths.queue),
        research,
        build_validator(config),
        publisher,
    )
    .with_notifier(notifier)
    .with_deadlines(Deadlines {
        primary: config.primary_deadline(),
        fallback: config.fallback_deadline(),
        extraction: config.extraction_deadline(),
    })
    .with_run_lock(config.run_lock_path())
    .with_headless(config.research.headless)
    .with_default_template(config.research.default_template.clone())
    .with_extraction_retries(config.extraction.stage_retries);

    // Providers are optional here; the orchestrator fails the run with a
    // config error when it reaches a stage whose credential is missing.
    if let Some(key) = &credentials.openai_api_key {
        let mut factory = OpenAIDeepResearch::new(key.clone());
        if let Some(model) = &config.research.primary_model {
            factory = OpenAIDeepResearch::with_credentials(ApiCredentials::new(
                key.clone(),
                model.clone(),
                research::session::openai::DEFAULT_BASE_URL,
            ));
        }
        orchestrator = orchestrator.with_primary(Arc::new(factory));
    }
    if let Some(key) = &credentials.perplexity_api_key {
        let mut factory = PerplexityDeepResearch::new(key.clone());
        if let Some(model) = &config.research.fallback_model {
            factory = PerplexityDeepResearch::with_credentials(ApiCredentials::new(
                key.clone(),
                model.clone(),
                research::session::perplexity::DEFAULT_BASE_URL,
            ));
        }
        orchestrator = orchestrator.with_fallback(Arc::new(factory));
    }
    if let Some(key) = &credentials.extractor_api_key {
        let ai = OpenAIChat::new(key.clone()).with_model(config.extraction.model.clone());
        orchestrator = orchestrator.with_extraction(
            ExtractionDriver::new(Arc::new(ai), store).with_max_raw_chars(config.extraction.max_raw_chars),
        );
    }

    Ok(orchestrator)
}
