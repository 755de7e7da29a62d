//! One topic, end to end.
//!
//! Only this module maps stage errors onto topic status. Drivers report what
//! went wrong; the orchestrator decides whether that means `failed`,
//! `needs_review`, a fallback, or a fatal error for the run.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use report::{Report, Validator};
use research::{
    ExtractionDriver, ExtractionError, ExtractionRequest, JobStatus, ResearchDriver,
    ResearchError, ResearchOutcome, ResearchRequest, SessionFactory, DEFAULT_TEMPLATE_ID,
};
use tracing::{error, info, warn};

use crate::config::Capability;
use crate::error::{PipelineError, Result};
use crate::lockfile::LockFile;
use crate::notify::{LogNotifier, Notification, Notifier, Outcome, Stage};
use crate::publish::Publisher;
use crate::queue::{StatusExtras, Topic, TopicQueue, TopicStatus};

/// Wall-clock budget per stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadlines {
    pub primary: Duration,
    pub fallback: Duration,
    pub extraction: Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            primary: Duration::from_secs(60 * 60),
            fallback: Duration::from_secs(30 * 60),
            extraction: Duration::from_secs(10 * 60),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Run this topic instead of the next pending one.
    pub slug: Option<String>,
    pub research_only: bool,
    pub dry_run: bool,
    /// Redo extraction and publishing even when their outputs exist.
    pub force: bool,
    pub skip_link_check: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No pending topic and nothing to resume.
    NothingToDo,
    Published {
        slug: String,
        html_path: PathBuf,
        warnings: usize,
    },
    AlreadyPublished {
        slug: String,
    },
    ResearchOnly {
        slug: String,
        raw_chars: usize,
    },
    NeedsReview {
        slug: String,
        stage: Stage,
        reason: String,
    },
    Failed {
        slug: String,
        stage: Stage,
        reason: String,
    },
    DryRun {
        slug: String,
        actions: Vec<String>,
    },
}

impl RunOutcome {
    /// 0 success, 1 the topic did not make it, 2 nothing to do.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::NothingToDo => 2,
            RunOutcome::NeedsReview { .. } | RunOutcome::Failed { .. } => 1,
            _ => 0,
        }
    }
}

/// How research for a topic ended after primary and fallback.
enum ResearchVerdict {
    Completed,
    /// Research returned, but too little of it.
    Short(ResearchOutcome),
    Failed(String),
}

pub struct Orchestrator {
    queue: TopicQueue,
    research: ResearchDriver,
    validator: Validator,
    publisher: Publisher,
    primary: Option<Arc<dyn SessionFactory>>,
    fallback: Option<Arc<dyn SessionFactory>>,
    extraction: Option<ExtractionDriver>,
    notifier: Arc<dyn Notifier>,
    deadlines: Deadlines,
    run_lock: Option<PathBuf>,
    today: Option<NaiveDate>,
    headless: bool,
    default_template: String,
    extraction_retries: u32,
}

impl Orchestrator {
    pub fn new(
        queue: TopicQueue,
        research: ResearchDriver,
        validator: Validator,
        publisher: Publisher,
    ) -> Self {
        Self {
            queue,
            research,
            validator,
            publisher,
            primary: None,
            fallback: None,
            extraction: None,
            notifier: Arc::new(LogNotifier),
            deadlines: Deadlines::default(),
            run_lock: None,
            today: None,
            headless: true,
            default_template: DEFAULT_TEMPLATE_ID.to_string(),
            extraction_retries: 1,
        }
    }

    pub fn with_primary(mut self, factory: Arc<dyn SessionFactory>) -> Self {
        self.primary = Some(factory);
        self
    }

    pub fn with_fallback(mut self, factory: Arc<dyn SessionFactory>) -> Self {
        self.fallback = Some(factory);
        self
    }

    pub fn with_extraction(mut self, driver: ExtractionDriver) -> Self {
        self.extraction = Some(driver);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_deadlines(mut self, deadlines: Deadlines) -> Self {
        self.deadlines = deadlines;
        self
    }

    /// Hold this lock file for the whole run.
    pub fn with_run_lock(mut self, path: impl Into<PathBuf>) -> Self {
        self.run_lock = Some(path.into());
        self
    }

    /// Pin the research and publish date. Defaults to today (UTC).
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_default_template(mut self, template_id: impl Into<String>) -> Self {
        self.default_template = template_id.into();
        self
    }

    /// Extra extraction attempts after a provider failure or timeout.
    pub fn with_extraction_retries(mut self, retries: u32) -> Self {
        self.extraction_retries = retries;
        self
    }

    pub fn queue(&self) -> &TopicQueue {
        &self.queue
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Run the pipeline for one topic.
    pub async fn run(&self, options: &RunOptions) -> Result<RunOutcome> {
        let _lock = match (&self.run_lock, options.dry_run) {
            (Some(path), false) => Some(LockFile::acquire(path)?),
            _ => None,
        };

        let Some(topic) = self.select(options)? else {
            info!("Nothing to do");
            return Ok(RunOutcome::NothingToDo);
        };

        if topic.status == TopicStatus::Completed
            && !options.force
            && self.publisher.is_published(&topic.slug)
        {
            info!(slug = %topic.slug, "Topic already published");
            return Ok(RunOutcome::AlreadyPublished { slug: topic.slug });
        }

        if options.dry_run {
            let actions = self.plan(&topic, options);
            for action in &actions {
                info!(slug = %topic.slug, action = %action, "Dry run");
            }
            return Ok(RunOutcome::DryRun {
                slug: topic.slug,
                actions,
            });
        }

        self.process(topic, options).await
    }

    /// `--slug`, else the next pending topic, else a topic whose research
    /// finished but which never reached `completed`.
    fn select(&self, options: &RunOptions) -> Result<Option<Topic>> {
        if let Some(slug) = &options.slug {
            let topic = self
                .queue
                .get(slug)?
                .ok_or_else(|| crate::error::QueueError::UnknownSlug(slug.clone()))?;
            if matches!(topic.status, TopicStatus::Failed | TopicStatus::NeedsReview) {
                return Err(PipelineError::NotRunnable {
                    slug: topic.slug,
                    status: topic.status,
                });
            }
            return Ok(Some(topic));
        }

        if let Some(topic) = self.queue.next_pending()? {
            return Ok(Some(topic));
        }

        for job in self.research.store().list_jobs()? {
            if job.status != JobStatus::Completed {
                continue;
            }
            if let Some(topic) = self.queue.get(&job.slug)? {
                if matches!(topic.status, TopicStatus::Processing | TopicStatus::Researching) {
                    info!(slug = %topic.slug, status = %topic.status, "Resuming interrupted topic");
                    return Ok(Some(topic));
                }
            }
        }
        Ok(None)
    }

    fn research_done(&self, slug: &str) -> Result<bool> {
        Ok(self
            .research
            .store()
            .read_job(slug)?
            .is_some_and(|job| job.status == JobStatus::Completed))
    }

    fn plan(&self, topic: &Topic, options: &RunOptions) -> Vec<String> {
        let slug = &topic.slug;
        let store = self.research.store();
        let mut actions = Vec::new();

        if topic.status == TopicStatus::Pending {
            actions.push(format!("mark {} processing", slug));
        }
        if !self.research_done(slug).unwrap_or(false) {
            let primary = self.primary.as_ref().map_or("<unconfigured>", |f| f.name());
            actions.push(format!(
                "research '{}' with {} (template {})",
                topic.name,
                primary,
                self.template_for(topic)
            ));
            if let Some(fallback) = &self.fallback {
                actions.push(format!("fall back to {} if primary fails", fallback.name()));
            }
        }
        if options.research_only {
            return actions;
        }
        if options.force || !store.report_exists(slug) {
            actions.push(format!("extract {}", store.report_path(slug).display()));
        }
        actions.push(format!("render {}", slug));
        actions.push(if options.skip_link_check {
            format!("validate {} (links skipped)", slug)
        } else {
            format!("validate {}", slug)
        });
        actions.push(format!(
            "publish {} and list it in {}",
            self.publisher.html_path(slug).display(),
            self.publisher.index_path().display()
        ));
        actions.push(format!("mark {} completed", slug));
        actions
    }

    fn template_for(&self, topic: &Topic) -> String {
        topic
            .template_id
            .clone()
            .unwrap_or_else(|| self.default_template.clone())
    }

    async fn process(&self, mut topic: Topic, options: &RunOptions) -> Result<RunOutcome> {
        let slug = topic.slug.clone();
        info!(slug = %slug, name = %topic.name, status = %topic.status, "Processing topic");

        // Checked before the topic is touched so a missing key leaves it pending.
        let primary = if self.research_done(&slug)? {
            None
        } else {
            Some(
                self.primary
                    .clone()
                    .ok_or_else(|| Capability::PrimaryResearch.missing())?,
            )
        };

        if topic.status == TopicStatus::Pending {
            topic = self.set_status(&slug, TopicStatus::Processing, StatusExtras::default())?;
        }

        if let Some(primary) = primary {
            match self.research_stage(&topic, primary).await? {
                ResearchVerdict::Completed => {}
                ResearchVerdict::Short(outcome) => {
                    self.advance_to_researching(&topic)?;
                    let reason = format!(
                        "research returned only {} characters",
                        outcome.raw_chars
                    );
                    return self.needs_review(&topic, Stage::Research, reason).await;
                }
                ResearchVerdict::Failed(reason) => {
                    return self.fail(&topic, Stage::Research, reason).await;
                }
            }
        }

        topic = self.advance_to_researching(&topic)?;

        if options.research_only {
            let raw_chars = self
                .research
                .store()
                .read_job(&slug)?
                .map_or(0, |job| job.raw_chars);
            info!(slug = %slug, raw_chars, "Research only, stopping");
            return Ok(RunOutcome::ResearchOnly { slug, raw_chars });
        }

        let report = match self.report_for(&topic, options.force).await? {
            Ok(report) => report,
            Err(reason) => return self.needs_review(&topic, Stage::Extraction, reason).await,
        };

        let html = report::render(&report);

        let validator = if options.skip_link_check {
            self.validator.clone().without_link_check()
        } else {
            self.validator.clone()
        };
        let validation = validator.validate(&report, Some(&html)).await;
        for warning in validation.warnings() {
            warn!(slug = %slug, finding = %warning, "Validation warning");
        }
        if !validation.is_publishable() {
            for finding in validation.errors() {
                error!(slug = %slug, finding = %finding, "Validation error");
            }
            return self
                .needs_review(&topic, Stage::Validation, validation.error_summary())
                .await;
        }
        let warnings = validation.warning_count();

        let published = match self
            .publisher
            .publish(&report, &html, &topic.name, options.force)
            .await
        {
            Ok(published) => published,
            Err(e) => {
                error!(slug = %slug, error = %e, "Publishing failed");
                self.notify(&topic, Stage::Publish, Outcome::Failed, &e.to_string())
                    .await;
                return Err(e);
            }
        };

        if topic.status != TopicStatus::Completed {
            self.set_status(&slug, TopicStatus::Completed, StatusExtras::default())?;
        }

        self.notify(&topic, Stage::Publish, Outcome::Published, "")
            .await;
        Ok(RunOutcome::Published {
            slug,
            html_path: published.html_path,
            warnings,
        })
    }

    async fn research_stage(
        &self,
        topic: &Topic,
        primary: Arc<dyn SessionFactory>,
    ) -> Result<ResearchVerdict> {
        let request = ResearchRequest {
            slug: topic.slug.clone(),
            topic: topic.name.clone(),
            template_id: self.template_for(topic),
            headless: self.headless,
            today: self.today(),
        };

        let first = self
            .attempt_research(topic, primary.as_ref(), &request, self.deadlines.primary)
            .await?;
        if matches!(first, ResearchVerdict::Completed) {
            return Ok(first);
        }

        let Some(fallback) = self.fallback.clone() else {
            let err = Capability::FallbackResearch.missing();
            warn!(slug = %topic.slug, "Primary research did not complete and no fallback is configured");
            self.fail(topic, Stage::Research, err.to_string()).await?;
            return Err(err);
        };
        info!(slug = %topic.slug, provider = %fallback.name(), "Falling back");
        self.attempt_research(topic, fallback.as_ref(), &request, self.deadlines.fallback)
            .await
    }

    /// One provider under its stage deadline. Fatal errors mark the topic
    /// failed and end the run.
    async fn attempt_research(
        &self,
        topic: &Topic,
        factory: &dyn SessionFactory,
        request: &ResearchRequest,
        deadline: Duration,
    ) -> Result<ResearchVerdict> {
        let result = tokio::time::timeout(deadline, self.research.run(factory, request)).await;
        match result {
            Ok(Ok(outcome)) if outcome.status == JobStatus::Completed => {
                Ok(ResearchVerdict::Completed)
            }
            Ok(Ok(outcome)) => {
                warn!(
                    slug = %topic.slug,
                    provider = %factory.name(),
                    raw_chars = outcome.raw_chars,
                    "Research came back short"
                );
                Ok(ResearchVerdict::Short(outcome))
            }
            Ok(Err(e)) if is_fatal(&e) => {
                error!(slug = %topic.slug, provider = %factory.name(), error = %e, "Research cannot run");
                self.fail(topic, Stage::Research, e.to_string()).await?;
                Err(e.into())
            }
            Ok(Err(e)) => {
                warn!(slug = %topic.slug, provider = %factory.name(), error = %e, "Research attempt failed");
                Ok(ResearchVerdict::Failed(e.to_string()))
            }
            Err(_) => {
                let err = PipelineError::Deadline {
                    stage: format!("{} research", factory.name()),
                    limit: deadline,
                };
                warn!(slug = %topic.slug, provider = %factory.name(), "Research stage deadline reached");
                self.research.record_interrupted(&topic.slug, &err.to_string())?;
                Ok(ResearchVerdict::Failed(err.to_string()))
            }
        }
    }

    /// The report record: existing unless `force`, else extracted. The inner
    /// `Err` is a reason to send the topic to review.
    async fn report_for(
        &self,
        topic: &Topic,
        force: bool,
    ) -> Result<std::result::Result<Report, String>> {
        let store = self.research.store();
        if !force {
            match store.read_report(&topic.slug)? {
                Some(Ok(report)) => {
                    info!(slug = %topic.slug, "Using existing report record");
                    return Ok(Ok(report));
                }
                Some(Err(e)) => {
                    warn!(slug = %topic.slug, error = %e, "Existing report record is invalid, extracting again");
                }
                None => {}
            }
        }

        let driver = self
            .extraction
            .as_ref()
            .ok_or_else(|| Capability::Extraction.missing())?;
        let request = ExtractionRequest {
            slug: topic.slug.clone(),
            category: Some(topic.category.clone()),
            publish_date: self.today(),
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            let result =
                tokio::time::timeout(self.deadlines.extraction, driver.extract(&request)).await;
            let (reason, retryable) = match result {
                Ok(Ok(report)) => return Ok(Ok(report)),
                Ok(Err(ExtractionError::Config(reason))) => {
                    return Err(PipelineError::Config(reason))
                }
                Ok(Err(e)) => {
                    let retryable = matches!(e, ExtractionError::Provider(_));
                    (e.to_string(), retryable)
                }
                Err(_) => (
                    PipelineError::Deadline {
                        stage: "extraction".into(),
                        limit: self.deadlines.extraction,
                    }
                    .to_string(),
                    true,
                ),
            };

            if retryable && attempt <= self.extraction_retries {
                warn!(slug = %topic.slug, attempt, error = %reason, "Extraction failed, retrying");
                continue;
            }
            error!(slug = %topic.slug, attempt, error = %reason, "Extraction failed");
            return Ok(Err(reason));
        }
    }

    /// processing → researching, carrying the session url. No-op past that.
    fn advance_to_researching(&self, topic: &Topic) -> Result<Topic> {
        let current = self
            .queue
            .get(&topic.slug)?
            .unwrap_or_else(|| topic.clone());
        if current.status != TopicStatus::Processing {
            return Ok(current);
        }
        let session_url = self
            .research
            .store()
            .read_job(&topic.slug)?
            .and_then(|job| job.session_url);
        self.set_status(
            &topic.slug,
            TopicStatus::Researching,
            StatusExtras::default().with_session_url(session_url),
        )
    }

    fn set_status(&self, slug: &str, status: TopicStatus, extras: StatusExtras) -> Result<Topic> {
        Ok(self.queue.set_status(slug, status, extras)?)
    }

    async fn needs_review(&self, topic: &Topic, stage: Stage, reason: String) -> Result<RunOutcome> {
        let current = self.queue.get(&topic.slug)?.map_or(topic.status, |t| t.status);
        if current == TopicStatus::Researching {
            self.set_status(&topic.slug, TopicStatus::NeedsReview, StatusExtras::error(&reason))?;
        } else {
            warn!(slug = %topic.slug, status = %current, "Topic not in research, status left as is");
        }
        self.notify(topic, stage, Outcome::NeedsReview, &reason).await;
        Ok(RunOutcome::NeedsReview {
            slug: topic.slug.clone(),
            stage,
            reason,
        })
    }

    async fn fail(&self, topic: &Topic, stage: Stage, reason: String) -> Result<RunOutcome> {
        let current = self.queue.get(&topic.slug)?.map_or(topic.status, |t| t.status);
        if !current.is_terminal() {
            self.set_status(&topic.slug, TopicStatus::Failed, StatusExtras::error(&reason))?;
        }
        self.notify(topic, stage, Outcome::Failed, &reason).await;
        Ok(RunOutcome::Failed {
            slug: topic.slug.clone(),
            stage,
            reason,
        })
    }

    async fn notify(&self, topic: &Topic, stage: Stage, outcome: Outcome, reason: &str) {
        let notification = Notification::new(&topic.name, &topic.slug, stage, outcome, reason);
        self.notifier.notify(&notification).await;
    }
}

fn is_fatal(err: &ResearchError) -> bool {
    matches!(
        err,
        ResearchError::Config(_) | ResearchError::Template(_) | ResearchError::Io(_) | ResearchError::Json(_)
    )
}
