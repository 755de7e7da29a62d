//! Research driver: one topic, one provider, artifacts on disk.
//!
//! The poll-wait watches for the provider's "still researching" indicator and
//! treats its absence (for `settle_polls` consecutive polls) as done, rather
//! than waiting for a positive completion signal.

use std::sync::LazyLock;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use regex::Regex;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::artifacts::{ArtifactStore, AttemptOutcome, JobRecord, JobStatus};
use crate::error::{ResearchError, Result, SessionError};
use crate::session::{Link, Session, SessionFactory};
use crate::templates::TemplateLibrary;

pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const PROGRESS_LOG_INTERVAL: Duration = Duration::from_secs(60);
pub const MAX_SESSION_RETRIES: u32 = 3;

static VERDICT_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)verdict\s*[:*]+\s*\**\s*(TRUE|FALSE|MIXED|UNVERIFIED)\b")
        .expect("verdict pattern is valid")
});

/// Poll-wait tuning.
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub interval: Duration,
    /// Consecutive polls without the researching indicator before done.
    pub settle_polls: u32,
    pub log_every: Duration,
    /// Fresh-session retries after a transient failure.
    pub max_session_retries: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: MIN_POLL_INTERVAL,
            settle_polls: 1,
            log_every: PROGRESS_LOG_INTERVAL,
            max_session_retries: MAX_SESSION_RETRIES,
        }
    }
}

/// What to research.
#[derive(Debug, Clone)]
pub struct ResearchRequest {
    pub slug: String,
    pub topic: String,
    pub template_id: String,
    pub headless: bool,
    pub today: NaiveDate,
}

/// Summary of a finished research run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchOutcome {
    pub status: JobStatus,
    pub raw_chars: usize,
    pub sources: usize,
    pub verdict_hint: Option<String>,
}

struct Harvest {
    text: String,
    links: Vec<Link>,
    session_url: Option<String>,
}

enum SessionFailure {
    Session(SessionError),
    Deadline { partial: Option<String>, session_url: Option<String> },
}

pub struct ResearchDriver {
    store: ArtifactStore,
    templates: TemplateLibrary,
    settings: PollSettings,
}

impl ResearchDriver {
    pub fn new(store: ArtifactStore, templates: TemplateLibrary) -> Self {
        Self {
            store,
            templates,
            settings: PollSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: PollSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Run deep research for one topic against one provider.
    ///
    /// Writes `<slug>.raw`, `<slug>-sources.json` and `<slug>-job.json`. The
    /// job record keeps every attempt, so a fallback run appends to the
    /// primary's history.
    pub async fn run(
        &self,
        factory: &dyn SessionFactory,
        request: &ResearchRequest,
    ) -> Result<ResearchOutcome> {
        let prompt = self
            .templates
            .load(&request.template_id)?
            .render(&request.topic, request.today);

        let mut job = match self.store.read_job(&request.slug)? {
            Some(existing) => existing,
            None => JobRecord::new(
                &request.slug,
                &request.topic,
                &request.template_id,
                factory.provider(),
            ),
        };
        job.template_id = request.template_id.clone();
        job.begin_attempt(factory.provider(), factory.name());
        self.store.write_job(&job)?;

        info!(
            slug = %request.slug,
            provider = %factory.name(),
            role = %factory.provider(),
            cap_mins = factory.hard_cap().as_secs() / 60,
            "Starting deep research"
        );

        let mut retries = 0;
        let harvest = loop {
            match self.research_once(factory, request, &prompt).await {
                Ok(harvest) => break harvest,
                Err(SessionFailure::Session(e)) if e.is_transient() && retries < self.settings.max_session_retries => {
                    retries += 1;
                    warn!(
                        slug = %request.slug,
                        provider = %factory.name(),
                        retry = retries,
                        error = %e,
                        "Transient session failure, retrying with a fresh session"
                    );
                }
                Err(SessionFailure::Session(e)) => {
                    error!(slug = %request.slug, provider = %factory.name(), error = %e, "Research session failed");
                    job.finish_attempt(AttemptOutcome::Failed, Some(e.to_string()));
                    self.store.write_job(&job)?;
                    return Err(e.into());
                }
                Err(SessionFailure::Deadline { partial, session_url }) => {
                    let err = ResearchError::DeadlineExceeded {
                        provider: factory.name().to_string(),
                        limit: factory.hard_cap(),
                    };
                    warn!(slug = %request.slug, provider = %factory.name(), "Research hit its hard cap");
                    // Keep partial text for diagnosis; downstream refuses it by status.
                    if let Some(text) = partial.filter(|t| !t.trim().is_empty()) {
                        self.store.write_raw(&request.slug, &text)?;
                        job.raw_chars = text.chars().count();
                    }
                    if session_url.is_some() {
                        job.session_url = session_url;
                    }
                    job.finish_attempt(AttemptOutcome::TimedOut, Some(err.to_string()));
                    self.store.write_job(&job)?;
                    return Err(err);
                }
            }
        };

        let sources = external_links(&harvest.links, factory.home_domain());
        let raw_chars = harvest.text.chars().count();
        let status = JobStatus::for_raw_chars(raw_chars);
        let verdict_hint = verdict_hint(&harvest.text);

        self.store.write_raw(&request.slug, &harvest.text)?;
        self.store.write_sources(&request.slug, &sources)?;

        job.session_url = harvest.session_url;
        job.harvested_at = Some(Utc::now());
        job.raw_chars = raw_chars;
        job.verdict_hint = verdict_hint.clone();
        match status {
            JobStatus::Completed => job.finish_attempt(AttemptOutcome::Completed, None),
            _ => job.finish_attempt(
                AttemptOutcome::NeedsReview,
                Some(format!("research returned only {} characters", raw_chars)),
            ),
        }
        self.store.write_job(&job)?;

        info!(
            slug = %request.slug,
            provider = %factory.name(),
            raw_chars,
            sources = sources.len(),
            status = status.as_str(),
            verdict_hint = ?verdict_hint,
            "Research harvested"
        );

        Ok(ResearchOutcome {
            status,
            raw_chars,
            sources: sources.len(),
            verdict_hint,
        })
    }

    /// Close the open attempt of a run that was cancelled from outside.
    pub fn record_interrupted(&self, slug: &str, reason: &str) -> Result<()> {
        if let Some(mut job) = self.store.read_job(slug)? {
            job.finish_attempt(AttemptOutcome::TimedOut, Some(reason.to_string()));
            self.store.write_job(&job)?;
        }
        Ok(())
    }

    async fn research_once(
        &self,
        factory: &dyn SessionFactory,
        request: &ResearchRequest,
        prompt: &str,
    ) -> std::result::Result<Harvest, SessionFailure> {
        let mut session = factory
            .open(request.headless)
            .await
            .map_err(SessionFailure::Session)?;
        let result = self.drive(session.as_mut(), factory, request, prompt).await;
        session.close().await;
        result
    }

    async fn drive(
        &self,
        session: &mut dyn Session,
        factory: &dyn SessionFactory,
        request: &ResearchRequest,
        prompt: &str,
    ) -> std::result::Result<Harvest, SessionFailure> {
        session
            .ensure_authenticated()
            .await
            .map_err(SessionFailure::Session)?;
        session
            .enable_deep_research()
            .await
            .map_err(SessionFailure::Session)?;
        session
            .submit_prompt(prompt)
            .await
            .map_err(SessionFailure::Session)?;
        if session.confirm_plan().await.map_err(SessionFailure::Session)? {
            info!(slug = %request.slug, "Accepted research plan");
        }

        self.wait_until_done(session, factory, request).await?;

        let text = match session.copy_response().await.map_err(SessionFailure::Session)? {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                warn!(slug = %request.slug, "Copy path empty, reading last turn instead");
                session
                    .last_turn_text()
                    .await
                    .map_err(SessionFailure::Session)?
            }
        };
        let links = session.links().await.map_err(SessionFailure::Session)?;

        Ok(Harvest {
            text,
            links,
            session_url: session.session_url(),
        })
    }

    async fn wait_until_done(
        &self,
        session: &mut dyn Session,
        factory: &dyn SessionFactory,
        request: &ResearchRequest,
    ) -> std::result::Result<(), SessionFailure> {
        let started = Instant::now();
        let cap = factory.hard_cap();
        let interval = self.settings.interval;
        let mut last_log = started;
        let mut clear_polls = 0;

        loop {
            let elapsed = started.elapsed();
            if elapsed >= cap {
                let partial = session.last_turn_text().await.ok();
                return Err(SessionFailure::Deadline {
                    partial,
                    session_url: session.session_url(),
                });
            }
            tokio::time::sleep(interval.min(cap - elapsed)).await;

            if session.is_researching().await.map_err(SessionFailure::Session)? {
                clear_polls = 0;
            } else {
                clear_polls += 1;
                if clear_polls >= self.settings.settle_polls.max(1) {
                    info!(
                        slug = %request.slug,
                        provider = %factory.name(),
                        elapsed_secs = started.elapsed().as_secs(),
                        "Research finished"
                    );
                    return Ok(());
                }
            }

            if last_log.elapsed() >= self.settings.log_every {
                info!(
                    slug = %request.slug,
                    provider = %factory.name(),
                    elapsed_secs = started.elapsed().as_secs(),
                    cap_secs = cap.as_secs(),
                    "Still researching"
                );
                last_log = Instant::now();
            }
        }
    }
}

/// `Verdict: X` line in research text, upper-cased.
pub fn verdict_hint(text: &str) -> Option<String> {
    VERDICT_HINT
        .captures(text)
        .map(|caps| caps[1].to_ascii_uppercase())
}

/// http(s) links outside the provider's own domain, first occurrence kept.
pub fn external_links(links: &[Link], home_domain: &str) -> Vec<Link> {
    let home = home_domain.to_ascii_lowercase();
    let mut seen = std::collections::HashSet::new();
    links
        .iter()
        .filter(|link| match report::schema::url_host(&link.url) {
            Some(host) => host != home && !host.ends_with(&format!(".{}", home)),
            None => false,
        })
        .filter(|link| seen.insert(link.url.clone()))
        .cloned()
        .collect()
}
