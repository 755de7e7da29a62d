//! Mock providers for tests.
//!
//! - [`MockSessionFactory`] hands out scripted [`Session`]s and records what
//!   happened to them.
//! - [`MockAI`] returns canned extractor responses.
//! - [`research_text`] builds plausible research text of a given length.

use std::collections::VecDeque;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use crate::ai::AI;
use crate::error::{ExtractionError, ExtractionResult, SessionError, SessionResult};
use crate::session::{Link, Provider, Session, SessionFactory, FALLBACK_HARD_CAP, PRIMARY_HARD_CAP};

/// How one mock session behaves.
#[derive(Debug, Clone)]
pub struct SessionScript {
    pub authenticated: bool,
    /// Polls that report "still researching" before the indicator clears.
    /// `None` means it never clears.
    pub researching_polls: Option<usize>,
    pub asks_for_plan: bool,
    /// Text from the copy path. `None` forces the last-turn fallback.
    pub copied: Option<String>,
    pub last_turn: String,
    pub links: Vec<Link>,
    /// Fail `submit_prompt` with this error.
    pub submit_error: Option<MockFailure>,
}

/// Session errors a script can inject (`SessionError` is not `Clone`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    ElementNotFound,
    NotAuthenticated,
    Provider,
}

impl MockFailure {
    fn to_error(self) -> SessionError {
        match self {
            MockFailure::ElementNotFound => SessionError::ElementNotFound("prompt input".into()),
            MockFailure::NotAuthenticated => SessionError::NotAuthenticated {
                provider: "mock".into(),
            },
            MockFailure::Provider => SessionError::Provider("research job failed".into()),
        }
    }
}

impl SessionScript {
    /// Finishes after `polls` researching polls with `text`.
    pub fn completes_with(text: impl Into<String>, polls: usize) -> Self {
        let text = text.into();
        Self {
            authenticated: true,
            researching_polls: Some(polls),
            asks_for_plan: false,
            copied: Some(text.clone()),
            last_turn: text,
            links: Vec::new(),
            submit_error: None,
        }
    }

    /// Never clears the researching indicator.
    pub fn never_finishes() -> Self {
        Self {
            researching_polls: None,
            last_turn: "Partial findings so far.".to_string(),
            copied: None,
            ..Self::completes_with("", 0)
        }
    }

    pub fn unauthenticated() -> Self {
        Self {
            authenticated: false,
            ..Self::completes_with("", 0)
        }
    }

    pub fn failing_submit(failure: MockFailure) -> Self {
        Self {
            submit_error: Some(failure),
            ..Self::completes_with("", 0)
        }
    }

    pub fn with_links(mut self, links: Vec<Link>) -> Self {
        self.links = links;
        self
    }

    pub fn with_plan_confirmation(mut self) -> Self {
        self.asks_for_plan = true;
        self
    }

    pub fn without_copy_path(mut self) -> Self {
        self.copied = None;
        self
    }
}

/// Record of what the mock sessions saw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionLog {
    pub opened: usize,
    pub closed: usize,
    pub prompts: Vec<String>,
    pub polls: usize,
    pub plans_confirmed: usize,
}

/// Scripted sessions. Each `open` takes the next script; the last script
/// repeats once the queue runs dry.
#[derive(Clone)]
pub struct MockSessionFactory {
    name: String,
    provider: Provider,
    home_domain: String,
    hard_cap: Duration,
    scripts: Arc<RwLock<VecDeque<SessionScript>>>,
    last: Arc<RwLock<Option<SessionScript>>>,
    log: Arc<RwLock<SessionLog>>,
}

impl MockSessionFactory {
    pub fn new(provider: Provider) -> Self {
        let (name, home, cap) = match provider {
            Provider::Primary => ("mock-primary", "primary.example", PRIMARY_HARD_CAP),
            Provider::Fallback => ("mock-fallback", "fallback.example", FALLBACK_HARD_CAP),
        };
        Self {
            name: name.to_string(),
            provider,
            home_domain: home.to_string(),
            hard_cap: cap,
            scripts: Arc::new(RwLock::new(VecDeque::new())),
            last: Arc::new(RwLock::new(None)),
            log: Arc::new(RwLock::new(SessionLog::default())),
        }
    }

    pub fn with_script(self, script: SessionScript) -> Self {
        self.scripts.write().unwrap().push_back(script);
        self
    }

    pub fn with_hard_cap(mut self, hard_cap: Duration) -> Self {
        self.hard_cap = hard_cap;
        self
    }

    pub fn with_home_domain(mut self, domain: impl Into<String>) -> Self {
        self.home_domain = domain.into();
        self
    }

    pub fn log(&self) -> SessionLog {
        self.log.read().unwrap().clone()
    }

    fn next_script(&self) -> SessionScript {
        let next = self.scripts.write().unwrap().pop_front();
        let mut last = self.last.write().unwrap();
        match next {
            Some(script) => {
                *last = Some(script.clone());
                script
            }
            None => last
                .clone()
                .unwrap_or_else(|| SessionScript::completes_with(research_text(2500), 0)),
        }
    }
}

#[async_trait]
impl SessionFactory for MockSessionFactory {
    fn name(&self) -> &str {
        &self.name
    }

    fn provider(&self) -> Provider {
        self.provider
    }

    fn home_domain(&self) -> &str {
        &self.home_domain
    }

    fn hard_cap(&self) -> Duration {
        self.hard_cap
    }

    async fn open(&self, _headless: bool) -> SessionResult<Box<dyn Session>> {
        self.log.write().unwrap().opened += 1;
        Ok(Box::new(MockSession {
            script: self.next_script(),
            log: self.log.clone(),
            polls: 0,
            submitted: false,
        }))
    }
}

pub struct MockSession {
    script: SessionScript,
    log: Arc<RwLock<SessionLog>>,
    polls: usize,
    submitted: bool,
}

#[async_trait]
impl Session for MockSession {
    async fn ensure_authenticated(&mut self) -> SessionResult<()> {
        if self.script.authenticated {
            Ok(())
        } else {
            Err(SessionError::NotAuthenticated {
                provider: "mock".into(),
            })
        }
    }

    async fn enable_deep_research(&mut self) -> SessionResult<()> {
        Ok(())
    }

    async fn submit_prompt(&mut self, prompt: &str) -> SessionResult<()> {
        if let Some(failure) = self.script.submit_error {
            return Err(failure.to_error());
        }
        self.log.write().unwrap().prompts.push(prompt.to_string());
        self.submitted = true;
        Ok(())
    }

    async fn confirm_plan(&mut self) -> SessionResult<bool> {
        if self.script.asks_for_plan {
            self.log.write().unwrap().plans_confirmed += 1;
        }
        Ok(self.script.asks_for_plan)
    }

    async fn is_researching(&mut self) -> SessionResult<bool> {
        if !self.submitted {
            return Err(SessionError::ElementNotFound("nothing submitted".into()));
        }
        self.polls += 1;
        self.log.write().unwrap().polls += 1;
        Ok(match self.script.researching_polls {
            Some(n) => self.polls <= n,
            None => true,
        })
    }

    async fn copy_response(&mut self) -> SessionResult<Option<String>> {
        Ok(self.script.copied.clone())
    }

    async fn last_turn_text(&mut self) -> SessionResult<String> {
        Ok(self.script.last_turn.clone())
    }

    async fn links(&mut self) -> SessionResult<Vec<Link>> {
        Ok(self.script.links.clone())
    }

    fn session_url(&self) -> Option<String> {
        Some("https://research.example/session/mock".to_string())
    }

    async fn close(&mut self) {
        self.log.write().unwrap().closed += 1;
    }
}

/// Canned extraction provider.
#[derive(Clone, Default)]
pub struct MockAI {
    responses: Arc<RwLock<VecDeque<String>>>,
    fail_with: Option<String>,
    prompts: Arc<RwLock<Vec<String>>>,
}

impl MockAI {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response. The last response repeats.
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.responses.write().unwrap().push_back(response.into());
        self
    }

    /// Respond with the JSON of `report`.
    pub fn with_report(self, report: &report::Report) -> Self {
        let json = serde_json::to_string_pretty(report).unwrap();
        self.with_response(format!("Here is the record:\n{}", json))
    }

    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.fail_with = Some(reason.into());
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.read().unwrap().clone()
    }
}

#[async_trait]
impl AI for MockAI {
    async fn complete(&self, prompt: &str) -> ExtractionResult<String> {
        self.prompts.write().unwrap().push(prompt.to_string());
        if let Some(reason) = &self.fail_with {
            return Err(ExtractionError::Provider(reason.clone()));
        }
        let mut responses = self.responses.write().unwrap();
        let response = if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().cloned()
        };
        response.ok_or_else(|| ExtractionError::Provider("no mock response configured".into()))
    }

    fn model(&self) -> &str {
        "mock"
    }
}

/// Research-looking text of exactly `chars` characters with a verdict line.
pub fn research_text(chars: usize) -> String {
    let mut text = String::from("## Assessment\nVerdict: FALSE\n\n");
    let filler = "Independent measurements consistently contradict the claim. ";
    while text.chars().count() < chars {
        text.push_str(filler);
    }
    text.chars().take(chars).collect()
}

/// Links as a research provider would return them: five external sources and
/// one provider-internal link.
pub fn research_links(home_domain: &str) -> Vec<Link> {
    vec![
        Link::new("https://skepticalinquirer.org/2025/09/the-flat-earth-revival/", "Skeptical Inquirer"),
        Link::new("https://www.scientificamerican.com/article/why-the-earth-is-round/", "Scientific American"),
        Link::new("https://earthobservatory.nasa.gov/images/blue-marble", "NASA Earth Observatory"),
        Link::new("https://bbc.com/news/science-environment-flat-earth", "BBC News"),
        Link::new("https://www.cdc.gov/misinformation/index.html", "CDC"),
        Link::new(format!("https://{}/share/abc", home_domain), "Shared conversation"),
    ]
}
