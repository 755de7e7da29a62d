//! Orchestrator wired to mocks in a temporary workspace.

use std::path::PathBuf;
use std::sync::Arc;

use pipeline_core::notify::RecordingNotifier;
use pipeline_core::orchestrator::Orchestrator;
use pipeline_core::publish::{Publisher, RecordingVcs, SiteIndex};
use pipeline_core::queue::{NewTopic, Topic, TopicQueue};
use report::testing::sample_report;
use report::{Report, StaticLinkProbe, Validator};
use research::testing::{MockAI, MockSessionFactory, SessionScript};
use research::{ArtifactStore, ExtractionDriver, Provider, ResearchDriver, TemplateLibrary};
use tempfile::TempDir;

use super::fixtures::{good_research, today, CATEGORY, SAMPLE_SLUG, TOPIC_NAME};

pub struct TestHarness {
    pub dir: TempDir,
    pub primary: MockSessionFactory,
    pub fallback: MockSessionFactory,
    pub ai: MockAI,
    pub probe: StaticLinkProbe,
    pub notifier: RecordingNotifier,
    pub vcs: RecordingVcs,
    pub extraction: bool,
}

impl TestHarness {
    /// Both providers research successfully; the extractor returns the
    /// happy-path report.
    pub fn new() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        Self {
            dir: TempDir::new().unwrap(),
            primary: MockSessionFactory::new(Provider::Primary)
                .with_script(good_research("primary.example")),
            fallback: MockSessionFactory::new(Provider::Fallback)
                .with_script(good_research("fallback.example")),
            ai: MockAI::new().with_report(&sample_report()),
            probe: StaticLinkProbe::new(),
            notifier: RecordingNotifier::new(),
            vcs: RecordingVcs::new(),
            extraction: true,
        }
    }

    pub fn with_primary(mut self, script: SessionScript) -> Self {
        self.primary = MockSessionFactory::new(Provider::Primary).with_script(script);
        self
    }

    pub fn with_fallback(mut self, script: SessionScript) -> Self {
        self.fallback = MockSessionFactory::new(Provider::Fallback).with_script(script);
        self
    }

    pub fn with_ai(mut self, ai: MockAI) -> Self {
        self.ai = ai;
        self
    }

    pub fn with_extracted(self, report: &Report) -> Self {
        self.with_ai(MockAI::new().with_report(report))
    }

    pub fn with_probe(mut self, probe: StaticLinkProbe) -> Self {
        self.probe = probe;
        self
    }

    pub fn without_extraction(mut self) -> Self {
        self.extraction = false;
        self
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn queue(&self) -> TopicQueue {
        TopicQueue::new(self.path("data/queue.json"))
    }

    pub fn store(&self) -> ArtifactStore {
        ArtifactStore::new(self.path("output"))
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.path("site/reports")
    }

    pub fn index_path(&self) -> PathBuf {
        self.path("site/reports/index.json")
    }

    pub fn run_lock_path(&self) -> PathBuf {
        self.path("data/pipeline.lock")
    }

    pub fn site_index(&self) -> SiteIndex {
        SiteIndex::load(&self.index_path()).unwrap()
    }

    /// Queue the flat-earth topic.
    pub fn seed_topic(&self) -> Topic {
        self.queue()
            .add(NewTopic::new(TOPIC_NAME, CATEGORY).with_slug(SAMPLE_SLUG))
            .unwrap()
    }

    pub fn topic(&self, slug: &str) -> Topic {
        self.queue().get(slug).unwrap().unwrap()
    }

    pub fn orchestrator(&self) -> Orchestrator {
        let store = self.store();
        let research = ResearchDriver::new(store.clone(), TemplateLibrary::builtin());
        let publisher = Publisher::new(self.reports_dir(), self.index_path())
            .with_vcs(Arc::new(self.vcs.clone()));
        let validator = Validator::new(Arc::new(self.probe.clone()));

        let mut orchestrator = Orchestrator::new(self.queue(), research, validator, publisher)
            .with_primary(Arc::new(self.primary.clone()))
            .with_fallback(Arc::new(self.fallback.clone()))
            .with_notifier(Arc::new(self.notifier.clone()))
            .with_run_lock(self.run_lock_path())
            .with_today(today());
        if self.extraction {
            orchestrator =
                orchestrator.with_extraction(ExtractionDriver::new(Arc::new(self.ai.clone()), store));
        }
        orchestrator
    }
}
