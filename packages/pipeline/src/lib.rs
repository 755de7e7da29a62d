// Fact-check publishing pipeline - core
//
// Topic queue, orchestrator, publishing and notifications. The `pipeline`
// binary wires these to real providers; tests wire them to mocks.

pub mod config;
pub mod error;
pub mod lockfile;
pub mod notify;
pub mod orchestrator;
pub mod publish;
pub mod queue;

pub use config::{Capability, Config, Credentials};
pub use error::{PipelineError, QueueError, QueueResult, Result};
pub use lockfile::LockFile;
pub use notify::{
    FanoutNotifier, LogNotifier, Notification, Notifier, Outcome, RecordingNotifier, Stage,
    WebhookNotifier,
};
pub use orchestrator::{Deadlines, Orchestrator, RunOptions, RunOutcome};
pub use publish::{PublishOutcome, Publisher, SiteIndex};
pub use queue::{NewTopic, Priority, StatusExtras, Topic, TopicFilter, TopicQueue, TopicStatus};
