//! Deep research and structured extraction.
//!
//! Turns a topic into raw research text (through a deep-research provider
//! session) and raw research text into a checked [`report::Report`] (through a
//! free-form-to-JSON model).
//!
//! # Artifacts
//!
//! Every stage writes to an [`ArtifactStore`] directory so a crashed run can
//! resume at the first missing artifact:
//!
//! - `<slug>.raw` - research text
//! - `<slug>-sources.json` - external links the provider cited
//! - `<slug>-job.json` - job record with every attempt
//! - `<slug>.json` - the extracted report record
//!
//! # Usage
//!
//! ```rust,ignore
//! use research::{ArtifactStore, OpenAIDeepResearch, ResearchDriver, ResearchRequest, TemplateLibrary};
//!
//! let driver = ResearchDriver::new(ArtifactStore::new("output"), TemplateLibrary::builtin());
//! let provider = OpenAIDeepResearch::new(std::env::var("OPENAI_API_KEY")?);
//! let outcome = driver.run(&provider, &request).await?;
//! ```

pub mod ai;
pub mod artifacts;
pub mod driver;
pub mod error;
pub mod extract;
pub mod security;
pub mod session;
pub mod templates;
pub mod testing;

pub use ai::{OpenAIChat, AI};
pub use artifacts::{ArtifactStore, Attempt, AttemptOutcome, JobRecord, JobStatus, MIN_COMPLETE_CHARS};
pub use driver::{PollSettings, ResearchDriver, ResearchOutcome, ResearchRequest};
pub use error::{
    ExtractionError, ExtractionResult, ResearchError, Result, SessionError, SessionResult,
};
pub use extract::{parse_report, ExtractionDriver, ExtractionRequest};
pub use security::{ApiCredentials, SecretString};
pub use session::{
    Link, OpenAIDeepResearch, PerplexityDeepResearch, Provider, Session, SessionFactory,
};
pub use templates::{PromptTemplate, TemplateLibrary, DEFAULT_TEMPLATE_ID};
