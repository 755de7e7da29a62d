//! Fact-Check Report Library
//!
//! The typed record a fact-check report is made of, the renderer that turns it
//! into a branded, self-contained HTML page, and the validator that decides
//! whether the page may be published.
//!
//! # Design
//!
//! - The record carries data only. No styles, no markup, no colours.
//! - The renderer owns every visual decision and is a pure function.
//! - The validator is the gate: errors block publishing, warnings do not.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use report::{render, HttpLinkProbe, Report, Validator};
//!
//! let report = Report::from_json(&std::fs::read_to_string("flat-earth-20260215.json")?)?;
//! let html = render(&report);
//! let outcome = Validator::new(Arc::new(HttpLinkProbe::default()))
//!     .validate(&report, Some(&html))
//!     .await;
//! assert!(outcome.is_publishable());
//! ```
//!
//! # Modules
//!
//! - [`types`] - Report record types
//! - [`schema`] - Invariants serde cannot express
//! - [`render`] - Record to HTML
//! - [`validate`] - Pre-publish rules and link probing
//! - [`testing`] - Fixtures shared by every crate in the workspace

pub mod error;
pub mod render;
pub mod schema;
pub mod testing;
pub mod types;
pub mod validate;

pub use error::{ReportError, Result, SchemaViolation};
pub use render::{excerpt, read_time_minutes, render};
pub use types::{
    chart::{ChartDescriptor, ChartType, Dataset},
    claim::Claim,
    report::{
        ExecutiveSummary, FloatPosition, QuoteBox, Report, Section, TagColor, TimelineEvent,
    },
    source::{Source, SourceType, TrustTier},
    verdict::Verdict,
};
pub use validate::{
    validate_offline, Category, Finding, HttpLinkProbe, LinkProbe, LinkStatus, Severity,
    StaticLinkProbe, ValidationReport, Validator,
};
