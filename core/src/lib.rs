//! Tag migration engine for Datadog dashboards, monitors and synthetic tests.
//!
//! A run loads an old→new [`TagMapping`], walks every selected resource of
//! each [`Family`], rewrites whole tag tokens in place, and either reports
//! the resources that would change or writes them back through the API.
//!
//! - [`substitute`]: whole-token string and list substitution
//! - [`query`]: classification of `requests` entries into [`QueryNode`]s
//! - [`walker`]: per-family traversal
//! - [`controller`]: report/commit orchestration over a [`ResourceApi`]

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod api;
pub mod config;
pub mod controller;
pub mod errors;
pub mod family;
pub mod mapping;
pub mod query;
pub mod substitute;
pub mod walker;

pub use api::{Credentials, DatadogClient, ResourceApi};
pub use config::{RunConfig, RunMode, Selection};
pub use controller::{
    ChangeRecord, ChangeSink, CommitSink, FamilyReport, Outcome, ReportSink, RunController,
    RunReport,
};
pub use errors::{ErrorCategory, Result, RetagError};
pub use family::{Family, ResourceRef};
pub use mapping::TagMapping;
pub use query::QueryNode;
pub use substitute::{Substitution, TagPayload, substitute};
pub use walker::ResourceWalker;

/// retag version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
