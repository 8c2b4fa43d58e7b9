#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Command-line runner.
pub mod app;
/// Run configuration types.
pub mod config;
/// Centralized constants used across selection, mail, and stores.
pub mod constants;
/// Recipe, selection, and grocery list types.
pub mod data;
/// Outbound mail sinks and message composition.
pub mod mail;
/// End-to-end run pipeline.
pub mod pipeline;
/// HTML report rendering.
pub mod report;
/// Uniform sampling of record positions.
pub mod sampler;
/// Credential storage.
pub mod secrets;
/// Record selection and grocery aggregation.
pub mod selector;
/// Recipe store traits and adapters.
pub mod store;
/// Shared type aliases.
pub mod types;

mod errors;

pub use config::{Delivery, MenuConfig};
pub use data::{GroceryList, Recipe, RecipeId, Selection};
pub use errors::MenuError;
pub use mail::{DryRunSink, MailMessage, MailSink, OutboxSink, SendmailSink};
pub use pipeline::{MenuReport, compose_menu, run_weekly_menu};
pub use sampler::{SampleIndexSet, sample_indices, sample_indices_with_rng};
pub use secrets::{FileSecretStore, SecretProvider};
pub use selector::{Menu, select_recipes};
pub use store::{InMemoryStore, JsonDirStore, JsonLinesStore, RecipeStore, RecordCursor, RecordFilter};
