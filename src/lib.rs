#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Publishing Core
//!
//! Versioned, multi-language publishing workflow engine.
//!
//! ## Overview
//!
//! Content entities (services, channels, organizations, general descriptions and
//! service collections) live as a chain of versions under a stable root id. Each
//! version carries a publishing state per language, and every language moves
//! through draft, scheduled, published and archived states on its own.
//!
//! ## Architecture
//!
//! - **Language state machine**: per-language transitions with guards and
//!   post-commit actions, applied inside one unit of work per request.
//! - **Publishing gate**: a checker per entity type validates content before any
//!   publish. Callers get a fail-closed boolean; the service sees a three-way
//!   outcome.
//! - **Scheduler**: cron jobs with retry budgets and pause/resume. The built-in
//!   timed publishing job re-runs the gate at fire time and records content
//!   failures per entity without hurting the job's own health.
//! - **History**: append-only operation records mapped into a newest-first audit
//!   trail, plus a separate connection stream.
//!
//! ## Module Organization
//!
//! - [`models`] - Entities, versions, language availability and history records
//! - [`state_machine`] - Per-language transitions
//! - [`publishing`] - Checkers, the publishing manager and the write service
//! - [`scheduler`] - Cron engine and the timed publishing job
//! - [`history`] - Audit trail mapping and paged queries
//! - [`store`] - Unit of work boundary and the in-memory store
//! - [`config`] - YAML configuration with environment overrides
//! - [`events`] - Lifecycle event broadcast
//! - [`logging`] - Structured console and JSON file logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use publishing_core::config::ConfigManager;
//! use publishing_core::publishing::PublishingService;
//! use publishing_core::scheduler::{SchedulerEngine, TimedPublishingJob};
//! use publishing_core::store::InMemoryStore;
//! use publishing_core::constants::TIMED_PUBLISHING_JOB;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! publishing_core::logging::init_structured_logging();
//! let manager = ConfigManager::load()?;
//! let config = manager.config();
//!
//! let store = Arc::new(InMemoryStore::new());
//! let service = Arc::new(PublishingService::from_config(store, config));
//!
//! let engine = SchedulerEngine::from_config(&config.scheduler);
//! engine.register_configured(
//!     &config.scheduler,
//!     TIMED_PUBLISHING_JOB,
//!     Arc::new(TimedPublishingJob::new(service)),
//! )?;
//! engine.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod history;
pub mod logging;
pub mod models;
pub mod publishing;
pub mod scheduler;
pub mod state_machine;
pub mod store;

pub use config::{ConfigManager, PublishingConfig};
pub use error::{PublishingError, Result};
pub use events::{EventPublisher, LifecycleEvent};
pub use history::HistoryService;
pub use publishing::{PublishingManager, PublishingService};
pub use scheduler::SchedulerEngine;
pub use store::{InMemoryStore, UnitOfWork, UnitOfWorkFactory};
