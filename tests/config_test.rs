//! The shipped configuration file loads in every environment and wires the engine.

use publishing_core::config::ConfigManager;
use publishing_core::constants::TIMED_PUBLISHING_JOB;
use publishing_core::history::HistoryService;
use publishing_core::publishing::PublishingService;
use publishing_core::scheduler::{SchedulerEngine, TimedPublishingJob};
use publishing_core::store::InMemoryStore;
use std::path::PathBuf;
use std::sync::Arc;

fn config_dir() -> Option<PathBuf> {
    Some(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config"))
}

#[test]
fn test_shipped_config_loads_per_environment() {
    let development = ConfigManager::load_from_directory_with_env(config_dir(), "development").unwrap();
    assert_eq!(development.config().history.page_size, 20);
    assert_eq!(development.config().scheduler.retry_delay_seconds, 60);

    let test = ConfigManager::load_from_directory_with_env(config_dir(), "test").unwrap();
    assert_eq!(test.config().history.page_size, 5);
    assert_eq!(test.config().scheduler.poll_interval_ms, 50);
    assert_eq!(test.config().scheduler.worker_slots, 4);

    let production = ConfigManager::load_from_directory_with_env(config_dir(), "production").unwrap();
    assert_eq!(production.config().scheduler.worker_slots, 8);
    assert_eq!(production.config().history.page_size, 50);

    let job = production.config().scheduler.job(TIMED_PUBLISHING_JOB).unwrap();
    assert_eq!(job.retries_on_fails, 3);
    assert!(job.enabled);
}

#[tokio::test]
async fn test_components_build_from_config() {
    let manager = ConfigManager::load_from_directory_with_env(config_dir(), "test").unwrap();
    let config = manager.config();

    let store = Arc::new(InMemoryStore::new());
    let service = Arc::new(PublishingService::from_config(store.clone(), config));
    assert_eq!(service.scheduler_actor(), "scheduler");

    let history = HistoryService::from_config(store, config);
    assert_eq!(history.page_size(), 5);

    let engine = SchedulerEngine::from_config(&config.scheduler);
    engine
        .register_configured(
            &config.scheduler,
            TIMED_PUBLISHING_JOB,
            Arc::new(TimedPublishingJob::new(service)),
        )
        .unwrap();
    let status = engine.status();
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].cron_expression, "0 * * * * *");
    assert_eq!(status[0].retries_on_fails, 3);
}
