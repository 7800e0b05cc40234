//! Timed publishing through the scheduler engine.

mod common;

use async_trait::async_trait;
use common::*;
use publishing_core::config::JobDefinition;
use publishing_core::constants::TIMED_PUBLISHING_JOB;
use publishing_core::models::{
    EntityContent, EntityVersion, FailureDisposition, JobState, Language, SkipReason,
};
use publishing_core::publishing::TransitionOutcome;
use publishing_core::scheduler::{
    FireResult, FireTrigger, JobContext, JobHandler, JobReport, SchedulerEngine,
    TimedPublishingJob,
};
use publishing_core::state_machine::{LanguageEvent, PublishingStatus};
use publishing_core::store::UnitOfWorkFactory;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use uuid::Uuid;

fn timed_publishing(retries: u32) -> JobDefinition {
    JobDefinition {
        name: TIMED_PUBLISHING_JOB.to_string(),
        cron: "0 * * * * *".to_string(),
        retries_on_fails: retries,
        enabled: true,
    }
}

fn engine_for(world: &TestWorld, retries: u32) -> SchedulerEngine {
    let engine = SchedulerEngine::new(2, Duration::from_millis(10), chrono::Duration::seconds(30));
    engine
        .register(
            timed_publishing(retries),
            Arc::new(TimedPublishingJob::new(world.service.clone())),
        )
        .unwrap();
    engine
}

async fn scheduled_service(world: &TestWorld, name: &str, publish_at_minutes: i64) -> EntityVersion {
    let version = world
        .create(EntityContent::Service(complete_service(&["fi"])), &[("fi", name)])
        .await;
    let outcome = world
        .transition(
            version.id,
            &["fi"],
            LanguageEvent::SchedulePublish(world.later(publish_at_minutes)),
            world.now,
        )
        .await;
    match outcome {
        TransitionOutcome::Applied { version, .. } => version,
        TransitionOutcome::Rejected(outcome) => panic!("schedule rejected: {outcome:?}"),
    }
}

async fn break_funding(world: &TestWorld, version: &EntityVersion) {
    let mut content = complete_service(&["fi"]);
    content.funding_type_id = None;
    world
        .service
        .update_content(version.id, EntityContent::Service(content), EDITOR, world.later(1))
        .await
        .unwrap();
}

async fn status_of(world: &TestWorld, version_id: Uuid) -> Option<PublishingStatus> {
    let uow = world.store.begin().await.unwrap();
    uow.find_version(version_id, &[])
        .await
        .unwrap()
        .unwrap()
        .status_of(&Language::finnish())
}

fn completed(result: FireResult) -> JobReport {
    match result {
        FireResult::Completed(report) => report,
        other => panic!("expected a completed fire, got {other:?}"),
    }
}

#[tokio::test]
async fn test_due_scheduled_publish_is_carried_out() {
    let world = TestWorld::new();
    let version = scheduled_service(&world, "Palvelu", 5).await;
    let engine = engine_for(&world, 3);

    let early = completed(
        engine
            .fire(TIMED_PUBLISHING_JOB, world.later(4), FireTrigger::Scheduled)
            .await
            .unwrap(),
    );
    assert_eq!(early.processed, 0);
    assert_eq!(status_of(&world, version.id).await, Some(PublishingStatus::Scheduled));

    let report = completed(
        engine
            .fire(TIMED_PUBLISHING_JOB, world.later(6), FireTrigger::Scheduled)
            .await
            .unwrap(),
    );
    assert_eq!(report.processed, 1);
    assert_eq!(report.succeeded, 1);
    assert_eq!(status_of(&world, version.id).await, Some(PublishingStatus::Published));

    let job = engine.job(TIMED_PUBLISHING_JOB).unwrap();
    assert_eq!(job.state, JobState::Waiting);
    assert_eq!(job.last_fire_time_utc, Some(world.later(6)));
}

#[tokio::test]
async fn test_scheduled_archive_is_carried_out() {
    let world = TestWorld::new();
    let version = world
        .create(EntityContent::Service(complete_service(&["fi"])), &[("fi", "Palvelu")])
        .await;
    world.publish(version.id, &["fi"]).await;
    let scheduled = world
        .transition(version.id, &["fi"], LanguageEvent::ScheduleArchive(world.later(5)), world.now)
        .await;
    assert!(scheduled.is_applied());

    let engine = engine_for(&world, 0);
    let report = completed(engine.fire(TIMED_PUBLISHING_JOB, world.later(6), FireTrigger::Scheduled).await.unwrap());
    assert_eq!(report.succeeded, 1);
    assert_eq!(status_of(&world, version.id).await, Some(PublishingStatus::Archived));
}

#[tokio::test]
async fn test_failing_content_is_recorded_and_does_not_hurt_the_job() {
    let world = TestWorld::new();
    let broken = scheduled_service(&world, "Rikki", 5).await;
    let healthy = scheduled_service(&world, "Kunnossa", 5).await;
    break_funding(&world, &broken).await;

    let engine = engine_for(&world, 0);
    let report = completed(
        engine
            .fire(TIMED_PUBLISHING_JOB, world.later(6), FireTrigger::Scheduled)
            .await
            .unwrap(),
    );
    assert_eq!(report.processed, 2);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.content_failures, 1);

    assert_eq!(status_of(&world, broken.id).await, Some(PublishingStatus::Scheduled));
    assert_eq!(status_of(&world, healthy.id).await, Some(PublishingStatus::Published));

    let failed = world.service.failed_publishes().await.unwrap();
    assert_eq!(failed.len(), 1);
    let record = &failed[0];
    assert_eq!(record.versioned_id, broken.id);
    assert_eq!(record.entity_id, broken.root_id);
    assert_eq!(record.names[&Language::finnish()], "Rikki");
    assert_eq!(record.languages, vec![Language::finnish()]);
    assert_eq!(record.publishing_status, PublishingStatus::Scheduled);
    assert!(record.messages.iter().any(|m| m.contains("FundingType")));

    // The job stays healthy and the failed item is not picked up again
    let job = engine.job(TIMED_PUBLISHING_JOB).unwrap();
    assert_eq!(job.count_of_failed_executions, 0);
    assert_eq!(job.state, JobState::Waiting);
    let again = completed(
        engine
            .fire(TIMED_PUBLISHING_JOB, world.later(7), FireTrigger::Scheduled)
            .await
            .unwrap(),
    );
    assert_eq!(again.processed, 0);
    assert_eq!(world.service.failed_publishes().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_publish_can_be_retried_after_fixing_content() {
    let world = TestWorld::new();
    let broken = scheduled_service(&world, "Rikki", 5).await;
    break_funding(&world, &broken).await;

    let engine = engine_for(&world, 0);
    engine
        .fire(TIMED_PUBLISHING_JOB, world.later(6), FireTrigger::Scheduled)
        .await
        .unwrap();
    let record = world.service.failed_publishes().await.unwrap().remove(0);

    let still_broken = world
        .service
        .retry_failed_publish(record.id, EDITOR, world.later(8))
        .await
        .unwrap();
    assert!(!still_broken.is_applied());
    assert_eq!(world.service.failed_publishes().await.unwrap().len(), 1);

    world
        .service
        .update_content(
            broken.id,
            EntityContent::Service(complete_service(&["fi"])),
            EDITOR,
            world.later(9),
        )
        .await
        .unwrap();
    let retried = world
        .service
        .retry_failed_publish(record.id, EDITOR, world.later(10))
        .await
        .unwrap();
    assert!(retried.is_applied());
    assert!(world.service.failed_publishes().await.unwrap().is_empty());
    assert_eq!(status_of(&world, broken.id).await, Some(PublishingStatus::Published));
}

#[tokio::test]
async fn test_store_outage_counts_against_the_job_then_pauses_it() {
    let world = TestWorld::new();
    let version = scheduled_service(&world, "Palvelu", 5).await;
    let engine = engine_for(&world, 1);

    world.store.set_unavailable(true);
    let first = engine
        .fire(TIMED_PUBLISHING_JOB, world.later(6), FireTrigger::Scheduled)
        .await
        .unwrap();
    assert!(matches!(
        first,
        FireResult::Failed { disposition: FailureDisposition::Retry { .. }, .. }
    ));
    let second = engine
        .fire(TIMED_PUBLISHING_JOB, world.later(7), FireTrigger::Scheduled)
        .await
        .unwrap();
    assert!(matches!(
        second,
        FireResult::Failed { disposition: FailureDisposition::Paused, .. }
    ));

    let job = engine.job(TIMED_PUBLISHING_JOB).unwrap();
    assert_eq!(job.state, JobState::Paused);
    assert_eq!(job.count_of_failed_executions, 2);
    assert_eq!(
        engine
            .fire(TIMED_PUBLISHING_JOB, world.later(8), FireTrigger::Scheduled)
            .await
            .unwrap(),
        FireResult::Skipped(SkipReason::Paused)
    );

    world.store.set_unavailable(false);
    assert!(world.service.failed_publishes().await.unwrap().is_empty());
    assert_eq!(engine.toggle(TIMED_PUBLISHING_JOB).unwrap(), JobState::Waiting);

    let report = completed(
        engine
            .fire(TIMED_PUBLISHING_JOB, world.later(9), FireTrigger::Scheduled)
            .await
            .unwrap(),
    );
    assert_eq!(report.succeeded, 1);
    assert_eq!(status_of(&world, version.id).await, Some(PublishingStatus::Published));
    assert_eq!(engine.job(TIMED_PUBLISHING_JOB).unwrap().count_of_failed_executions, 0);
}

struct GatedHandler {
    runs: AtomicUsize,
    started: Notify,
    release: Notify,
}

#[async_trait]
impl JobHandler for GatedHandler {
    async fn execute(&self, _context: JobContext) -> publishing_core::Result<JobReport> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        self.release.notified().await;
        Ok(JobReport::default())
    }
}

#[tokio::test]
async fn test_running_job_is_never_started_twice() {
    let engine = Arc::new(SchedulerEngine::new(
        4,
        Duration::from_millis(10),
        chrono::Duration::seconds(30),
    ));
    let handler = Arc::new(GatedHandler {
        runs: AtomicUsize::new(0),
        started: Notify::new(),
        release: Notify::new(),
    });
    engine.register(timed_publishing(0), handler.clone()).unwrap();

    let first = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.force(TIMED_PUBLISHING_JOB).await })
    };
    handler.started.notified().await;

    let second = engine.force(TIMED_PUBLISHING_JOB).await.unwrap();
    assert_eq!(second, FireResult::Skipped(SkipReason::AlreadyRunning));
    assert_eq!(engine.job(TIMED_PUBLISHING_JOB).unwrap().state, JobState::Running);

    handler.release.notify_one();
    assert!(matches!(first.await.unwrap().unwrap(), FireResult::Completed(_)));
    assert_eq!(handler.runs.load(Ordering::SeqCst), 1);
    assert_eq!(engine.job(TIMED_PUBLISHING_JOB).unwrap().state, JobState::Waiting);
}

#[tokio::test]
async fn test_status_surface_lists_registered_jobs() {
    let world = TestWorld::new();
    let engine = engine_for(&world, 2);

    let status = engine.status();
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].job_type, TIMED_PUBLISHING_JOB);
    assert_eq!(status[0].retries_on_fails, 2);
    assert_eq!(status[0].state, JobState::Waiting);
    assert!(status[0].next_fire_time_utc.is_some());
    assert!(engine.executing().is_empty());

    assert_eq!(engine.toggle(TIMED_PUBLISHING_JOB).unwrap(), JobState::Paused);
    assert_eq!(engine.status()[0].state, JobState::Paused);
}
