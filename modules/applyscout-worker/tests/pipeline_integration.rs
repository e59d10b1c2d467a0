use std::sync::Arc;

use applyscout_common::{ApplyStatus, Config, RunnerConfig, TaskStatus};
use applyscout_worker::adapter::StubAdapter;
use applyscout_worker::pipeline::{run_apply_pass, run_discovery};
use applyscout_worker::ranker::dedupe_hash;
use applyscout_worker::runner::ApplyRunner;
use applyscout_worker::store::{JobStore, MemoryStore, NewLead};
use applyscout_worker::testing::{make_hit, make_profile, MockSearcher, ScriptedAdapter};

fn test_config() -> Config {
    Config {
        tavily_api_key: None,
        yutori_api_key: None,
        runner: RunnerConfig::default(),
        score_threshold: 0.8,
        max_leads: 15,
        batch_size: 10,
        multi_query_bonus: 0.05,
        discover_interval_secs: 3_600,
        apply_interval_secs: 600,
    }
}

fn fast_runner_config() -> RunnerConfig {
    RunnerConfig {
        safe_mode: false,
        max_retries: 2,
        base_delay_ms: 1,
        max_delay_ms: 2,
        domain_throttle_ms: 0,
    }
}

// Queries build_queries derives from the profile returned by make_profile
// (Software Engineer / Berlin / remote / keywords rust, tokio).
const DISCOVERY_QUERY: &str = "Software Engineer job openings hiring now";
const GEO_QUERY: &str = "Software Engineer jobs in Berlin OR remote";
const SKILL_QUERY: &str = "Software Engineer rust tokio job postings";

#[tokio::test]
async fn discovery_merges_filters_and_enqueues_once() {
    let store = MemoryStore::new();
    let profile = make_profile("ada@example.com");
    store.add_profile(profile.clone());

    // The same posting surfaces from two queries under different tracking
    // params; a third query fails outright; one hit is below threshold.
    let searcher = MockSearcher::new()
        .on_query(
            DISCOVERY_QUERY,
            vec![
                make_hit(
                    "Senior Engineer at Acme",
                    "https://boards.greenhouse.io/acme/jobs/1?utm_source=feed",
                    0.9,
                ),
                make_hit("Junior role", "https://example.com/jobs/low", 0.5),
            ],
        )
        .on_query(
            GEO_QUERY,
            vec![make_hit(
                "Senior Engineer at Acme",
                "https://boards.greenhouse.io/acme/jobs/1?ref=x",
                0.85,
            )],
        )
        .fail_query(SKILL_QUERY, "HTTP 503 Service Unavailable");

    let config = test_config();
    let stats = run_discovery(&store, &searcher, &config).await.unwrap();

    assert_eq!(stats.profiles, 1);
    assert_eq!(stats.queries_failed, 1);
    // The duplicate collapses to one candidate; the 0.5 hit is filtered.
    assert_eq!(stats.candidates, 1);
    assert_eq!(stats.leads_created, 1);
    assert_eq!(stats.tasks_enqueued, 1);
    assert_eq!(store.lead_count(), 1);
    assert_eq!(store.queued_count(), 1);

    let lead = store
        .find_lead_by_hash(
            profile.id,
            &dedupe_hash("https://boards.greenhouse.io/acme/jobs/1"),
        )
        .await
        .unwrap()
        .expect("lead stored under canonical URL hash");
    assert_eq!(lead.company, "Acme");
    assert_eq!(lead.score, 0.95);
    assert_eq!(lead.sources.len(), 2);

    // A second run finds the same posting again but creates nothing new.
    let stats = run_discovery(&store, &searcher, &config).await.unwrap();
    assert_eq!(stats.leads_created, 0);
    assert_eq!(stats.tasks_enqueued, 0);
    assert_eq!(stats.skipped_duplicates, 1);
    assert_eq!(stats.skipped_existing_task, 1);
    assert_eq!(store.lead_count(), 1);
}

#[tokio::test]
async fn discovery_skips_profiles_without_a_title() {
    let store = MemoryStore::new();
    let mut profile = make_profile("no-title@example.com");
    profile.title = None;
    store.add_profile(profile);

    let stats = run_discovery(&store, &MockSearcher::new(), &test_config())
        .await
        .unwrap();
    assert_eq!(stats.profiles, 0);
    assert_eq!(stats.queries_run, 0);
}

async fn seed_task(store: &MemoryStore, email: &str, url: &str) -> uuid::Uuid {
    let profile = make_profile(email);
    store.add_profile(profile.clone());
    let lead = store
        .insert_lead(NewLead {
            profile_id: profile.id,
            url: url.to_string(),
            dedupe_hash: dedupe_hash(url),
            title: "Engineer at Acme".to_string(),
            company: "Acme".to_string(),
            score: 0.9,
            sources: vec![DISCOVERY_QUERY.to_string()],
        })
        .await
        .unwrap();
    store.enqueue_task(lead.id, profile.id).await.unwrap()
}

#[tokio::test]
async fn apply_pass_submits_and_records_status() {
    let store = MemoryStore::new();
    let task_id = seed_task(&store, "ada@example.com", "https://jobs.lever.co/acme/1").await;

    let runner = ApplyRunner::new(Arc::new(StubAdapter), fast_runner_config());
    let stats = run_apply_pass(&store, &runner, 10).await.unwrap();

    assert_eq!(stats.claimed, 1);
    assert_eq!(stats.submitted, 1);
    assert_eq!(stats.failed, 0);

    let statuses = store.task_statuses();
    assert_eq!(statuses, vec![(task_id, TaskStatus::Submitted, None)]);

    // Nothing left to claim on the next pass.
    let stats = run_apply_pass(&store, &runner, 10).await.unwrap();
    assert_eq!(stats.claimed, 0);
}

#[tokio::test]
async fn captcha_blocked_task_lands_as_failed_with_note() {
    let store = MemoryStore::new();
    let task_id = seed_task(&store, "ada@example.com", "https://jobs.lever.co/acme/1").await;

    let adapter = Arc::new(ScriptedAdapter::always_failing("captcha required"));
    let runner = ApplyRunner::new(adapter.clone(), fast_runner_config());
    let stats = run_apply_pass(&store, &runner, 10).await.unwrap();

    assert_eq!(stats.claimed, 1);
    assert_eq!(stats.failed, 1);
    // Terminal failure, so the adapter was not retried.
    assert_eq!(adapter.calls(), 1);

    let statuses = store.task_statuses();
    assert_eq!(
        statuses,
        vec![(
            task_id,
            TaskStatus::Failed,
            Some("terminal: captcha required".to_string())
        )]
    );
}

#[tokio::test]
async fn transient_failures_retry_within_one_pass() {
    let store = MemoryStore::new();
    seed_task(&store, "ada@example.com", "https://jobs.lever.co/acme/1").await;

    let adapter = Arc::new(ScriptedAdapter::failing_then_succeeding(
        vec!["read ECONNRESET", "read ECONNRESET"],
        ApplyStatus::Submitted,
    ));
    let runner = ApplyRunner::new(adapter.clone(), fast_runner_config());
    let stats = run_apply_pass(&store, &runner, 10).await.unwrap();

    assert_eq!(stats.submitted, 1);
    assert_eq!(adapter.calls(), 3);
}

#[tokio::test]
async fn missing_resume_leaves_the_task_queued_until_one_exists() {
    let store = MemoryStore::new();
    let mut profile = make_profile("ada@example.com");
    profile.resume_text = None;
    store.add_profile(profile.clone());
    let lead = store
        .insert_lead(NewLead {
            profile_id: profile.id,
            url: "https://jobs.lever.co/acme/1".to_string(),
            dedupe_hash: dedupe_hash("https://jobs.lever.co/acme/1"),
            title: "Engineer at Acme".to_string(),
            company: "Acme".to_string(),
            score: 0.9,
            sources: Vec::new(),
        })
        .await
        .unwrap();
    let task_id = store.enqueue_task(lead.id, profile.id).await.unwrap();

    let adapter = Arc::new(ScriptedAdapter::succeeding(ApplyStatus::Submitted));
    let runner = ApplyRunner::new(adapter.clone(), fast_runner_config());
    let stats = run_apply_pass(&store, &runner, 10).await.unwrap();

    // The task is skipped, not failed, and stays claimable.
    assert_eq!(stats.skipped_no_resume, 1);
    assert_eq!(adapter.calls(), 0);
    assert_eq!(store.queued_count(), 1);
    assert_eq!(store.task_statuses(), vec![(task_id, TaskStatus::Queued, None)]);

    // Once a resume is on file, the next pass runs it.
    store.set_resume_text(profile.id, Some("Rust engineer.".to_string()));
    let stats = run_apply_pass(&store, &runner, 10).await.unwrap();
    assert_eq!(stats.submitted, 1);
    assert_eq!(adapter.calls(), 1);
    assert_eq!(store.task_statuses(), vec![(task_id, TaskStatus::Submitted, None)]);
}

#[tokio::test]
async fn batch_size_bounds_one_pass() {
    let store = MemoryStore::new();
    let profile = make_profile("ada@example.com");
    store.add_profile(profile.clone());
    for i in 0..5 {
        let lead = store
            .insert_lead(NewLead {
                profile_id: profile.id,
                url: format!("https://jobs.lever.co/acme/{i}"),
                dedupe_hash: dedupe_hash(&format!("https://jobs.lever.co/acme/{i}")),
                title: "Engineer at Acme".to_string(),
                company: "Acme".to_string(),
                score: 0.9,
                sources: Vec::new(),
            })
            .await
            .unwrap();
        store.enqueue_task(lead.id, profile.id).await.unwrap();
    }

    let runner = ApplyRunner::new(Arc::new(StubAdapter), fast_runner_config());
    let stats = run_apply_pass(&store, &runner, 2).await.unwrap();
    assert_eq!(stats.claimed, 2);
    assert_eq!(store.queued_count(), 3);

    let stats = run_apply_pass(&store, &runner, 10).await.unwrap();
    assert_eq!(stats.claimed, 3);
}
