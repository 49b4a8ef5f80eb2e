use std::sync::Arc;
use std::time::Duration;
use velocity_guard::*;

const NS: &str = "fraud_limits";
const START: u64 = 50 * 86_400_000;

struct Fixture {
    engine: Arc<VelocityEngine>,
    clock: Arc<ManualClock>,
    dispatcher: Arc<RecordingDispatcher>,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("velocity_guard=debug"))
        .with_test_writer()
        .try_init();
}

fn fixture(ceiling: u64, soft_flag_allowed: bool) -> Fixture {
    init_tracing();
    let clock = Arc::new(ManualClock::new(START));
    let source = Arc::new(StaticLimitsSource::new().with_limits(
        NS,
        "default",
        CategoryLimits::new(ceiling, soft_flag_allowed).unwrap(),
    ));
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let engine = VelocityEngine::builder(Arc::new(CachedConfigProvider::new(source, NS)))
        .clock(clock.clone())
        .dispatcher(dispatcher.clone())
        .build()
        .unwrap();
    Fixture {
        engine: Arc::new(engine),
        clock,
        dispatcher,
    }
}

async fn record_n(engine: &VelocityEngine, actor: &ActorId, n: usize) -> VelocityVerdict {
    let mut last = None;
    for _ in 0..n {
        last = Some(engine.record_and_evaluate(actor).await.unwrap());
    }
    last.unwrap()
}

#[tokio::test]
async fn test_scenario_a_hard_block() {
    let f = fixture(5, false);
    let actor = ActorId::from("affiliate-1");
    let verdict = record_n(&f.engine, &actor, 6).await;

    assert_eq!(verdict.window_count, 6);
    assert_eq!(verdict.risk_tier, RiskTier::High);
    assert_eq!(verdict.action, VelocityAction::Block);
    assert_eq!(f.dispatcher.count(VelocityAction::Block), 1);
}

#[tokio::test]
async fn test_scenario_b_soft_flag() {
    let f = fixture(5, true);
    let actor = ActorId::from("affiliate-1");
    let verdict = record_n(&f.engine, &actor, 6).await;

    assert_eq!(verdict.action, VelocityAction::Flag);
    assert_eq!(f.dispatcher.count(VelocityAction::Block), 0);
}

#[tokio::test]
async fn test_scenario_c_unknown_category_fails_closed() {
    let f = fixture(5, false);
    let engine = VelocityEngine::builder(Arc::new(CachedConfigProvider::new(
        Arc::new(StaticLimitsSource::new()),
        NS,
    )))
    .clock(f.clock.clone())
    .resolver(Arc::new(StaticCategoryResolver::new("unconfigured")))
    .dispatcher(f.dispatcher.clone())
    .build()
    .unwrap();
    let actor = ActorId::from("affiliate-1");

    let err = engine.record_and_evaluate(&actor).await.unwrap_err();
    assert!(matches!(err, VelocityError::ConfigNotFound { ref category } if category.as_ref() == "unconfigured"));
    assert!(f.dispatcher.records().is_empty());
    assert_eq!(engine.history().count_since(&actor, START - 3_600_000), 1);
}

#[tokio::test]
async fn test_scenario_d_unknown_category_admits() {
    let f = fixture(1, false);
    let actor = ActorId::from("affiliate-1");
    record_n(&f.engine, &actor, 5).await;

    assert!(f.engine.check_admission(&actor, "unconfigured").await);
    assert!(!f.engine.check_admission(&actor, "default").await);
}

#[tokio::test]
async fn test_empty_history_always_admitted() {
    for ceiling in [1, 2, 10, 1000] {
        let f = fixture(ceiling, false);
        assert!(f.engine.check_admission(&ActorId::from("fresh"), "default").await);
    }
}

#[tokio::test]
async fn test_ceiling_ten_boundaries() {
    let f = fixture(10, false);
    let actor = ActorId::from("affiliate-1");

    let at_8 = record_n(&f.engine, &actor, 8).await;
    assert_eq!((at_8.risk_tier, at_8.action), (RiskTier::Medium, VelocityAction::Allow));

    let at_9 = record_n(&f.engine, &actor, 1).await;
    assert_eq!((at_9.risk_tier, at_9.action), (RiskTier::High, VelocityAction::Flag));

    let at_10 = record_n(&f.engine, &actor, 1).await;
    assert_eq!(at_10.action, VelocityAction::Flag);

    let at_11 = record_n(&f.engine, &actor, 1).await;
    assert_eq!(at_11.action, VelocityAction::Block);
}

#[tokio::test]
async fn test_records_older_than_retention_never_counted() {
    let f = fixture(10, false);
    let actor = ActorId::from("affiliate-1");
    record_n(&f.engine, &actor, 3).await;

    f.clock.advance(Duration::from_secs(24 * 3600));
    assert_eq!(f.engine.history().count_since(&actor, 0), 0);
    assert_eq!(f.engine.history().count_since(&actor, START - 1), 0);
}

#[tokio::test]
async fn test_actors_are_independent() {
    let f = fixture(2, false);
    let noisy = ActorId::from("noisy");
    let quiet = ActorId::from("quiet");
    record_n(&f.engine, &noisy, 5).await;

    let verdict = f.engine.record_and_evaluate(&quiet).await.unwrap();
    assert_eq!(verdict.window_count, 1);
    assert_eq!(verdict.action, VelocityAction::Allow);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_records_no_lost_updates() {
    let f = fixture(1_000_000, false);
    let actor = ActorId::from("hot-actor");

    let tasks: Vec<_> = (0..1000)
        .map(|_| {
            let engine = f.engine.clone();
            let actor = actor.clone();
            tokio::spawn(async move { engine.record_and_evaluate(&actor).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(f.engine.window_count(&actor), 1000);
    assert_eq!(f.engine.stats().events_recorded, 1000);
}

#[tokio::test]
async fn test_engine_from_toml_documents() {
    init_tracing();
    let settings = VelocitySettings::from_toml(
        r#"
        default_category = "affiliate"
        limits_namespace = "risk"
        "#,
    )
    .unwrap();
    let source = TomlLimitsSource::parse(
        r#"
        [risk.affiliate]
        ceiling = 2
        soft_flag_allowed = true
        "#,
    )
    .unwrap();
    let engine = VelocityEngine::builder(Arc::new(CachedConfigProvider::new(
        Arc::new(source),
        settings.limits_namespace.clone(),
    )))
    .settings(settings)
    .clock(Arc::new(ManualClock::new(START)))
    .observer(Arc::new(NoOpObserver))
    .build()
    .unwrap();

    let actor = ActorId::from("affiliate-9");
    let verdict = record_n(&engine, &actor, 3).await;
    assert_eq!(verdict.ceiling, 2);
    assert_eq!(verdict.action, VelocityAction::Flag);
}
