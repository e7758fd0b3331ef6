//! Store-backed scenarios. Run only when TEST_DATABASE_URL points at a PostgreSQL server;
//! each test works in a schema of its own and drops it afterwards.

use satellite_track::auth::SessionService;
use satellite_track::model::{
    self, AddInstruction, ExecState, Instruction, LoginLog, LoginRequest, NewSatelliteState, OperationLog,
    Record, RegisterRequest, Role, SatelliteState, State,
};
use satellite_track::service::{
    ExecutionJob, InstructionExecutor, ListQuery, QueryEngine, RecordStore, SimulatedRunner,
};
use satellite_track::sql::{Condition, SortType};
use satellite_track::{apply_migrations, AppError, TableRegistry, TokenService};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

struct TestDb {
    pool: PgPool,
    registry: TableRegistry,
}

impl TestDb {
    async fn drop_schema(self) {
        let sql = format!("DROP SCHEMA IF EXISTS \"{}\" CASCADE", self.registry.schema());
        sqlx::query(&sql).execute(&self.pool).await.unwrap();
    }
}

async fn test_db() -> Option<TestDb> {
    let url = match std::env::var("TEST_DATABASE_URL") {
        Ok(u) if !u.trim().is_empty() => u,
        _ => {
            eprintln!("TEST_DATABASE_URL not set; skipping");
            return None;
        }
    };
    let pool = PgPoolOptions::new().max_connections(4).connect(&url).await.unwrap();
    let schema = format!("t_{}", uuid::Uuid::new_v4().simple());
    let registry = model::registry(&schema);
    apply_migrations(&pool, &registry).await.unwrap();
    Some(TestDb { pool, registry })
}

fn satellite(id: &str, name: &str, run_state: State) -> NewSatelliteState {
    NewSatelliteState {
        satellite_id: id.into(),
        satellite_name: name.into(),
        orbit_id: "O1".into(),
        run_state,
        mean_anomaly: 12.5,
        speed: 7.6,
    }
}

#[tokio::test]
async fn pages_cover_every_row_once() {
    let Some(db) = test_db().await else { return };
    for i in 0..25 {
        RecordStore::insert(&db.pool, &db.registry, &satellite(&format!("S{}", i), "Sat", State::Normal))
            .await
            .unwrap();
    }
    let engine = QueryEngine::new(&db.pool, &db.registry);
    let mut seen = Vec::new();
    let mut sizes = Vec::new();
    for page in 1..=3 {
        let q = ListQuery::new(page, 10, SortType::Id, "").unwrap();
        let got = engine.paged::<SatelliteState>(&q, &[]).await.unwrap();
        assert_eq!(got.total, 25);
        sizes.push(got.items.len());
        seen.extend(got.items.into_iter().map(|r| r.meta.id));
    }
    assert_eq!(sizes, vec![10, 10, 5]);
    let mut unique = seen.clone();
    unique.dedup();
    assert_eq!(unique.len(), 25);
    assert!(seen.windows(2).all(|w| w[0] < w[1]));

    let q = ListQuery::new(4, 10, SortType::Id, "").unwrap();
    let empty = engine.paged::<SatelliteState>(&q, &[]).await.unwrap();
    assert!(empty.items.is_empty());
    assert_eq!(empty.total, 25);
    db.drop_schema().await;
}

#[tokio::test]
async fn latest_per_key_keeps_newest_row() {
    let Some(db) = test_db().await else { return };
    for (id, name, st) in [
        ("S1", "first", State::Normal),
        ("S2", "other", State::Offline),
        ("S1", "second", State::Abnormal),
    ] {
        RecordStore::insert(&db.pool, &db.registry, &satellite(id, name, st))
            .await
            .unwrap();
    }
    let newest = RecordStore::insert(&db.pool, &db.registry, &satellite("S1", "third", State::Repairing))
        .await
        .unwrap();

    let engine = QueryEngine::new(&db.pool, &db.registry);
    let q = ListQuery::new(1, 10, SortType::Time, "").unwrap();
    let page = engine.latest_per_key::<SatelliteState>(&q, &[]).await.unwrap();
    assert_eq!(page.total, 2);
    let s1 = page.items.iter().find(|r| r.satellite_id == "S1").unwrap();
    assert_eq!(s1.meta.id, newest.meta.id);
    assert_eq!(s1.satellite_name, "third");
    assert_eq!(s1.run_state, State::Repairing);
    assert_eq!(page.items[0].satellite_id, "S1");

    let q = ListQuery::new(1, 10, SortType::Time, "S2").unwrap();
    let searched = engine.latest_per_key::<SatelliteState>(&q, &[]).await.unwrap();
    assert_eq!(searched.total, 1);
    assert_eq!(searched.items[0].run_state, State::Offline);

    let counts = engine.latest_counts_by::<SatelliteState>("run_state").await.unwrap();
    assert_eq!(counts, vec![(State::Offline.code(), 1), (State::Repairing.code(), 1)]);
    db.drop_schema().await;
}

#[tokio::test]
async fn equal_timestamps_fall_back_to_the_higher_id() {
    let Some(db) = test_db().await else { return };
    let older = RecordStore::insert(&db.pool, &db.registry, &satellite("S1", "first", State::Normal))
        .await
        .unwrap();
    let newer = RecordStore::insert(&db.pool, &db.registry, &satellite("S1", "second", State::Offline))
        .await
        .unwrap();
    assert!(newer.meta.id > older.meta.id);

    let sql = format!(
        "UPDATE \"{}\".\"{}\" SET created_at = $1 WHERE satellite_id = 'S1'",
        db.registry.schema(),
        SatelliteState::TABLE
    );
    sqlx::query(&sql)
        .bind(older.meta.created_at)
        .execute(&db.pool)
        .await
        .unwrap();

    let engine = QueryEngine::new(&db.pool, &db.registry);
    let q = ListQuery::new(1, 10, SortType::Time, "").unwrap();
    let page = engine.latest_per_key::<SatelliteState>(&q, &[]).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].meta.created_at, older.meta.created_at);
    assert_eq!(page.items[0].meta.id, newer.meta.id);
    assert_eq!(page.items[0].satellite_name, "second");
    db.drop_schema().await;
}

#[tokio::test]
async fn stored_row_reads_back_unchanged_by_key() {
    let Some(db) = test_db().await else { return };
    RecordStore::insert(&db.pool, &db.registry, &satellite("S2", "decoy", State::Normal))
        .await
        .unwrap();
    let new = NewSatelliteState {
        satellite_id: "S9".into(),
        satellite_name: "Tiangong relay".into(),
        orbit_id: "LEO-42".into(),
        run_state: State::Repairing,
        mean_anomaly: 271.123456789,
        speed: 7.6601234,
    };
    let stored = RecordStore::insert(&db.pool, &db.registry, &new).await.unwrap();

    let engine = QueryEngine::new(&db.pool, &db.registry);
    let q = ListQuery::new(1, 10, SortType::Time, "").unwrap();
    let by_key = [Condition::eq("satellite_id", "S9")];
    let page = engine.paged::<SatelliteState>(&q, &by_key).await.unwrap();
    assert_eq!(page.total, 1);
    let got = &page.items[0];
    assert_eq!(got.meta.id, stored.meta.id);
    assert_eq!(got.meta.created_at, stored.meta.created_at);
    assert_eq!(got.meta.updated_at, stored.meta.updated_at);
    assert_eq!(got.satellite_id, new.satellite_id);
    assert_eq!(got.satellite_name, new.satellite_name);
    assert_eq!(got.orbit_id, new.orbit_id);
    assert_eq!(got.run_state, new.run_state);
    assert_eq!(got.mean_anomaly, new.mean_anomaly);
    assert_eq!(got.speed, new.speed);
    db.drop_schema().await;
}

#[tokio::test]
async fn search_and_conditions_share_the_count() {
    let Some(db) = test_db().await else { return };
    for (id, name, st) in [
        ("S1", "Alpha_1", State::Normal),
        ("S2", "alpha%2", State::Offline),
        ("S3", "beta", State::Normal),
    ] {
        RecordStore::insert(&db.pool, &db.registry, &satellite(id, name, st))
            .await
            .unwrap();
    }
    let engine = QueryEngine::new(&db.pool, &db.registry);

    let q = ListQuery::new(1, 10, SortType::Time, "ALPHA").unwrap();
    assert_eq!(engine.paged::<SatelliteState>(&q, &[]).await.unwrap().total, 2);

    let q = ListQuery::new(1, 10, SortType::Time, "%").unwrap();
    let literal = engine.paged::<SatelliteState>(&q, &[]).await.unwrap();
    assert_eq!(literal.total, 1);
    assert_eq!(literal.items[0].satellite_id, "S2");

    let q = ListQuery::new(1, 10, SortType::Time, "alpha").unwrap();
    let normal = [Condition::eq("run_state", State::Normal.code())];
    let got = engine.paged::<SatelliteState>(&q, &normal).await.unwrap();
    assert_eq!(got.total, 1);
    assert_eq!(got.items[0].satellite_id, "S1");

    let not_normal = [Condition::ne("run_state", State::Normal.code())];
    let q = ListQuery::new(1, 10, SortType::Time, "").unwrap();
    assert_eq!(engine.paged::<SatelliteState>(&q, &not_normal).await.unwrap().total, 1);
    db.drop_schema().await;
}

#[tokio::test]
async fn register_login_and_duplicate() {
    let Some(db) = test_db().await else { return };
    let tokens = TokenService::new("integration-secret-0123456789", Duration::from_secs(7200));
    let sessions = SessionService::new(&db.pool, &db.registry, &tokens);

    let register = || RegisterRequest {
        user_name: Some("alice".into()),
        password: Some("s3cret!".into()),
        phone: Some("+8613800000000".into()),
        nick_name: Some("Alice".into()),
        email: Some("alice@example.com".into()),
        role: Some("CONTROL".into()),
    };
    let user = sessions.register(register()).await.unwrap();
    assert_eq!(user.role, Role::Control);
    assert_ne!(user.password_hash, "s3cret!");

    let dup = sessions.register(register()).await.unwrap_err();
    assert!(matches!(dup, AppError::Conflict(_)));

    let wrong = sessions
        .authenticate(
            LoginRequest {
                user_name: Some("alice".into()),
                password: Some("nope".into()),
            },
            "10.0.0.1",
        )
        .await
        .unwrap_err();
    assert!(matches!(wrong, AppError::WrongPassword));

    let missing = sessions
        .authenticate(
            LoginRequest {
                user_name: Some("bob".into()),
                password: Some("x".into()),
            },
            "10.0.0.1",
        )
        .await
        .unwrap_err();
    assert!(matches!(missing, AppError::NotFound(_)));

    let login = sessions
        .authenticate(
            LoginRequest {
                user_name: Some("alice".into()),
                password: Some("s3cret!".into()),
            },
            "10.0.0.1",
        )
        .await
        .unwrap();
    let claims = tokens.verify(&login.token).unwrap();
    assert_eq!(claims.name, "alice");
    assert_eq!(claims.role, Role::Control);
    assert_eq!(claims.exp - claims.iat, 7200);

    let engine = QueryEngine::new(&db.pool, &db.registry);
    let q = ListQuery::new(1, 10, SortType::Time, "alice").unwrap();
    let logins = engine.paged::<LoginLog>(&q, &[]).await.unwrap();
    assert_eq!(logins.total, 1);
    assert_eq!(logins.items[0].login_ip, "10.0.0.1");

    let info = sessions.user_info(&claims).await.unwrap();
    assert_eq!(info.user.user_name, "alice");
    db.drop_schema().await;
}

#[tokio::test]
async fn instruction_runs_through_its_lifecycle() {
    let Some(db) = test_db().await else { return };
    let registry = Arc::new(db.registry.clone());
    let (executor, worker) = InstructionExecutor::spawn(
        db.pool.clone(),
        registry.clone(),
        Arc::new(SimulatedRunner::new(Duration::from_millis(10))),
        4,
        2,
    );

    let new = AddInstruction {
        instruction_id: Some("I-7".into()),
        kind: None,
        content: Some("raise perigee 2km".into()),
        debris_id: Some("D-1".into()),
        debris_name: Some("rocket body".into()),
        satellite_id: Some("S1".into()),
        satellite_name: Some("Sat one".into()),
        threat: Some("high".into()),
    }
    .validate("alice", chrono::Utc::now())
    .unwrap();
    let stored = RecordStore::insert(&db.pool, &registry, &new).await.unwrap();
    executor
        .enqueue(ExecutionJob {
            instruction: stored,
            operator: "alice".into(),
            operator_ip: "10.0.0.1".into(),
        })
        .await
        .unwrap();

    let engine = QueryEngine::new(&db.pool, &registry);
    let mut history = Vec::new();
    for _ in 0..100 {
        history = engine
            .history::<Instruction>("instruction_id", serde_json::json!("I-7"))
            .await
            .unwrap();
        if history.len() == 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let states: Vec<ExecState> = history.iter().map(|r| r.exec_state).collect();
    assert_eq!(states, vec![ExecState::NotExecuted, ExecState::Executing, ExecState::Succeeded]);
    assert!(history[0].executed_at.is_none());
    assert_eq!(history[1].executed_at, history[2].executed_at);

    let q = ListQuery::new(1, 10, SortType::Time, "").unwrap();
    let ops = engine.paged::<OperationLog>(&q, &[]).await.unwrap();
    assert_eq!(ops.total, 1);
    assert_eq!(ops.items[0].record, "execute instruction I-7");

    // The issued row stays listed once the instruction has run.
    let issued = [Condition::eq("exec_state", ExecState::NotExecuted.code())];
    let pending = engine.paged::<Instruction>(&q, &issued).await.unwrap();
    assert_eq!(pending.total, 1);
    assert_eq!(pending.items[0].instruction_id, "I-7");

    worker.abort();
    db.drop_schema().await;
}
