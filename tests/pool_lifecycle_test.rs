//! Integration tests for the connection pool lifecycle and backpressure.

mod common;

use blog_orm::db::{ConnectionManager, PoolState, QueryExecutor};
use blog_orm::config::PoolConfig;
use blog_orm::models::User;
use blog_orm::{FindOptions, OrmError, Value};
use std::time::Duration;
use tempfile::NamedTempFile;

#[tokio::test]
async fn test_query_before_init_is_configuration_error() {
    let executor = QueryExecutor::new(ConnectionManager::new());
    let err = executor
        .write("insert into users (id) values (?)", &[Value::from("x")], true)
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Configuration { .. }));
}

#[tokio::test]
async fn test_double_init_is_configuration_error() {
    let db = common::setup().await;
    let file = NamedTempFile::new().unwrap();

    let err = db
        .manager()
        .init(common::sqlite_config(&file))
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Configuration { .. }));
    // The first pool is untouched
    assert_eq!(db.manager().state().await, PoolState::Ready);
    let n = db
        .executor
        .table::<User>()
        .unwrap()
        .count("count(`id`)", None, &[])
        .await
        .unwrap();
    assert_eq!(n, Some(Value::Int(0)));

    db.close().await;
}

#[tokio::test]
async fn test_query_after_shutdown_is_configuration_error() {
    let db = common::setup().await;
    let manager = db.manager().clone();
    manager.shutdown().await;
    assert_eq!(manager.state().await, PoolState::Closed);
    assert!(manager.status().await.is_none());

    let users = db.executor.table::<User>().unwrap();
    let err = users.find_all(FindOptions::new()).await.unwrap_err();
    assert!(matches!(err, OrmError::Configuration { .. }));

    // Shutdown is idempotent
    manager.shutdown().await;
    assert_eq!(manager.state().await, PoolState::Closed);
}

#[tokio::test]
async fn test_exhausted_pool_suspends_until_release() {
    let db = common::setup_with(|config| config.with_min_size(1).with_max_size(1)).await;
    let users = db.executor.table::<User>().unwrap();
    for (id, name) in [("a", "Ann"), ("b", "Bob")] {
        let mut u = User::new().with("id", id).with("name", name);
        users.save(&mut u).await.unwrap();
    }

    let held = db.manager().acquire().await.unwrap();
    let status = db.manager().status().await.unwrap();
    assert_eq!(status.size, 1);
    assert_eq!(status.idle, 0);

    // No free connection: the read waits instead of failing
    let waiting = tokio::time::timeout(
        Duration::from_millis(200),
        users.find_all(FindOptions::new()),
    )
    .await;
    assert!(waiting.is_err(), "read should still be waiting");

    drop(held);

    let (first, second) = tokio::join!(
        users.find_all(FindOptions::new().filter("`id`=?", vec![Value::from("a")])),
        users.find_all(FindOptions::new().filter("`id`=?", vec![Value::from("b")])),
    );
    let first = first.unwrap();
    let second = second.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].name(), Some("Ann"));
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].name(), Some("Bob"));

    db.close().await;
}

#[tokio::test]
async fn test_acquire_timeout_surfaces_connection_error() {
    let db = common::setup_with(|config| {
        config
            .with_max_size(1)
            .with_acquire_timeout(Duration::from_secs(1))
    })
    .await;

    let held = db.manager().acquire().await.unwrap();
    let err = db
        .executor
        .table::<User>()
        .unwrap()
        .find("a")
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Connection { .. }), "got {:?}", err);
    assert!(err.is_retryable());
    drop(held);

    db.close().await;
}

#[tokio::test]
async fn test_connections_are_returned_after_errors() {
    let db = common::setup_with(|config| config.with_max_size(1)).await;

    for _ in 0..3 {
        let err = db
            .executor
            .read("select * from missing_table", &[], None)
            .await
            .unwrap_err();
        assert!(matches!(err, OrmError::Statement { .. }));
    }

    let rows = db.executor.read("select 1 as one", &[], None).await.unwrap();
    assert_eq!(rows[0].get_i64("one"), Some(1));

    db.close().await;
}

#[tokio::test]
async fn test_init_against_refused_port_fails_fast() {
    let manager = ConnectionManager::new();
    let config = PoolConfig::mysql("blog", "secret", "blog")
        .with_host("127.0.0.1")
        .with_port(1);

    let result = tokio::time::timeout(Duration::from_secs(30), manager.init(config))
        .await
        .expect("init must not hang on an unreachable server");
    let err = result.unwrap_err();
    assert!(matches!(err, OrmError::Connection { .. }), "got {:?}", err);
    assert!(
        err.suggestion().is_some_and(|s| s.contains("running")),
        "got {:?}",
        err.suggestion()
    );
    assert_eq!(manager.state().await, PoolState::Uninitialized);
}

#[tokio::test]
async fn test_init_connect_timeout_is_bounded() {
    // Non-routable address: the connect attempt stalls until the limit
    let manager = ConnectionManager::new();
    let config = PoolConfig::mysql("blog", "secret", "blog")
        .with_host("10.255.255.1")
        .with_connect_timeout(Duration::from_secs(1));

    let result = tokio::time::timeout(Duration::from_secs(30), manager.init(config))
        .await
        .expect("init must respect the connect timeout");
    assert!(matches!(result, Err(OrmError::Connection { .. })));
    assert_eq!(manager.state().await, PoolState::Uninitialized);
}
