//! Shared setup for integration tests: a temporary SQLite database with the
//! blog tables created and the blog models registered.

#![allow(dead_code)]

use blog_orm::config::PoolConfig;
use blog_orm::db::{ConnectionManager, QueryExecutor};
use blog_orm::models::register_all;
use tempfile::NamedTempFile;

pub const USERS_DDL: &str = "create table users (
    id varchar(50) primary key not null,
    name varchar(50),
    password varchar(50),
    email varchar(50),
    admin boolean,
    image varchar(500),
    created_at real
)";

pub const BLOGS_DDL: &str = "create table blogs (
    id varchar(50) primary key not null,
    user_id varchar(50),
    user_name varchar(50),
    user_image varchar(500),
    name varchar(50),
    summary varchar(200),
    content text,
    created_at real
)";

pub const COMMENTS_DDL: &str = "create table comments (
    id varchar(50) primary key not null,
    user_id varchar(50),
    user_name varchar(50),
    user_image varchar(500),
    blog_id varchar(50),
    content text,
    created_at real
)";

/// A live test database. The file is removed when this is dropped.
pub struct TestDb {
    pub executor: QueryExecutor,
    pub file: NamedTempFile,
}

impl TestDb {
    pub fn manager(&self) -> &ConnectionManager {
        self.executor.manager()
    }

    pub async fn close(self) {
        self.executor.manager().shutdown().await;
    }
}

pub fn sqlite_config(file: &NamedTempFile) -> PoolConfig {
    PoolConfig::sqlite(file.path().to_string_lossy().into_owned())
}

/// Create a database using `configure` to adjust the default SQLite config.
pub async fn setup_with(configure: impl FnOnce(PoolConfig) -> PoolConfig) -> TestDb {
    register_all().unwrap();

    let file = NamedTempFile::new().unwrap();
    let manager = ConnectionManager::new();
    manager
        .init(configure(sqlite_config(&file)))
        .await
        .unwrap();

    let executor = QueryExecutor::new(manager);
    for ddl in [USERS_DDL, BLOGS_DDL, COMMENTS_DDL] {
        executor.write(ddl, &[], true).await.unwrap();
    }

    TestDb { executor, file }
}

pub async fn setup() -> TestDb {
    setup_with(|config| config).await
}
