//! Integration tests for UTF-8 text in blog content.

mod common;

use blog_orm::config::PoolConfig;
use blog_orm::db::{ConnectionManager, QueryExecutor};
use blog_orm::models::{Blog, register_all};
use blog_orm::{FindOptions, Model, Value};

fn chinese_blog() -> Blog {
    Blog::new()
        .with("user_id", "u1")
        .with("user_name", "张三")
        .with("user_image", "about:blank")
        .with("name", "中文标题")
        .with("summary", "摘要：测试中文字符 🚀")
        .with("content", "正文内容，包含标点符号。还有“引号”和 emoji 😀")
}

#[tokio::test]
async fn test_sqlite_utf8_round_trip() {
    let db = common::setup().await;
    let blogs = db.executor.table::<Blog>().unwrap();

    let mut post = chinese_blog();
    blogs.save(&mut post).await.unwrap();

    let found = blogs.find(post.id().unwrap()).await.unwrap().unwrap();
    assert_eq!(found.name(), Some("中文标题"));
    assert_eq!(
        found.record().get_str("content"),
        Some("正文内容，包含标点符号。还有“引号”和 emoji 😀")
    );

    let by_author = blogs
        .find_all(FindOptions::new().filter("`user_name`=?", vec![Value::from("张三")]))
        .await
        .unwrap();
    assert_eq!(by_author.len(), 1);

    db.close().await;
}

/// Set TEST_MYSQL_URL with charset=utf8mb4 to run.
#[tokio::test]
async fn test_mysql_utf8_round_trip() {
    let mysql_url = match std::env::var("TEST_MYSQL_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: TEST_MYSQL_URL not set");
            return;
        }
    };

    register_all().unwrap();
    let manager = ConnectionManager::new();
    manager
        .init(PoolConfig::from_url(&mysql_url).unwrap().with_charset("utf8mb4"))
        .await
        .unwrap();
    let executor = QueryExecutor::new(manager.clone());

    executor
        .write(
            "create table if not exists `blogs` (
                `id` varchar(50) not null primary key,
                `user_id` varchar(50),
                `user_name` varchar(50),
                `user_image` varchar(500),
                `name` varchar(50),
                `summary` varchar(200),
                `content` mediumtext,
                `created_at` real
            ) default charset=utf8mb4",
            &[],
            true,
        )
        .await
        .unwrap();

    let blogs = executor.table::<Blog>().unwrap();
    let mut post = chinese_blog();
    blogs.save(&mut post).await.unwrap();

    let found = blogs.find(post.id().unwrap()).await.unwrap().unwrap();
    assert_eq!(found.name(), Some("中文标题"));
    assert_eq!(found.record().get_str("summary"), Some("摘要：测试中文字符 🚀"));

    blogs.remove(&found).await.unwrap();
    manager.shutdown().await;
}
