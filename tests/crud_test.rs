//! Integration tests for the CRUD facade against SQLite.

mod common;

use blog_orm::models::{Blog, User};
use blog_orm::{FindOptions, Limit, Model, OrmError, RowCountPolicy, Value};

fn user(id: &str, name: &str, created_at: f64) -> User {
    User::new()
        .with("id", id)
        .with("name", name)
        .with("password", "secret")
        .with("email", format!("{}@example.com", name.to_lowercase()))
        .with("image", "about:blank")
        .with("created_at", created_at)
}

#[tokio::test]
async fn test_save_then_find_round_trip() {
    let db = common::setup().await;
    let users = db.executor.table::<User>().unwrap();

    let mut u = User::new()
        .with("name", "Test01")
        .with("password", "1234567890")
        .with("email", "test01@example.com")
        .with("image", "about:blank");
    let affected = users.save(&mut u).await.unwrap();
    assert_eq!(affected, 1);

    let id = u.id().unwrap().to_string();
    let found = users.find(id.as_str()).await.unwrap().expect("saved user");
    assert_eq!(found.name(), Some("Test01"));
    for column in ["name", "password", "email", "image", "admin", "created_at"] {
        assert_eq!(found.get(column), u.get(column), "column {}", column);
    }

    db.close().await;
}

#[tokio::test]
async fn test_save_writes_defaults_back() {
    let db = common::setup().await;
    let users = db.executor.table::<User>().unwrap();

    let mut u = User::new().with("name", "Defaults");
    assert!(u.get("id").is_none());
    users.save(&mut u).await.unwrap();

    let id = u.id().expect("id default written back");
    assert_eq!(id.len(), 50);
    assert!(matches!(u.get("created_at"), Some(Value::Float(_))));
    assert_eq!(u.get("admin"), Some(&Value::Bool(false)));
    // No default declared: stays unset and is stored as NULL
    assert!(u.get("email").is_none());

    let found = users.find(id).await.unwrap().unwrap();
    assert_eq!(found.get("email"), Some(&Value::Null));
    assert_eq!(found.get("admin"), Some(&Value::Bool(false)));

    db.close().await;
}

#[tokio::test]
async fn test_explicit_value_is_not_replaced_by_default() {
    let db = common::setup().await;
    let users = db.executor.table::<User>().unwrap();

    let mut u = user("fixed-id", "Explicit", 42.5);
    users.save(&mut u).await.unwrap();
    assert_eq!(u.id(), Some("fixed-id"));
    assert_eq!(u.get("created_at"), Some(&Value::Float(42.5)));

    db.close().await;
}

#[tokio::test]
async fn test_find_missing_returns_none() {
    let db = common::setup().await;
    let users = db.executor.table::<User>().unwrap();

    assert!(users.find("does-not-exist").await.unwrap().is_none());

    db.close().await;
}

#[tokio::test]
async fn test_find_all_filter_order_limit() {
    let db = common::setup().await;
    let users = db.executor.table::<User>().unwrap();

    for (i, name) in ["Ann", "Bob", "Cat", "Dan"].iter().enumerate() {
        users
            .save(&mut user(&format!("u{}", i), name, i as f64))
            .await
            .unwrap();
    }

    let all = users.find_all(FindOptions::new()).await.unwrap();
    assert_eq!(all.len(), 4);

    let newest_first = users
        .find_all(FindOptions::new().order_by("`created_at` desc"))
        .await
        .unwrap();
    let names: Vec<_> = newest_first.iter().filter_map(|u| u.name()).collect();
    assert_eq!(names, vec!["Dan", "Cat", "Bob", "Ann"]);

    let page = users
        .find_all(
            FindOptions::new()
                .filter("`created_at` >= ?", vec![Value::Float(1.0)])
                .order_by("`created_at`")
                .limit((1, 2)),
        )
        .await
        .unwrap();
    let names: Vec<_> = page.iter().filter_map(|u| u.name()).collect();
    assert_eq!(names, vec!["Cat", "Dan"]);

    let none = users
        .find_all(FindOptions::new().filter("`name`=?", vec![Value::from("Zed")]))
        .await
        .unwrap();
    assert!(none.is_empty());

    db.close().await;
}

#[tokio::test]
async fn test_find_all_limit_from_slice() {
    let db = common::setup().await;
    let users = db.executor.table::<User>().unwrap();
    for i in 0..3 {
        users
            .save(&mut user(&format!("u{}", i), "Same", i as f64))
            .await
            .unwrap();
    }

    let limit = Limit::try_from(&[2][..]).unwrap();
    let rows = users
        .find_all(FindOptions::new().order_by("`id`").limit(limit))
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);

    assert!(matches!(
        Limit::try_from(&[1, 2, 3][..]),
        Err(OrmError::InvalidInput { .. })
    ));

    db.close().await;
}

#[tokio::test]
async fn test_count_distinguishes_no_row_from_zero() {
    let db = common::setup().await;
    let users = db.executor.table::<User>().unwrap();

    // Aggregate over an empty table still yields one row
    let n = users.count("count(`id`)", None, &[]).await.unwrap();
    assert_eq!(n, Some(Value::Int(0)));

    // A plain expression over no matching rows yields none
    let n = users
        .count("`id`", Some("`name`=?"), &[Value::from("nobody")])
        .await
        .unwrap();
    assert_eq!(n, None);

    users.save(&mut user("a", "Ann", 1.0)).await.unwrap();
    users.save(&mut user("b", "Bob", 2.0)).await.unwrap();
    let n = users
        .count("count(`id`)", Some("`created_at` > ?"), &[Value::Float(1.5)])
        .await
        .unwrap();
    assert_eq!(n, Some(Value::Int(1)));

    db.close().await;
}

#[tokio::test]
async fn test_update_changes_only_target_row() {
    let db = common::setup().await;
    let users = db.executor.table::<User>().unwrap();

    let mut ann = user("a", "Ann", 1.0);
    let mut bob = user("b", "Bob", 2.0);
    users.save(&mut ann).await.unwrap();
    users.save(&mut bob).await.unwrap();

    ann.set("name", "Anna").set("admin", true);
    assert_eq!(users.update(&ann).await.unwrap(), 1);

    let ann_row = users.find("a").await.unwrap().unwrap();
    assert_eq!(ann_row.name(), Some("Anna"));
    assert!(ann_row.is_admin());

    let bob_row = users.find("b").await.unwrap().unwrap();
    for (column, value) in bob.record().iter() {
        assert_eq!(bob_row.get(column), Some(value), "column {}", column);
    }

    db.close().await;
}

#[tokio::test]
async fn test_remove() {
    let db = common::setup().await;
    let blogs = db.executor.table::<Blog>().unwrap();

    let mut post = Blog::new()
        .with("user_id", "u1")
        .with("user_name", "Ann")
        .with("user_image", "about:blank")
        .with("name", "Hello")
        .with("summary", "First post")
        .with("content", "Lorem ipsum");
    blogs.save(&mut post).await.unwrap();
    let id = post.id().unwrap().to_string();

    assert_eq!(blogs.remove(&post).await.unwrap(), 1);
    assert!(blogs.find(id).await.unwrap().is_none());

    db.close().await;
}

#[tokio::test]
async fn test_lenient_policy_returns_row_count() {
    let db = common::setup().await;
    let users = db
        .executor
        .table::<User>()
        .unwrap()
        .with_policy(RowCountPolicy::Lenient);

    let ghost = user("ghost", "Ghost", 0.0);
    assert_eq!(users.update(&ghost).await.unwrap(), 0);
    assert_eq!(users.remove(&ghost).await.unwrap(), 0);

    db.close().await;
}

#[tokio::test]
async fn test_strict_policy_rejects_row_count_mismatch() {
    let db = common::setup().await;
    let users = db
        .executor
        .table::<User>()
        .unwrap()
        .with_policy(RowCountPolicy::Strict);

    let ghost = user("ghost", "Ghost", 0.0);
    let err = users.remove(&ghost).await.unwrap_err();
    assert!(matches!(err, OrmError::RowCount { affected: 0, .. }));

    let err = users.update(&ghost).await.unwrap_err();
    assert!(matches!(err, OrmError::RowCount { affected: 0, .. }));

    db.close().await;
}

#[tokio::test]
async fn test_duplicate_primary_key_is_statement_error() {
    let db = common::setup().await;
    // Lenient policy must not absorb constraint violations
    let users = db.executor.table::<User>().unwrap();

    users.save(&mut user("dup", "First", 1.0)).await.unwrap();
    let err = users
        .save(&mut user("dup", "Second", 2.0))
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Statement { .. }), "got {:?}", err);

    let kept = users.find("dup").await.unwrap().unwrap();
    assert_eq!(kept.name(), Some("First"));

    db.close().await;
}

#[tokio::test]
async fn test_unregistered_model_is_configuration_error() {
    blog_orm::model! {
        struct Orphan in "orphans" {
            id: blog_orm::Field::integer().primary_key(),
        }
    }

    let db = common::setup().await;
    let err = db.executor.table::<Orphan>().unwrap_err();
    assert!(matches!(err, OrmError::Configuration { .. }));

    db.close().await;
}
