//! Blog domain models: users, blogs and comments.

use crate::error::OrmResult;
use crate::models::Value;
use crate::schema::{self, Field, Model};
use chrono::Utc;
use uuid::Uuid;

/// Generate a primary key: 15-digit millisecond timestamp, 32 hex digits of a
/// random uuid, then `000`. Keys sort by creation time.
pub fn next_id() -> String {
    format!(
        "{:015}{}000",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    )
}

/// Current Unix time in seconds, with fractional part.
pub fn now_timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

fn id_field() -> Field {
    Field::string()
        .ddl("varchar(50)")
        .primary_key()
        .default_with(|| Value::Text(next_id()))
}

fn created_at_field() -> Field {
    Field::float().default_with(|| Value::Float(now_timestamp()))
}

crate::model! {
    /// A registered reader or author.
    pub struct User in "users" {
        id: id_field(),
        name: Field::string().ddl("varchar(50)"),
        password: Field::string().ddl("varchar(50)"),
        email: Field::string().ddl("varchar(50)"),
        admin: Field::boolean().default_value(false),
        image: Field::string().ddl("varchar(500)"),
        created_at: created_at_field(),
    }
}

crate::model! {
    /// A blog post.
    pub struct Blog in "blogs" {
        id: id_field(),
        user_id: Field::string().ddl("varchar(50)"),
        user_name: Field::string().ddl("varchar(50)"),
        user_image: Field::string().ddl("varchar(500)"),
        name: Field::string().ddl("varchar(50)"),
        summary: Field::string().ddl("varchar(200)"),
        content: Field::text(),
        created_at: created_at_field(),
    }
}

crate::model! {
    /// A comment on a blog post.
    pub struct Comment in "comments" {
        id: id_field(),
        user_id: Field::string().ddl("varchar(50)"),
        user_name: Field::string().ddl("varchar(50)"),
        user_image: Field::string().ddl("varchar(500)"),
        blog_id: Field::string().ddl("varchar(50)"),
        content: Field::text(),
        created_at: created_at_field(),
    }
}

impl User {
    pub fn id(&self) -> Option<&str> {
        self.record().get_str("id")
    }

    pub fn name(&self) -> Option<&str> {
        self.record().get_str("name")
    }

    pub fn email(&self) -> Option<&str> {
        self.record().get_str("email")
    }

    pub fn is_admin(&self) -> bool {
        self.record().get_bool("admin").unwrap_or(false)
    }

    /// Replace the stored password with a mask, for output.
    pub fn mask_password(&mut self) {
        self.set("password", "******");
    }
}

impl Blog {
    pub fn id(&self) -> Option<&str> {
        self.record().get_str("id")
    }

    pub fn user_id(&self) -> Option<&str> {
        self.record().get_str("user_id")
    }

    pub fn name(&self) -> Option<&str> {
        self.record().get_str("name")
    }

    pub fn created_at(&self) -> Option<f64> {
        self.record().get_f64("created_at")
    }
}

impl Comment {
    pub fn id(&self) -> Option<&str> {
        self.record().get_str("id")
    }

    pub fn blog_id(&self) -> Option<&str> {
        self.record().get_str("blog_id")
    }

    pub fn content(&self) -> Option<&str> {
        self.record().get_str("content")
    }
}

/// Register the blog models. Safe to call more than once.
pub fn register_all() -> OrmResult<()> {
    schema::register::<User>()?;
    schema::register::<Blog>()?;
    schema::register::<Comment>()?;
    Ok(())
}
