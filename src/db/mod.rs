use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use thiserror::Error;

pub mod users;

#[derive(Error, Debug)]
pub enum Error {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("password hashing error: {0}")]
    PasswordHash(#[from] crate::auth::AuthError),
}

pub async fn get_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections((num_cpus::get_physical() * 2) as u32)
        .acquire_timeout(Duration::from_secs(2))
        .connect_with(options)
        .await
}
