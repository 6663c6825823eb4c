use sqlx::SqliteConnection;

#[derive(Debug, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

#[async_trait::async_trait]
pub trait UserProvider {
    async fn get_user_by_username(
        &mut self,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error>;

    async fn username_exists(&mut self, username: &str) -> Result<bool, sqlx::Error>;

    async fn insert_user(
        &mut self,
        username: &str,
        password_hash: &str,
    ) -> Result<(), sqlx::Error>;
}

#[async_trait::async_trait]
impl UserProvider for SqliteConnection {
    async fn get_user_by_username(
        &mut self,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
                SELECT
                    id, username, password_hash
                FROM
                    users
                WHERE
                    username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(self)
        .await
    }

    async fn username_exists(&mut self, username: &str) -> Result<bool, sqlx::Error> {
        Ok(self.get_user_by_username(username).await?.is_some())
    }

    async fn insert_user(
        &mut self,
        username: &str,
        password_hash: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
                INSERT INTO users (username, password_hash)
                VALUES (?, ?)
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .execute(self)
        .await?;

        Ok(())
    }
}

pub async fn ensure_schema(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL
            )
        "#,
    )
    .execute(conn)
    .await?;

    Ok(())
}

/// Creates the administrator record iff no user with that name exists yet,
/// so restarting the process never duplicates or overwrites it.
pub async fn seed_admin(
    conn: &mut SqliteConnection,
    username: &str,
    password: &str,
) -> Result<(), super::Error> {
    if conn.username_exists(username).await? {
        return Ok(());
    }

    let password_hash = crate::auth::hash_password(password)?;
    conn.insert_user(username, &password_hash).await?;
    tracing::info!("created administrator account {:?}", username);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn in_memory_connection() -> sqlx::pool::PoolConnection<sqlx::Sqlite> {
        let pool = crate::db::get_pool("sqlite::memory:")
            .await
            .expect("couldn't open in-memory database");
        let mut conn = pool.acquire().await.expect("couldn't acquire connection");
        ensure_schema(&mut conn).await.expect("couldn't create schema");
        conn
    }

    #[async_std::test]
    async fn unknown_username_is_absent() {
        let mut conn = in_memory_connection().await;

        let user = conn.get_user_by_username("nobody").await.unwrap();
        assert!(user.is_none());
        assert!(!conn.username_exists("nobody").await.unwrap());
    }

    #[async_std::test]
    async fn seeded_admin_round_trips() {
        let mut conn = in_memory_connection().await;

        seed_admin(&mut conn, "admin", "hunter2").await.unwrap();

        let user = conn.get_user_by_username("admin").await.unwrap().unwrap();
        assert_eq!(user.username, "admin");
        assert!(crate::auth::verify_password("hunter2", &user.password_hash).unwrap());
    }

    #[async_std::test]
    async fn seed_admin_is_idempotent() {
        let mut conn = in_memory_connection().await;

        seed_admin(&mut conn, "admin", "hunter2").await.unwrap();
        seed_admin(&mut conn, "admin", "changed-since").await.unwrap();

        // The original record wins; the second seed is a no-op.
        let user = conn.get_user_by_username("admin").await.unwrap().unwrap();
        assert!(crate::auth::verify_password("hunter2", &user.password_hash).unwrap());
        assert!(!crate::auth::verify_password("changed-since", &user.password_hash).unwrap());
    }
}
