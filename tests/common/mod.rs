use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};

/// A throwaway sqlite database with all migrations applied, for tests that
/// need real model/service behavior against a live connection.
pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory sqlite");
    Migrator::up(&db, None).await.expect("failed to run migrations");
    db
}
