use crate::entities::{activities, medication_reminders, medications, prescriptions};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema, Statement};
use std::env;
use std::time::Duration;
use tracing::info;

pub async fn setup_database() -> anyhow::Result<DatabaseConnection> {
    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    info!("📂 Database: {}", db_url);

    let mut opt = ConnectOptions::new(&db_url);
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db = Database::connect(opt).await?;

    info!("✅ Database connected successfully");

    run_migrations(&db).await?;

    Ok(db)
}

pub async fn run_migrations(db: &DatabaseConnection) -> anyhow::Result<()> {
    info!("🔄 Running schema migrations...");

    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let stmts = vec![
        schema
            .create_table_from_entity(medications::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(prescriptions::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(medication_reminders::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(activities::Entity)
            .if_not_exists()
            .to_owned(),
    ];

    for stmt in stmts {
        let stmt = builder.build(&stmt);
        db.execute(stmt).await?;
    }

    // Query-path indexes, mirroring the access patterns of the handlers.
    let indexes = [
        r#"CREATE INDEX IF NOT EXISTS idx_activities_user_timestamp ON activities("user", timestamp DESC);"#,
        r#"CREATE INDEX IF NOT EXISTS idx_reminders_user_scheduled ON medication_reminders("user", scheduled_time);"#,
        r#"CREATE INDEX IF NOT EXISTS idx_reminders_medication ON medication_reminders(medication);"#,
        r#"CREATE INDEX IF NOT EXISTS idx_reminders_status ON medication_reminders(status);"#,
        r#"CREATE INDEX IF NOT EXISTS idx_medications_user ON medications("user");"#,
        r#"CREATE INDEX IF NOT EXISTS idx_prescriptions_user ON prescriptions("user");"#,
    ];
    for idx in indexes {
        db.execute(Statement::from_string(builder, idx.to_string()))
            .await?;
    }

    info!("✅ Migrations complete");
    Ok(())
}
