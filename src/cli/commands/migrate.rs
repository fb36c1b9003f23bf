use crate::config::AppConfig;
use crate::database::DatabaseManager;

pub async fn handle(config: AppConfig) -> anyhow::Result<()> {
    let database = DatabaseManager::connect_lazy(&config.database)?;

    database.health_check().await?;
    database.migrate().await?;
    database.close().await;

    println!("Migrations applied");
    Ok(())
}
