use mongodb::{options::ClientOptions, Client};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::database::mongo::MongoStore;
use crate::errors::Result;

pub async fn connect_store(config: &AppConfig) -> Result<MongoStore> {
    let mut options = ClientOptions::parse(&config.database_url).await?;
    options.app_name = Some("ly-fantasy".to_string());

    let client = Client::with_options(options)?;
    let db = client.database(&config.database_name);

    // Verify database exists by listing collections
    match db.list_collection_names().await {
        Ok(collections) => {
            info!("✅ Connected to database: {}", config.database_name);
            info!("📂 Collections found: {:?}", collections);

            if !collections.iter().any(|c| c == "legislators") {
                warn!("⚠️ 'legislators' collection not found; run a legislator sync first");
            }
        }
        Err(e) => {
            warn!("❌ Database '{}' may not exist or is inaccessible: {}", config.database_name, e);
        }
    }

    let store = MongoStore::new(client, db);
    if let Err(e) = store.ensure_indexes().await {
        warn!("Failed to ensure indexes: {}", e);
    }
    Ok(store)
}
