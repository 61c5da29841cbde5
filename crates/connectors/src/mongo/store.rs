use crate::{error::AdapterError, mongo::collection::MongoCollection};
use mongodb::{Client, Database, bson::doc};
use tracing::{debug, info};

/// A connected MongoDB client bound to one database.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AdapterError> {
        info!(database, "Connecting to MongoDB");
        let client = Client::with_uri_str(uri).await?;
        Ok(Self::from_client(client, database))
    }

    pub fn from_client(client: Client, database: &str) -> Self {
        let db = client.database(database);
        MongoStore { client, db }
    }

    /// Round-trips a `ping` so connection problems surface before any job
    /// touches a collection.
    pub async fn ping(&self) -> Result<(), AdapterError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        debug!(database = %self.db.name(), "MongoDB ping ok");
        Ok(())
    }

    /// User collection names, sorted; `system.*` collections are skipped.
    pub async fn collection_names(&self) -> Result<Vec<String>, AdapterError> {
        let mut names = self.db.list_collection_names().await?;
        names.retain(|name| !name.starts_with("system."));
        names.sort();
        Ok(names)
    }

    pub fn collection(&self, name: &str) -> MongoCollection {
        MongoCollection::new(self.db.clone(), name)
    }

    pub fn database_name(&self) -> &str {
        self.db.name()
    }
}
