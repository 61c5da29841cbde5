#![allow(dead_code)]

use connectors::mongo::MongoStore;
use std::env;

pub mod engine;
pub mod integration;
pub mod utils;

/// Connection string for the MongoDB-backed tests (ignored by default).
const TEST_MONGO_URL_KEY: &str = "DOCCOPY_TEST_MONGO_URL";
const DEFAULT_TEST_MONGO_URL: &str = "mongodb://localhost:27017";

fn mongo_url() -> String {
    env::var(TEST_MONGO_URL_KEY).unwrap_or_else(|_| DEFAULT_TEST_MONGO_URL.to_string())
}

async fn mongo_store(database: &str) -> MongoStore {
    let store = MongoStore::connect(&mongo_url(), database)
        .await
        .expect("connect mongodb");
    store.ping().await.expect("ping mongodb");
    store
}
