use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
    pub app_name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub mongo: MongoConfig,
}

impl AppConfig {
    /// Defaults, then the optional file at `path` (extension optional), then
    /// `MARKET__*` environment variables, e.g. `MARKET__MONGO__URI`.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("mongo.uri", "mongodb://localhost:27017")?
            .set_default("mongo.database", "market")?
            .set_default("mongo.collection", "products")?
            .set_default("mongo.app_name", "listing-market")?
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("MARKET").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
