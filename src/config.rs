use anyhow::Result;
use common::SchoolInfo;
use ledger::{FileStorage, LocalFileStorage, TemplateRenderer, TextReceiptRenderer};
use rust_decimal::Decimal;
use sea_orm::Database;
use serde::Deserialize;
use std::sync::Arc;

use crate::schemas::AppState;

/// Application settings, resolved once at startup.
///
/// Read from an optional `configuration.{toml,yaml}` file and then from
/// `APP_`-prefixed environment variables, e.g. `APP_SCHOOL__NAME`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub school: SchoolSettings,
    #[serde(default)]
    pub fees: FeeSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub database_url: String,
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://school-ledger.db?mode=rwc".to_string(),
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchoolSettings {
    pub name: String,
    pub address: String,
    pub logo: String,
    pub phone: String,
    pub email: String,
}

impl Default for SchoolSettings {
    fn default() -> Self {
        Self {
            name: "Mousumi Biddyaniketan".to_string(),
            address: "Ukilpara, Naogaon".to_string(),
            logo: "/logo.png".to_string(),
            phone: "+880-XXX-XXXXXX".to_string(),
            email: "mbnbd@gmail.com".to_string(),
        }
    }
}

impl From<SchoolSettings> for SchoolInfo {
    fn from(s: SchoolSettings) -> Self {
        SchoolInfo {
            name: s.name,
            address: s.address,
            logo: s.logo,
            phone: s.phone,
            email: s.email,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeeSettings {
    pub default_monthly_fee: Decimal,
}

impl Default for FeeSettings {
    fn default() -> Self {
        Self {
            default_monthly_fee: ledger::default_monthly_fee(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Root directory for uploaded payment proofs
    pub root: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root: "storage".to_string(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_environment(Self::environment())
    }

    /// `APP_SCHOOL__NAME` sets `school.name`.
    fn environment() -> config::Environment {
        config::Environment::with_prefix("APP")
            .prefix_separator("_")
            .separator("__")
    }

    fn from_environment(environment: config::Environment) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("configuration").required(false))
            .add_source(environment)
            .build()?
            .try_deserialize::<Settings>()?;

        if settings.fees.default_monthly_fee <= Decimal::ZERO {
            anyhow::bail!(
                "fees.default_monthly_fee must be positive, got {}",
                settings.fees.default_monthly_fee
            );
        }
        Ok(settings)
    }
}

/// Connect to the database and build the application state
pub async fn initialize_app_state_with_url(database_url: &str, settings: &Settings) -> Result<AppState> {
    tracing::info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;

    tracing::info!("Storing payment proofs under {}", settings.storage.root);
    let storage: Arc<dyn FileStorage> = Arc::new(LocalFileStorage::new(&settings.storage.root).await?);
    let renderer: Arc<dyn TemplateRenderer> = Arc::new(TextReceiptRenderer);

    Ok(AppState::new(
        db,
        storage,
        renderer,
        settings.school.clone().into(),
        settings.fees.default_monthly_fee,
    ))
}
