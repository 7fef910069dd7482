// src/config/credentials.rs
//! Secrets and endpoints read from the environment at startup.
//! Minting OAuth tokens is left to the host (e.g. `gcloud auth print-access-token`).

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

pub const ENV_YOUTUBE_API_KEY: &str = "YOUTUBE_API_KEY";
pub const ENV_YOUTUBE_API_BASE: &str = "YOUTUBE_API_BASE";
pub const ENV_SERVICE_ACCOUNT: &str = "FIREBASE_SERVICE_ACCOUNT";
pub const ENV_PROJECT_ID: &str = "FIRESTORE_PROJECT_ID";
pub const ENV_ACCESS_TOKEN: &str = "FIRESTORE_ACCESS_TOKEN";
pub const ENV_EMULATOR_HOST: &str = "FIRESTORE_EMULATOR_HOST";
pub const ENV_STORE: &str = "INGEST_STORE";

pub const DEFAULT_YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, Clone)]
pub struct YouTubeCredentials {
    pub api_key: String,
    pub api_base: String,
}

impl YouTubeCredentials {
    pub fn from_env() -> Result<Self> {
        let api_key = non_empty_env(ENV_YOUTUBE_API_KEY)
            .ok_or_else(|| anyhow!("Missing {ENV_YOUTUBE_API_KEY} env var"))?;
        let api_base = non_empty_env(ENV_YOUTUBE_API_BASE)
            .unwrap_or_else(|| DEFAULT_YOUTUBE_API_BASE.to_string());
        Ok(Self {
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirestoreSettings {
    pub project_id: String,
    pub access_token: Option<String>,
    /// `host:port` of a local emulator; plain HTTP, no auth.
    pub emulator_host: Option<String>,
}

impl FirestoreSettings {
    pub fn from_env() -> Result<Self> {
        let project_id = match non_empty_env(ENV_PROJECT_ID) {
            Some(p) => p,
            None => {
                let raw = non_empty_env(ENV_SERVICE_ACCOUNT).ok_or_else(|| {
                    anyhow!("Missing {ENV_SERVICE_ACCOUNT} (or {ENV_PROJECT_ID}) env var")
                })?;
                project_id_from_service_account(&raw)?
            }
        };
        let emulator_host = non_empty_env(ENV_EMULATOR_HOST);
        let access_token = non_empty_env(ENV_ACCESS_TOKEN);
        if emulator_host.is_none() && access_token.is_none() {
            return Err(anyhow!(
                "Missing {ENV_ACCESS_TOKEN} env var (required unless {ENV_EMULATOR_HOST} is set)"
            ));
        }
        Ok(Self {
            project_id,
            access_token,
            emulator_host,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore(FirestoreSettings),
    /// In-process store; nothing survives the run. Useful for dry runs.
    Memory,
}

impl StoreBackend {
    pub fn from_env() -> Result<Self> {
        match non_empty_env(ENV_STORE).map(|s| s.to_ascii_lowercase()).as_deref() {
            Some("memory") => Ok(StoreBackend::Memory),
            None | Some("firestore") => Ok(StoreBackend::Firestore(FirestoreSettings::from_env()?)),
            Some(other) => Err(anyhow!("Unsupported {ENV_STORE} value: {other}")),
        }
    }
}

pub fn project_id_from_service_account(raw_json: &str) -> Result<String> {
    #[derive(Deserialize)]
    struct ServiceAccount {
        project_id: Option<String>,
    }
    let sa: ServiceAccount =
        serde_json::from_str(raw_json).context("parsing service account JSON")?;
    sa.project_id
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| anyhow!("service account JSON has no project_id"))
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
