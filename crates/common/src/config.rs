use std::str::FromStr;

use alloy::primitives::Address;
use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Primary RPC URL used to read the Vaults contract
    pub vaults_rpc_url: String,

    /// Fallback RPC URL, tried on alternate retry attempts
    pub vaults_rpc_fallback_url: Option<String>,

    /// Address of the remote Vaults contract
    pub vaults_contract_address: Address,

    /// Address of the safety pool contract; its routes answer 500 when unset
    pub safety_pool_contract_address: Option<Address>,

    /// Number of vaults requested per page while walking the list (default: 15)
    pub locator_page_size: u32,

    /// Retries for a read that failed at the transport level (default: 3)
    pub rpc_max_retries: u32,

    /// Linear backoff step between retries in milliseconds (default: 250)
    pub rpc_retry_backoff_ms: u64,

    /// Port the API server listens on (default: 3000)
    pub api_port: u16,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let contract = std::env::var("VAULTS_CONTRACT_ADDRESS").map_err(|_| {
            anyhow::anyhow!("VAULTS_CONTRACT_ADDRESS environment variable is required")
        })?;

        let locator_page_size: u32 = std::env::var("LOCATOR_PAGE_SIZE")
            .unwrap_or_else(|_| "15".to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("LOCATOR_PAGE_SIZE must be a valid u32"))?;
        if locator_page_size == 0 {
            anyhow::bail!("LOCATOR_PAGE_SIZE must be at least 1");
        }

        let safety_pool_contract_address = match std::env::var("SAFETY_POOL_CONTRACT_ADDRESS") {
            Ok(raw) if !raw.trim().is_empty() => Some(Address::from_str(raw.trim()).map_err(|e| {
                anyhow::anyhow!("SAFETY_POOL_CONTRACT_ADDRESS is not a valid address: {}", e)
            })?),
            _ => None,
        };

        Ok(Self {
            vaults_rpc_url: std::env::var("VAULTS_RPC_URL")
                .unwrap_or_else(|_| "http://localhost:8545".to_string()),
            vaults_rpc_fallback_url: std::env::var("VAULTS_RPC_FALLBACK_URL").ok(),
            vaults_contract_address: Address::from_str(contract.trim()).map_err(|e| {
                anyhow::anyhow!("VAULTS_CONTRACT_ADDRESS is not a valid address: {}", e)
            })?,
            safety_pool_contract_address,
            locator_page_size,
            rpc_max_retries: std::env::var("RPC_MAX_RETRIES")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RPC_MAX_RETRIES must be a valid u32"))?,
            rpc_retry_backoff_ms: std::env::var("RPC_RETRY_BACKOFF_MS")
                .unwrap_or_else(|_| "250".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RPC_RETRY_BACKOFF_MS must be a valid u64"))?,
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("API_PORT must be a valid u16"))?,
        })
    }

    /// All configured RPC endpoints, primary first.
    pub fn rpc_urls(&self) -> Vec<String> {
        let mut urls = vec![self.vaults_rpc_url.clone()];
        if let Some(fallback) = &self.vaults_rpc_fallback_url {
            urls.push(fallback.clone());
        }
        urls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(fallback: Option<&str>) -> AppConfig {
        AppConfig {
            vaults_rpc_url: "http://primary".to_string(),
            vaults_rpc_fallback_url: fallback.map(str::to_string),
            vaults_contract_address: Address::ZERO,
            safety_pool_contract_address: None,
            locator_page_size: 15,
            rpc_max_retries: 3,
            rpc_retry_backoff_ms: 250,
            api_port: 3000,
        }
    }

    #[test]
    fn test_rpc_urls_primary_only() {
        assert_eq!(config(None).rpc_urls(), vec!["http://primary".to_string()]);
    }

    #[test]
    fn test_rpc_urls_with_fallback() {
        let urls = config(Some("http://fallback")).rpc_urls();
        assert_eq!(urls, vec!["http://primary", "http://fallback"]);
    }
}
