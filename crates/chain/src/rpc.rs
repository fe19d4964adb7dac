//! Endpoint rotation and retry policy shared by the contract clients.
//!
//! Transport failures are retried with linear backoff, rotating through the
//! configured endpoints (primary first). A revert is the contract's answer and
//! is returned on the first attempt.

use std::time::Duration;

use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::transports::RpcError;
use anyhow::Context;

use fxdao_engine::reader::ReaderError;

struct Endpoint {
    url: String,
    provider: DynProvider,
}

/// JSON-RPC endpoints plus the retry policy applied to every call.
pub struct RpcPool {
    endpoints: Vec<Endpoint>,
    max_retries: u32,
    backoff: Duration,
}

impl RpcPool {
    /// Providers for one or more RPC URLs. The first URL is the primary.
    /// No connection is made until the first call.
    pub fn connect(rpc_urls: &[String]) -> anyhow::Result<Self> {
        if rpc_urls.is_empty() {
            anyhow::bail!("At least one RPC URL is required");
        }

        let mut providers = Vec::with_capacity(rpc_urls.len());
        for url in rpc_urls {
            let parsed = url
                .parse()
                .with_context(|| format!("Invalid RPC URL: {}", url))?;
            let provider = ProviderBuilder::new().connect_http(parsed).erased();
            providers.push((url.clone(), provider));
        }

        Ok(Self::from_providers(providers))
    }

    pub(crate) fn from_providers(providers: Vec<(String, DynProvider)>) -> Self {
        Self {
            endpoints: providers
                .into_iter()
                .map(|(url, provider)| Endpoint { url, provider })
                .collect(),
            max_retries: 3,
            backoff: Duration::from_millis(250),
        }
    }

    pub fn with_retries(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.backoff = backoff;
        self
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Endpoint used for the given attempt (0-based).
    fn endpoint_for(&self, attempt: u32) -> &Endpoint {
        &self.endpoints[attempt as usize % self.endpoints.len()]
    }

    /// Delay before retrying after the given failed attempt (0-based).
    fn backoff_after(&self, attempt: u32) -> Duration {
        self.backoff * (attempt + 1)
    }

    /// Run a contract call with the retry policy.
    pub async fn call<T, F, Fut>(&self, method: &'static str, f: F) -> Result<T, ReaderError>
    where
        F: Fn(DynProvider) -> Fut,
        Fut: Future<Output = Result<T, alloy::contract::Error>>,
    {
        let attempts = self.max_retries + 1;
        let mut last_error = None;

        for attempt in 0..attempts {
            let endpoint = self.endpoint_for(attempt);

            match f(endpoint.provider.clone()).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    let err = classify(e);
                    if !matches!(err, ReaderError::Unavailable(_)) {
                        return Err(err);
                    }

                    tracing::warn!(
                        method,
                        endpoint = %endpoint.url,
                        attempt = attempt + 1,
                        attempts,
                        error = %err,
                        "RPC call failed"
                    );
                    last_error = Some(err);

                    if attempt + 1 < attempts {
                        tokio::time::sleep(self.backoff_after(attempt)).await;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| ReaderError::Unavailable(format!("{} was not attempted", method))))
    }
}

/// Map a contract call failure onto the reader taxonomy.
fn classify(err: alloy::contract::Error) -> ReaderError {
    match err {
        alloy::contract::Error::TransportError(RpcError::ErrorResp(payload)) => {
            ReaderError::Simulation(payload.message.to_string())
        }
        alloy::contract::Error::TransportError(e) => ReaderError::Unavailable(e.to_string()),
        other => ReaderError::Decode(other.to_string()),
    }
}
