//! Client for a listening recipient wallet's foreign API
//!
//! Recipients reachable over HTTP accept slates through JSON-RPC at
//! `/v2/foreign`. Before a slate is handed over the client asks which slate
//! versions the recipient understands.

use crate::config::RecipientConfig;
use crate::error::WalletResult;
use mwc_core::Currency;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Foreign API version this wallet speaks
pub const FOREIGN_API_VERSION: u64 = 2;

/// Slate version tag of armored slatepacks
pub const SLATEPACK_VERSION: &str = "SP";

const FOREIGN_API_PATH: &str = "v2/foreign";
const JSON_RPC_VERSION: &str = "2.0";

/// Hosts that advertise slatepack support they can't actually receive
const SLATEPACK_UNSUPPORTED_HOSTS: &[&str] = &["mwc.hotbit.io"];

/// Failures talking to a recipient wallet
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RecipientError {
    #[error("No response from recipient: {0}")]
    NoResponse(String),

    #[error("Invalid response from recipient: {0}")]
    UnsupportedResponse(String),
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Deserialize)]
struct VersionInfo {
    foreign_api_version: Value,
    supported_slate_versions: Value,
}

/// HTTP client for recipient wallets
#[derive(Clone)]
pub struct WalletApi {
    client: Client,
    timeout: Duration,
}

impl WalletApi {
    pub fn new(config: &RecipientConfig) -> WalletResult<Self> {
        let timeout = config.request_timeout();
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, timeout })
    }

    /// Slate versions the recipient at `url` accepts
    pub async fn supported_slate_versions(&self, url: &Url) -> Result<Vec<String>, RecipientError> {
        let result = self.call(url, "check_version", json!([])).await?;
        let info: VersionInfo = serde_json::from_value(result)
            .map_err(|e| RecipientError::UnsupportedResponse(e.to_string()))?;

        if api_version(&info.foreign_api_version) != Some(FOREIGN_API_VERSION) {
            return Err(RecipientError::UnsupportedResponse(format!(
                "unsupported foreign API version {}",
                info.foreign_api_version
            )));
        }
        let versions = info
            .supported_slate_versions
            .as_array()
            .and_then(|versions| {
                versions
                    .iter()
                    .map(|version| version.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
            })
            .ok_or_else(|| {
                RecipientError::UnsupportedResponse("invalid supported slate versions".to_string())
            })?;

        let versions = without_unsupported_versions(url, versions);
        debug!(recipient = %url, versions = ?versions, "recipient slate versions");
        Ok(versions)
    }

    /// Hands the sender's slate to the recipient and returns its response slate
    pub async fn receive_transaction(
        &self,
        currency: Currency,
        url: &Url,
        slate: Value,
    ) -> Result<Value, RecipientError> {
        self.call(url, "receive_tx", receive_params(currency, slate))
            .await
            .inspect_err(|failure| warn!(recipient = %url, error = %failure, "recipient did not receive the slate"))
    }

    async fn call(&self, url: &Url, method: &str, params: Value) -> Result<Value, RecipientError> {
        let endpoint = foreign_endpoint(url);
        let request = RpcRequest {
            jsonrpc: JSON_RPC_VERSION,
            id: 1,
            method,
            params,
        };

        let response = match tokio::time::timeout(
            self.timeout,
            self.client.post(endpoint).json(&request).send(),
        )
        .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(RecipientError::NoResponse(e.to_string())),
            Err(_) => return Err(RecipientError::NoResponse("request timed out".to_string())),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(RecipientError::UnsupportedResponse(format!("HTTP {}", status)));
        }
        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| RecipientError::UnsupportedResponse(e.to_string()))?;
        if let Some(error) = body.error {
            return Err(RecipientError::UnsupportedResponse(error.to_string()));
        }

        let mut result = body.result.ok_or_else(|| {
            RecipientError::UnsupportedResponse(format!("{} returned no result", method))
        })?;
        if let Value::Object(fields) = &mut result {
            if let Some(error) = fields.get("Err") {
                return Err(RecipientError::UnsupportedResponse(error.to_string()));
            }
            if let Some(ok) = fields.remove("Ok") {
                return Ok(ok);
            }
        }
        Ok(result)
    }
}

/// `receive_tx` parameters; Epic Cash listeners take an extra trailing argument
pub fn receive_params(currency: Currency, slate: Value) -> Value {
    match currency {
        Currency::EpicCash | Currency::EpicCashFloonet => json!([slate, null, null, null]),
        Currency::MimbleWimbleCoin
        | Currency::MimbleWimbleCoinFloonet
        | Currency::Grin
        | Currency::GrinTestnet => json!([slate, null, null]),
    }
}

/// Drops slate versions the host at `url` is known not to handle
pub fn without_unsupported_versions(url: &Url, versions: Vec<String>) -> Vec<String> {
    let host = url.host_str().unwrap_or_default();
    if SLATEPACK_UNSUPPORTED_HOSTS.contains(&host) {
        versions
            .into_iter()
            .filter(|version| version != SLATEPACK_VERSION)
            .collect()
    } else {
        versions
    }
}

fn foreign_endpoint(url: &Url) -> Url {
    if matches!(url.path(), "" | "/") {
        url.join(FOREIGN_API_PATH).unwrap_or_else(|_| url.clone())
    } else {
        url.clone()
    }
}

fn api_version(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.parse().ok(),
        _ => None,
    }
}
