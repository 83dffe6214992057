//! JSON-RPC over HTTP with ordered endpoint failover

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    #[error("HTTP request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("No result in RPC response")]
    EmptyResult,

    #[error("All RPC endpoints failed")]
    AllEndpointsFailed,
}

#[derive(Serialize)]
struct JsonRpcRequest<'a, T> {
    jsonrpc: &'static str,
    method: &'a str,
    params: T,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcErrorBody>,
}

#[derive(Deserialize)]
struct JsonRpcErrorBody {
    code: i64,
    message: String,
}

/// HTTP JSON-RPC client over a list of equivalent endpoints
#[derive(Debug, Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    endpoints: Vec<String>,
}

impl RpcClient {
    pub fn new(endpoints: Vec<String>) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RpcError::Client(e.to_string()))?;

        Ok(Self { http, endpoints })
    }

    /// `None` when no endpoints are configured
    pub fn optional(endpoints: &[String]) -> Result<Option<Self>, RpcError> {
        if endpoints.is_empty() {
            return Ok(None);
        }
        Self::new(endpoints.to_vec()).map(Some)
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Call `method` on each endpoint in order until one answers.
    ///
    /// An RPC-level error from a reachable node is returned immediately;
    /// only transport failures move on to the next endpoint.
    pub async fn call<P, R>(&self, method: &str, params: P) -> Result<R, RpcError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: 1,
        };

        for endpoint in &self.endpoints {
            match self.call_endpoint(endpoint, &request).await {
                Ok(result) => return Ok(result),
                Err(e @ RpcError::Transport { .. }) => {
                    tracing::warn!(endpoint = %endpoint, method = %method, error = %e, "RPC endpoint unavailable");
                }
                Err(e) => return Err(e),
            }
        }

        Err(RpcError::AllEndpointsFailed)
    }

    async fn call_endpoint<P, R>(
        &self,
        endpoint: &str,
        request: &JsonRpcRequest<'_, P>,
    ) -> Result<R, RpcError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let transport = |e: reqwest::Error| RpcError::Transport {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        };

        let response: JsonRpcResponse<R> = self
            .http
            .post(endpoint)
            .json(request)
            .send()
            .await
            .map_err(transport)?
            .json()
            .await
            .map_err(transport)?;

        if let Some(error) = response.error {
            return Err(RpcError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        response.result.ok_or(RpcError::EmptyResult)
    }
}
