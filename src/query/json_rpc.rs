//! Ledger queries over the node's JSON-RPC 2.0 HTTP interface.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, trace};

use super::{LedgerQuery, QueryError};
use crate::{
    account::{AccountInfo, GenesisConfig},
    balance::Balance,
};

/// Every read is taken from finalized state.
const FINALITY: &str = "final";

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    cause: Option<ErrorCause>,
}

#[derive(Debug, Deserialize)]
struct ErrorCause {
    name: String,
}

/// `call_function` reply. Older nodes report contract failures inside a
/// successful response through `error`.
#[derive(Debug, Deserialize)]
struct CallFunctionResult {
    #[serde(default)]
    result: Option<Vec<u8>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawGenesisConfig {
    runtime_config: RawRuntimeConfig,
}

#[derive(Debug, Deserialize)]
struct RawRuntimeConfig {
    storage_amount_per_byte: Balance,
}

/// Node reads passed through verbatim, without interpreting the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRequest<'a> {
    ViewAccount {
        account_id: &'a str,
    },
    ViewAccessKeyList {
        account_id: &'a str,
    },
    /// Status of a transaction, looked up by hash and signer.
    Tx {
        tx_hash: &'a str,
        sender_account_id: &'a str,
    },
    FinalBlock,
    Status,
    /// Validators of the latest epoch.
    Validators,
}

impl NodeRequest<'_> {
    pub fn method(&self) -> &'static str {
        match self {
            Self::ViewAccount { .. } | Self::ViewAccessKeyList { .. } => "query",
            Self::Tx { .. } => "tx",
            Self::FinalBlock => "block",
            Self::Status => "status",
            Self::Validators => "validators",
        }
    }

    pub fn params(&self) -> Value {
        match *self {
            Self::ViewAccount { account_id } => json!({
                "request_type": "view_account",
                "finality": FINALITY,
                "account_id": account_id,
            }),
            Self::ViewAccessKeyList { account_id } => json!({
                "request_type": "view_access_key_list",
                "finality": FINALITY,
                "account_id": account_id,
            }),
            Self::Tx {
                tx_hash,
                sender_account_id,
            } => json!([tx_hash, sender_account_id]),
            Self::FinalBlock => json!({ "finality": FINALITY }),
            Self::Status => json!([]),
            Self::Validators => json!([null]),
        }
    }
}

/// HTTP JSON-RPC client for a ledger node.
///
/// Holds a reusable connection pool; every request is bounded by the timeout
/// given at construction.
pub struct JsonRpcLedgerClient {
    http_client: reqwest::Client,
    rpc_url: String,
    next_id: AtomicU64,
}

impl JsonRpcLedgerClient {
    pub fn new(
        rpc_url: impl Into<String>,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, QueryError> {
        let http_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| QueryError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http_client,
            rpc_url: rpc_url.into(),
            next_id: AtomicU64::new(0),
        })
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Sends a raw JSON-RPC request and returns its `result`.
    pub async fn send_json_rpc(&self, method: &str, params: Value) -> Result<Value, QueryError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id.to_string(),
            "method": method,
            "params": params,
        });
        trace!(id, method, "sending JSON-RPC request");

        let response = self
            .http_client
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(method, e))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(method, e))?;
        debug!(id, method, %status, len = bytes.len(), "JSON-RPC response received");

        match serde_json::from_slice::<JsonRpcResponse>(&bytes) {
            Ok(response) => into_result(response),
            Err(_) if !status.is_success() => {
                Err(QueryError::Transport(format!("HTTP status {status}")))
            }
            Err(e) => Err(QueryError::InvalidResponse(format!(
                "failed to parse `{method}` response: {e}"
            ))),
        }
    }

    /// The node's reply to `request`, exactly as it was returned.
    pub async fn send(&self, request: NodeRequest<'_>) -> Result<Value, QueryError> {
        self.send_json_rpc(request.method(), request.params()).await
    }
}

fn transport_error(method: &str, e: reqwest::Error) -> QueryError {
    if e.is_timeout() {
        QueryError::Timeout {
            method: method.to_owned(),
        }
    } else if e.is_connect() {
        QueryError::Transport(format!("connection failed: {e}"))
    } else {
        QueryError::Transport(e.to_string())
    }
}

fn into_result(response: JsonRpcResponse) -> Result<Value, QueryError> {
    if let Some(error) = response.error {
        // the node puts the specific reason into `data`
        let message = match &error.data {
            Some(Value::String(data)) => format!("{}: {data}", error.message),
            Some(data) => format!("{}: {data}", error.message),
            None => error.message.clone(),
        };
        let cause = error.cause.as_ref().map(|cause| cause.name.as_str());
        return Err(QueryError::from_node_error(cause, &message));
    }
    response
        .result
        .ok_or_else(|| QueryError::InvalidResponse("neither result nor error present".to_owned()))
}

fn decode_call_function(value: Value) -> Result<Value, QueryError> {
    let call: CallFunctionResult = serde_json::from_value(value)
        .map_err(|e| QueryError::InvalidResponse(format!("malformed call_function result: {e}")))?;
    if let Some(error) = call.error {
        return Err(QueryError::from_node_error(None, &error));
    }
    let bytes = call.result.ok_or_else(|| {
        QueryError::InvalidResponse("call_function result carries no bytes".to_owned())
    })?;
    serde_json::from_slice(&bytes)
        .map_err(|e| QueryError::InvalidResponse(format!("view method returned non-JSON: {e}")))
}

#[async_trait]
impl LedgerQuery for JsonRpcLedgerClient {
    async fn view_account(&self, account_id: &str) -> Result<AccountInfo, QueryError> {
        let value = self.send(NodeRequest::ViewAccount { account_id }).await?;
        serde_json::from_value(value)
            .map_err(|e| QueryError::InvalidResponse(format!("malformed account view: {e}")))
    }

    async fn call_view_method(
        &self,
        contract_id: &str,
        method_name: &str,
        args: Value,
    ) -> Result<Value, QueryError> {
        let args = serde_json::to_vec(&args)
            .map_err(|e| QueryError::InvalidResponse(format!("unencodable arguments: {e}")))?;
        let value = self
            .send_json_rpc(
                "query",
                json!({
                    "request_type": "call_function",
                    "finality": FINALITY,
                    "account_id": contract_id,
                    "method_name": method_name,
                    "args_base64": STANDARD.encode(args),
                }),
            )
            .await?;
        decode_call_function(value)
    }

    async fn genesis_config(&self) -> Result<GenesisConfig, QueryError> {
        let value = self
            .send_json_rpc("EXPERIMENTAL_genesis_config", json!({}))
            .await?;
        let raw: RawGenesisConfig = serde_json::from_value(value)
            .map_err(|e| QueryError::InvalidResponse(format!("malformed genesis config: {e}")))?;
        Ok(GenesisConfig {
            storage_amount_per_byte: raw.runtime_config.storage_amount_per_byte,
        })
    }
}
