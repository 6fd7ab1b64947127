use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::account::{AccountInfo, GenesisConfig};

pub mod json_rpc;

/// Structured error causes the node reports for missing accounts or contracts.
const NOT_FOUND_CAUSES: &[&str] = &["UNKNOWN_ACCOUNT", "NO_CONTRACT_CODE"];

/// Fallback for nodes that only report a human-readable message.
const NOT_FOUND_MARKERS: &[&str] = &["doesn't exist", "does not exist", "MethodNotFound"];

#[derive(Debug, Clone, Error)]
pub enum QueryError {
    #[error("Not found: {reason}")]
    NotFound { reason: String },
    #[error("`{method}` timed out")]
    Timeout { method: String },
    #[error("Transport failure: {0}")]
    Transport(String),
    #[error("Node returned {name}: {message}")]
    Rpc { name: String, message: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl QueryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Classifies an error reported by the node.
    ///
    /// The structured cause name is checked first; message matching only
    /// covers nodes that omit it.
    pub fn from_node_error(cause: Option<&str>, message: &str) -> Self {
        let not_found = cause.is_some_and(|name| NOT_FOUND_CAUSES.contains(&name))
            || NOT_FOUND_MARKERS
                .iter()
                .any(|marker| message.contains(marker));
        if not_found {
            Self::NotFound {
                reason: message.to_owned(),
            }
        } else {
            Self::Rpc {
                name: cause.unwrap_or("UNKNOWN_ERROR").to_owned(),
                message: message.to_owned(),
            }
        }
    }
}

/// Turns a not-found failure into an absent value.
pub trait AbsentIfNotFound<T> {
    fn absent_if_not_found(self) -> Result<Option<T>, QueryError>;
}

impl<T> AbsentIfNotFound<T> for Result<T, QueryError> {
    fn absent_if_not_found(self) -> Result<Option<T>, QueryError> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// Read-only access to ledger state.
///
/// Implementations must be safe to call concurrently; a single request fans
/// out several calls at once.
#[async_trait]
pub trait LedgerQuery: Send + Sync {
    async fn view_account(&self, account_id: &str) -> Result<AccountInfo, QueryError>;

    async fn call_view_method(
        &self,
        contract_id: &str,
        method_name: &str,
        args: Value,
    ) -> Result<Value, QueryError>;

    async fn genesis_config(&self) -> Result<GenesisConfig, QueryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_cause_wins() {
        let err = QueryError::from_node_error(Some("UNKNOWN_ACCOUNT"), "Server error");
        assert!(err.is_not_found());
        let err = QueryError::from_node_error(Some("NO_CONTRACT_CODE"), "Server error");
        assert!(err.is_not_found());
    }

    #[test]
    fn message_fallback() {
        for message in [
            "account alice.near does not exist while viewing",
            "Account ID alice.near doesn't exist",
            "wasm execution failed with error: FunctionCallError(MethodResolveError(MethodNotFound))",
        ] {
            assert!(QueryError::from_node_error(None, message).is_not_found());
        }
    }

    #[test]
    fn other_errors_stay_fatal() {
        let err = QueryError::from_node_error(Some("UNAVAILABLE_SHARD"), "shard is not tracked");
        assert!(matches!(
            &err,
            QueryError::Rpc { name, .. } if name == "UNAVAILABLE_SHARD"
        ));
        assert_eq!(err.to_string(), "Node returned UNAVAILABLE_SHARD: shard is not tracked");

        let err = QueryError::from_node_error(None, "Server error");
        assert!(matches!(&err, QueryError::Rpc { name, .. } if name == "UNKNOWN_ERROR"));
    }

    #[test]
    fn absent_if_not_found() {
        let found: Result<u8, QueryError> = Ok(1);
        assert_eq!(found.absent_if_not_found().unwrap(), Some(1));

        let missing: Result<u8, QueryError> = Err(QueryError::NotFound {
            reason: "gone".to_owned(),
        });
        assert_eq!(missing.absent_if_not_found().unwrap(), None);

        let timeout: Result<u8, QueryError> = Err(QueryError::Timeout {
            method: "query".to_owned(),
        });
        assert!(matches!(
            timeout.absent_if_not_found(),
            Err(QueryError::Timeout { .. })
        ));
    }
}
