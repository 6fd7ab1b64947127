/// Arbitrary-precision token amounts, carried as decimal strings.
pub mod balance;

/// Lockup account id derivation.
pub mod lockup;

/// Ledger facts about an account and how they combine into
/// [`account::AccountDetails`]. Pure computation, no I/O.
pub mod account;

/// Ledger query interface, plus a JSON-RPC implementation.
///
/// NOTE: the aggregator only depends on the trait, so tests and other
/// transports can supply their own client.
pub mod query;

/// Gathers ledger facts concurrently and builds account details.
pub mod aggregator;

/// TOML configuration with defaults and validation.
pub mod config;

/// `tracing` subscriber setup, human or JSON, written to stderr.
pub mod logging;

/// Batch front end used by the binary. Kept in the library so the
/// integration tests can run it against a fake ledger.
pub mod bin_utils;
