//! Client/server request and response envelopes.

use crate::wire::Transaction;

/// Server module a stats request targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ModuleId {
    /// The server frontend.
    Server = 0,
    /// The transaction forwarder.
    Forwarder = 1,
    /// The batch sequencer.
    Sequencer = 2,
    /// The lock scheduler.
    Scheduler = 3,
}

/// Submit a transaction for execution.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxnRequest {
    /// The transaction to execute.
    #[prost(message, optional, tag = "1")]
    pub txn: Option<Transaction>,
}

/// Ask a server module for its stats blob.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StatsRequest {
    /// Target module.
    #[prost(enumeration = "ModuleId", tag = "1")]
    pub module: i32,
    /// Verbosity level.
    #[prost(uint64, tag = "2")]
    pub level: u64,
}

/// Flush metrics whose names start with `prefix`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MetricsRequest {
    /// Metric name prefix.
    #[prost(string, tag = "1")]
    pub prefix: String,
}

/// A request from the client to the server.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Request {
    /// The request payload.
    #[prost(oneof = "request::Type", tags = "1, 2, 3")]
    pub r#type: Option<request::Type>,
}

/// Request payload variants.
pub mod request {
    use super::{MetricsRequest, StatsRequest, TxnRequest};

    /// The payload of a [`super::Request`].
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Type {
        /// Transaction submission.
        #[prost(message, tag = "1")]
        Txn(TxnRequest),
        /// Stats query.
        #[prost(message, tag = "2")]
        Stats(StatsRequest),
        /// Metrics flush.
        #[prost(message, tag = "3")]
        Metrics(MetricsRequest),
    }
}

impl Request {
    /// Wraps a transaction into a submission request.
    #[must_use]
    pub fn txn(txn: Transaction) -> Self {
        Self {
            r#type: Some(request::Type::Txn(TxnRequest { txn: Some(txn) })),
        }
    }

    /// Builds a stats request.
    #[must_use]
    pub fn stats(module: ModuleId, level: u64) -> Self {
        Self {
            r#type: Some(request::Type::Stats(StatsRequest {
                module: module as i32,
                level,
            })),
        }
    }

    /// Builds a metrics-flush request.
    #[must_use]
    pub fn metrics(prefix: impl Into<String>) -> Self {
        Self {
            r#type: Some(request::Type::Metrics(MetricsRequest {
                prefix: prefix.into(),
            })),
        }
    }
}

/// The executed transaction sent back to the client.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxnResponse {
    /// The transaction with status, abort reason, values, and events.
    #[prost(message, optional, tag = "1")]
    pub txn: Option<Transaction>,
}

/// Stats blob for one module.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StatsResponse {
    /// JSON-encoded stats.
    #[prost(string, tag = "1")]
    pub stats_json: String,
}

/// Acknowledgement of a metrics flush.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MetricsResponse {}

/// A response from the server to the client.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Response {
    /// The response payload.
    #[prost(oneof = "response::Type", tags = "1, 2, 3")]
    pub r#type: Option<response::Type>,
}

/// Response payload variants.
pub mod response {
    use super::{MetricsResponse, StatsResponse, TxnResponse};

    /// The payload of a [`super::Response`].
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Type {
        /// Executed transaction.
        #[prost(message, tag = "1")]
        Txn(TxnResponse),
        /// Stats blob.
        #[prost(message, tag = "2")]
        Stats(StatsResponse),
        /// Metrics acknowledgement.
        #[prost(message, tag = "3")]
        Metrics(MetricsResponse),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_request_round_trip() {
        let req = Request::stats(ModuleId::Scheduler, 2);
        let decoded = Request::decode(req.encode_to_vec().as_slice()).unwrap();
        match decoded.r#type {
            Some(request::Type::Stats(s)) => {
                assert_eq!(s.module, ModuleId::Scheduler as i32);
                assert_eq!(s.level, 2);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }
}
