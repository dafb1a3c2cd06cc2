//! SSO core service.
//!
//! Implements login, registration, token refresh and logout over gRPC with
//! per-client HS256 JWT issuance, refresh-token-backed sessions and an
//! asynchronous Kafka fan-out of registration events.
//!
//! Architecture:
//! - `domain`: the pure Auth aggregate; transitions tag entities with a data
//!   status (`ToCreate`/`ToUpdate`/`ToRemove`) instead of touching storage
//! - `db`: storage port + SQLite implementation
//! - `repo`: coarse per-use-case snapshot loads and the status-driven save pass
//! - `usecase`: one orchestrator per operation
//! - `kafka`: async producer and topic-hashed fan-out workers
//! - `grpc`: tonic facade translating wire requests and mapping errors

pub mod config;
pub mod db;
pub mod domain;
pub mod dto;
pub mod error;
pub mod grpc;
pub mod kafka;
pub mod repo;
pub mod usecase;

pub use error::{Result, SsoError};

// gRPC generated code
pub mod proto {
    pub mod v1 {
        tonic::include_proto!("sso.v1");
    }
    pub use v1::*;
}
