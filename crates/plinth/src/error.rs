//! Error handling for Plinth
//!
//! This module defines the error infrastructure shared by the query proxy,
//! the repository contracts and the in-memory backend. It provides:
//! - `PlinthError` trait for consistent error handling across backends
//! - `QueryError` for everything that can go wrong while executing a query
//! - `StoreError` for repository and unit-of-work failures
//! - `ConfigError` for configuration loading and validation failures
//!
//! # Design Principles
//! - All errors implement Send + Sync for async compatibility
//! - Use thiserror for library errors, anyhow for application errors
//! - Sequence conditions (empty, more than one element) are typed errors,
//!   never panics

use thiserror::Error;

/// Base trait for all Plinth-specific errors
///
/// This trait ensures all Plinth errors are:
/// - Thread-safe (Send + Sync)
/// - Static lifetime (no borrowed data)
/// - Implement standard Error trait
///
/// Backend crates implement it for their own error types so they can be
/// used as the associated `Error` of [`Repository`](crate::Repository) and
/// [`UnitOfWork`](crate::UnitOfWork).
pub trait PlinthError: std::error::Error + Send + Sync + 'static {}

/// Errors raised while executing sequence operations
///
/// These surface from the globally installed
/// [`QueryExecutor`](crate::QueryExecutor) or from the typed forwarding
/// layer that decodes its results.
#[derive(Error, Debug)]
pub enum QueryError {
    /// No executor has been installed yet
    #[error("No query executor installed; call executor::initialize first")]
    NotInitialized,

    /// The operation was cancelled through its cancellation token
    #[error("Query was cancelled")]
    Cancelled,

    /// A first/single/min/max/average was asked of an empty sequence
    #[error("Sequence contains no elements")]
    NoElements,

    /// A single-element operation found more than one match
    #[error("Sequence contains more than one element")]
    MultipleElements,

    /// The backend received a source payload it did not create
    #[error("Queryable source is not a {expected}")]
    SourceMismatch { expected: &'static str },

    /// An erased sequence item had an unexpected type
    #[error("Sequence item is not a {expected}")]
    ItemMismatch { expected: &'static str },

    /// The backend returned a value of an unexpected type
    #[error("Backend returned a value that is not a {expected}")]
    ResultMismatch { expected: &'static str },

    /// The backend failed for reasons of its own
    #[error("Backend error: {source}")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl QueryError {
    /// Wrap a backend-specific failure
    pub fn backend<E>(source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Backend {
            source: source.into(),
        }
    }

    /// Helper for backends that failed to downcast their source payload
    pub fn source_mismatch<S>() -> Self {
        Self::SourceMismatch {
            expected: std::any::type_name::<S>(),
        }
    }

    /// Helper for erased callbacks that met an item of the wrong type
    pub fn item_mismatch<T>() -> Self {
        Self::ItemMismatch {
            expected: std::any::type_name::<T>(),
        }
    }
}

impl PlinthError for QueryError {}

/// Errors raised by repositories and units of work
#[derive(Error, Debug)]
pub enum StoreError {
    /// An add was committed for a key that is already present
    #[error("Entity with key {key} already exists")]
    DuplicateKey { key: String },

    /// An update was committed for a key that is not present
    #[error("No entity with key {key}")]
    MissingKey { key: String },

    /// A query run through the store failed
    #[error("Query failed: {source}")]
    Query {
        #[from]
        source: QueryError,
    },
}

impl PlinthError for StoreError {}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// Configuration parsing failed
    #[error("Failed to parse configuration: {details}")]
    ParseError { details: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for {key}: {value} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

impl PlinthError for ConfigError {}
