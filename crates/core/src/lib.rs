//! Core types and shared functionality for shopedge.
//!
//! This crate provides:
//! - Layered configuration and exclusion rules
//! - Unified error types
//! - Request classification and the cacheability cookie decision
//! - Change tags, the catalog collaborator and URL resolution for purges

pub mod catalog;
pub mod classifier;
pub mod config;
pub mod decision;
pub mod error;
pub mod request;
pub mod resolver;
pub mod tags;

pub use catalog::{Catalog, MemoryCatalog};
pub use classifier::{Classifier, ExclusionRules};
pub use config::{AppConfig, ConfigError};
pub use decision::{CacheCookies, CacheDirective, CacheabilityHook, Flag, decide};
pub use error::Error;
pub use request::{RequestContext, RequestSnapshot, RouteNames, RouteResolver, SessionState};
pub use resolver::UrlResolver;
pub use tags::{ChangeTag, TagKind};
