//! FiberDesk - Self-service portal for a broadband provider
//!
//! This library provides the core functionality for the FiberDesk API,
//! including database operations, session authentication, usage analytics,
//! plan recommendations and the HTTP handlers.

pub mod achievements;
pub mod chatbot;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod extractors;
pub mod forecast;
pub mod handlers;
pub mod id;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod rate_limit;
pub mod recommend;
pub mod util;
