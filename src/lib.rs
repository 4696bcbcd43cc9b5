//! Store Ratings API Library
//!
//! This library provides the core functionality for the store-ratings
//! service: domain rules, application services, persistence adapters, the
//! HTTP layer, and a client for the HTTP API.

pub mod api;
pub mod application;
pub mod auth;
pub mod client;
pub mod config;
pub mod domain;
pub mod infrastructure;
