//! Crop Advisor API Library
//!
//! Crop recommendation service: a classifier's per-crop probabilities are
//! normalized into suitability scores, ranked, enriched with market prices
//! and assembled into explained recommendations. Around that core sit soil
//! detection, weather, translation and a small farmer community store.
//!
//! # Modules
//!
//! - `api`: HTTP-facing handlers and routing.
//! - `core`: Recommendation pipeline (scoring, ranking, assembly, soil defaults).
//! - `integrations`: External service clients (prices, soil, weather, translation).
//! - `circuit_breaker`: Circuit breaker for the price service.
//! - `classifier`: Classifier trait and the Gaussian profile model.
//! - `config`: Configuration management.
//! - `db`: Database connection and schema bootstrap.
//! - `db_storage`: Community store (PostgreSQL and in-memory).
//! - `errors`: Error handling types.
//! - `models`: Request and response models.
//! - `services`: Recommendation pipeline service.
//! - `validation`: Request validation.

pub mod api;
pub mod core;
pub mod integrations;

pub mod circuit_breaker;
pub mod classifier;
pub mod community_handler;
pub mod config;
pub mod db;
pub mod db_storage;
pub mod errors;
pub mod handlers;
pub mod market_price;
pub mod models;
pub mod ranking;
pub mod recommendation;
pub mod routes;
pub mod scoring;
pub mod services;
pub mod soil;
pub mod soil_client;
pub mod translation;
pub mod validation;
pub mod weather_client;
