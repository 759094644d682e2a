//! # Pantry Assistant
//!
//! Pantry, recipe and shopping-list tools over a remote document store.
//! Cooking a meal subtracts its ingredients from stock and re-orders staples
//! that run low; expired stock is swept out; purchases move back into stock.
//! The tools are served over JSON-RPC on stdio.

pub mod config;
pub mod cooking;
pub mod errors;
pub mod expiry;
pub mod inventory;
pub mod localization;
pub mod models;
pub mod notion;
pub mod recipe_synth;
pub mod recipes;
pub mod repository;
pub mod server;
pub mod shopping;
pub mod store;
pub mod tools;
pub mod transfer;
pub mod units;
