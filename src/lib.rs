//! Coach Forge Backend - Billing and Metrics Service
//!
//! This crate bridges the Coach Forge mobile app, Stripe, and Firestore:
//! checkout/portal/subscription endpoints, an idempotent Stripe webhook
//! receiver that reconciles purchase state, and dashboard metric aggregation.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
