//! Readvault - Subscription Paywall Backend
//!
//! Confirms payments through cryptographically authenticated processor
//! notifications and gates delivery of protected resources behind an
//! ordered authorization pipeline.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
