//! HTTP service for the cement plant optimizer

pub mod api;
pub mod bootstrap;
pub mod config;
