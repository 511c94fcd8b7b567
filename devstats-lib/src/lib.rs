#![doc(hidden)]

//! Core library for devstats
//!
//! devstats is a small HTTP service reporting how much a developer shipped today:
//! the number of commits GitHub attributes to them and the coding time WakaTime
//! recorded, plus an Open-Graph preview image endpoint.
//!
//! # Module Organization
//!
//! - [`commands`]: Command-line interface, logging setup and the `serve` entry point
//! - [`config`]: Service configuration file
//! - [`stats`]: Daily stats aggregation and time-window computation
//! - [`upstream`]: Clients for the GitHub commit search and WakaTime summaries APIs
//! - [`server`]: HTTP routing, CORS policy and OG image rendering

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod commands;
pub mod config;
pub mod server;
pub mod stats;
pub mod upstream;

pub use crate::commands::{Host, run};
