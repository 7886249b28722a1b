// ABOUTME: Library entry point for the velo-rental bicycle rental service
// ABOUTME: Exposes the row mapper, repositories, auth and REST routing layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Velo Rental
//!
//! A bicycle rental REST service over SQLite. Riders register, rent an
//! available bike, and are billed per whole minute when they return it;
//! administrators manage the fleet over a Basic-auth surface.
//!
//! The storage layer is built around one generic result-to-record mapper
//! ([`database::mapper`]): record types declare static column binding
//! tables and every repository read funnels through the same execution and
//! coercion path.

#![warn(missing_docs)]

pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod geo;
pub mod logging;
pub mod models;
pub mod routes;
pub mod server;
