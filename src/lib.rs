#![allow(clippy::new_without_default)]

#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;

pub mod autocomplete;
pub mod config;
pub mod controller;
pub mod coordinate;
pub mod directions;
pub mod error;
pub mod events;
pub mod geocoding;
pub mod gps_processor;
pub mod http;
pub mod location_provider;
pub mod location_tracker;
pub mod logs;
pub mod place_store;
pub mod polyline;
pub mod renderer;
mod utils;
