#![doc = "pebblo-reader-core: core logic library for pebblo-reader."]

//! This crate contains the reader abstraction, the Pebblo classifier client and the
//! [`safe_reader::PebbloSafeReader`] adapter that ties them together.
//! CLI glue and YAML config loading live in the `pebblo-reader` crate.
//!
//! # Usage
//! Wrap any [`contract::Reader`] in a `PebbloSafeReader` together with a
//! [`contract::PebbloClient`] (usually [`client::HttpPebbloClient`]) and call `load`.

pub mod app;
pub mod client;
pub mod config;
pub mod contract;
pub mod loader;
pub mod safe_reader;
pub mod text_reader;
