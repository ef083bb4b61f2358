//! crdmanifest-kube - live reads for the data source variant
//!
//! This crate provides:
//! - `LiveReader`: fetch one object by reference
//! - `KubeReader`: kube-rs backed reader over a caller-supplied client
//! - `MockReader`: in-memory reader for tests
//! - `DataSource`: fetch, decode and render a live object

pub mod client;
pub mod data_source;
pub mod error;
pub mod mock;
pub mod reader;

pub use client::KubeReader;
pub use data_source::DataSource;
pub use error::{KubeError, Result};
pub use mock::MockReader;
pub use reader::{LiveReader, ObjectRef};
