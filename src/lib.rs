#![doc = include_str!("../README.md")]

pub mod build;
pub mod driver;
pub mod edgemap;
pub mod error;
pub mod link;
pub mod node;
pub mod scan;
pub mod store;
pub mod text;
pub mod walk;

pub use driver::{run, Algorithm, Benchmark, Options, Report, StoreKind, Tree, Variation};
pub use error::Error;
pub use text::Text;
