//! Model artifacts: store access, descriptor parsing, network construction.

pub mod descriptor;
pub mod network;
pub mod store;

pub use descriptor::{ModelDescriptor, ModelFormat, OutputLayout, PreprocessConfig};
pub use network::{Network, NetworkFactory, OrtNetworkFactory};
pub use store::{FsModelStore, HttpModelStore, ModelStore};
