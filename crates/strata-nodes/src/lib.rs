//! Node content ids, per-content feature tables, and the node registry.
#![forbid(unsafe_code)]

pub mod config;
pub mod node;
pub mod registry;

pub use config::{DrawType, LiquidKind, NodeDef, NodesConfig};
pub use node::{
    CONTENT_AIR, CONTENT_IGNORE, CONTENT_UNKNOWN, ContentId, LIGHT_MAX, LIGHT_SUN, LightBank, Node,
};
pub use registry::{ContentFeatures, NodeConfigError, NodeRegistry};
