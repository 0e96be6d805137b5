pub mod assemble;
pub mod build;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod session;
pub mod status;

pub use build::{GraphSource, build_graph};
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, load_config};
pub use ir::{QueryEvent, QueryTree, QueryTreeNode};
pub use layout::{DagreEngine, GraphPayload, LayeredEngine, LayoutError, Strategy, compute_layout};
pub use session::{LayoutSession, LayoutSnapshot, Refresh};
pub use status::{CanonicalStatus, normalize};
