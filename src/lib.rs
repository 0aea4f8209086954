//! Supervised renderer IPC client and user-dictionary lookup table for a
//! Japanese input method engine.
//!
//! Two independent subsystems live in this crate: [`pos_table`], a
//! zero-copy reader over the packed user-dictionary binary, and
//! [`renderer`], the state machine that supervises the out-of-process
//! renderer and relays commands to it over IPC.

pub mod config;
pub mod logging;
pub mod pos_table;
pub mod renderer;

pub use config::SupervisorConfig;
pub use pos_table::{LookupTable, LookupTableError, TokenAttributes, UserToken};
pub use renderer::{RendererCommand, RendererDeps, RendererSupervisor, ServiceName, Status};
