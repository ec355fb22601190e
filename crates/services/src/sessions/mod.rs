mod registry;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use registry::SessionRegistry;
pub use workflow::SessionLoopService;
