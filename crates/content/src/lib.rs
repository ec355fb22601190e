#![forbid(unsafe_code)]

pub mod bundled;
pub mod provider;

pub use bundled::{BundledContent, bundled_passage, bundled_questions};
pub use provider::{ContentError, ContentProvider, InMemoryContent};
