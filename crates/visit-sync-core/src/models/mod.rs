//! Domain models for visit synchronization.

mod encounter;
mod patient;
mod reference;
mod visit;

pub use encounter::*;
pub use patient::*;
pub use reference::*;
pub use visit::*;
