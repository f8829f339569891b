pub mod cell;
pub mod resource;
pub mod summary;

pub use cell::{Cell, DisplayRow};
pub use resource::{ResourceDescriptor, ResourceKind};
pub use summary::{RunReport, RunSummary};
