//! Debounced character search over two independently paginated modes.

mod coordinator;
mod options;
mod state;

pub use coordinator::{SearchCoordinator, SearchSnapshot};
pub use options::{SearchMode, SearchOptions};
