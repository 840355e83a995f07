//! Data models for the timetable backend.
//!
//! Wire names follow the camelCase document format shared with the remote store.

mod institution;
mod registry;
mod settings;
mod staffing;
mod state;
mod timetable;

pub use institution::*;
pub use registry::*;
pub use settings::*;
pub use staffing::*;
pub use state::*;
pub use timetable::*;

/// Fresh identifier for a new entity. Never reused.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
