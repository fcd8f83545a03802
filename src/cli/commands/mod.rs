//! Command implementations

pub mod amendments;
pub mod check;
pub mod completions;
pub mod gate;
pub mod list;
pub mod sla;
pub mod transitions;
