//! TCM: Textile compliance workflow and validation engine
//!
//! Tracks test requests, inspections and product styles through declared
//! workflows, derives live SLA badges from due dates, gates style stage
//! progression, and validates records before submission.

#[macro_use]
mod macros;

pub mod cli;
pub mod core;
pub mod entities;
pub mod yaml;
