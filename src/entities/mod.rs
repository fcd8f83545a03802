//! Entity type definitions
//!
//! **Tracked (workflow-governed):**
//! - [`TestRequest`] - Laboratory test requests with amendment chains
//! - [`Inspection`] - Factory inspections with defect counts
//! - [`Style`] - Product styles with staged approvals and the Gold Seal Workbook
//!
//! **Reference data:**
//! - [`Component`] - Fabrics (with fibre composition) and trims
//! - [`Supplier`] - Mills, factories and vendors

pub mod component;
pub mod inspection;
pub mod style;
pub mod supplier;
pub mod test_request;

pub use component::{Component, ComponentSpec, ComponentType, Fabric, FibreEntry, Trim};
pub use inspection::{DefectCounts, Inspection, InspectionResult, InspectionState};
pub use style::{GswStatus, Style, StyleStage, StyleStatus};
pub use supplier::{Supplier, SupplierStatus};
pub use test_request::{TestRequest, TestRequestState, TestingLevel};
