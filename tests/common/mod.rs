//! Shared test helpers for integration tests
//!
//! This module provides common utilities used across all test files.

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use tcm::entities::{
    Inspection, InspectionState, Style, StyleStage, StyleStatus, TestRequest, TestRequestState,
};

/// Reference "today" shared by the fixtures
pub const AS_OF: &str = "2024-05-10T09:00:00Z";

pub fn today() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap()
}

/// Helper to get a tcm command that ignores any user config
pub fn tcm() -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("tcm"));
    cmd.env_remove("TCM_CONFIG").env_remove("TCM_LOG");
    cmd
}

/// A catalog exercising every kind
pub const CATALOG: &str = r#"
test_requests:
  - id: TR-1
    number: TR-2024-001
    product_name: Denim Jacket
    supplier_name: Lakeside Mills
    status: testing
    progress: 60
    due_date: 2024-05-09T09:00:00Z
  - id: TR-2
    number: TR-2024-002
    product_name: Chore Coat
    status: in_review
    due_date: 2024-05-15T09:00:00Z
  - id: TR-3
    number: TR-2024-003
    product_name: Linen Shirt
    status: completed
    progress: 100
    due_date: 2024-04-01T00:00:00Z
  - id: TR-4
    number: TR-2024-003-A1
    product_name: Linen Shirt
    status: draft
    is_amendment: true
    parent_id: TR-3
    due_date: 2024-07-01T00:00:00Z
inspections:
  - id: INS-1
    number: INS-2024-001
    supplier_name: Harbour Garments
    status: confirmed
    defect_counts: { critical: 0, major: 2, minor: 5 }
    due_date: 2024-05-12T00:00:00Z
styles:
  - id: STY-1
    style_number: ST-88120
    name: Chore Jacket
    supplier_name: Harbour Garments
    status: approved
    stage: product_approved
    component_ids: [CMP-1, CMP-2]
  - id: STY-2
    style_number: ST-88121
    name: Work Shirt
    supplier_name: Harbour Garments
    status: submitted
    stage: bulk
components:
  - id: CMP-1
    code: F-2201
    name: Stretch Denim
    type: fabric
    construction: 3/1 twill
    dye_method: yarn dyed
    composition:
      - { fibre_type: cotton, percentage: 60, is_sustainable: true }
      - { fibre_type: cotton, percentage: 38, is_recycled: true }
      - { fibre_type: elastane, percentage: 2 }
  - id: CMP-2
    code: T-0042
    name: Shank Button
    type: trim
    trim_type: button
suppliers:
  - id: SUP-1
    name: Lakeside Mills
    country: Portugal
    status: active
"#;

/// Write `content` as `catalog.yaml` in a fresh directory
pub fn write_catalog(content: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("catalog.yaml");
    fs::write(&path, content).unwrap();
    (tmp, path)
}

pub fn test_request(status: TestRequestState, due_in: Option<Duration>) -> TestRequest {
    let mut request = TestRequest::new("TR-1", "TR-2024-001");
    request.status = status;
    request.due_date = due_in.map(|d| today() + d);
    request
}

pub fn inspection(status: InspectionState, due_in: Option<Duration>) -> Inspection {
    let mut inspection = Inspection::new("INS-1", "INS-2024-001");
    inspection.status = status;
    inspection.due_date = due_in.map(|d| today() + d);
    inspection
}

pub fn style_at(stage: StyleStage, status: StyleStatus) -> Style {
    let mut style = Style::new("STY-1", "ST-88120");
    style.name = "Chore Jacket".to_string();
    style.supplier_name = "Harbour Garments".to_string();
    style.stage = stage;
    style.status = status;
    style
}
