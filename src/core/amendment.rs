//! Amendment chains between test requests
//!
//! An amendment refers to the request it amends by id. The index resolves
//! those references in both directions and rejects broken chains.

use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::entities::test_request::TestRequest;

/// A broken amendment reference
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmendmentError {
    #[error("Test request {id} amends unknown request {parent_id}")]
    UnknownParent { id: String, parent_id: String },

    #[error("Amendment cycle through {}", ids.join(" -> "))]
    Cycle { ids: Vec<String> },

    #[error("Test request {id} has is_amendment={is_amendment} but parent {parent}")]
    InconsistentFlag {
        id: String,
        is_amendment: bool,
        parent: String,
    },

    #[error("Unknown test request {id}")]
    UnknownRequest { id: String },
}

/// Parent/amendment lookup over a set of test requests
#[derive(Debug)]
pub struct AmendmentIndex<'a> {
    by_id: BTreeMap<&'a str, &'a TestRequest>,
    children: BTreeMap<&'a str, Vec<&'a TestRequest>>,
}

impl<'a> AmendmentIndex<'a> {
    /// Index `requests`, checking every reference
    pub fn build(requests: &'a [TestRequest]) -> Result<Self, AmendmentError> {
        let by_id: BTreeMap<&str, &TestRequest> =
            requests.iter().map(|r| (r.id.as_str(), r)).collect();
        let mut children: BTreeMap<&str, Vec<&TestRequest>> = BTreeMap::new();

        for request in requests {
            match (request.is_amendment, request.parent_id.as_deref()) {
                (true, Some(parent_id)) => {
                    if !by_id.contains_key(parent_id) {
                        return Err(AmendmentError::UnknownParent {
                            id: request.id.clone(),
                            parent_id: parent_id.to_string(),
                        });
                    }
                    children.entry(parent_id).or_default().push(request);
                }
                (false, None) => {}
                (is_amendment, parent) => {
                    return Err(AmendmentError::InconsistentFlag {
                        id: request.id.clone(),
                        is_amendment,
                        parent: parent.unwrap_or("none").to_string(),
                    })
                }
            }
        }

        let index = Self { by_id, children };
        for request in requests {
            index.ancestors(&request.id)?;
        }
        Ok(index)
    }

    /// Look up a request by id
    pub fn get(&self, id: &str) -> Option<&'a TestRequest> {
        self.by_id.get(id).copied()
    }

    /// The request `id` amends, if any
    pub fn parent_of(&self, id: &str) -> Option<&'a TestRequest> {
        let parent_id = self.get(id)?.parent_id.as_deref()?;
        self.get(parent_id)
    }

    /// Requests amending `id`, in input order
    pub fn amendments_of(&self, id: &str) -> &[&'a TestRequest] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The chain from the original request down to `id`
    pub fn chain(&self, id: &str) -> Result<Vec<&'a TestRequest>, AmendmentError> {
        let mut chain = self.ancestors(id)?;
        chain.reverse();
        Ok(chain)
    }

    /// Requests amended more than once, with their amendments
    pub fn shared_parents(&self) -> Vec<(&'a TestRequest, &[&'a TestRequest])> {
        let shared: Vec<_> = self
            .children
            .iter()
            .filter(|(_, amendments)| amendments.len() > 1)
            .filter_map(|(parent_id, amendments)| {
                self.get(parent_id).map(|parent| (parent, amendments.as_slice()))
            })
            .collect();
        for (parent, amendments) in &shared {
            tracing::warn!(
                parent = %parent.id,
                amendments = amendments.len(),
                "test request has more than one amendment"
            );
        }
        shared
    }

    /// Original requests (not themselves amendments)
    pub fn roots(&self) -> impl Iterator<Item = &'a TestRequest> + '_ {
        self.by_id.values().copied().filter(|r| r.parent_id.is_none())
    }

    /// `id` followed by its ancestors
    fn ancestors(&self, id: &str) -> Result<Vec<&'a TestRequest>, AmendmentError> {
        let mut current = self
            .get(id)
            .ok_or_else(|| AmendmentError::UnknownRequest { id: id.to_string() })?;
        let mut seen = BTreeSet::new();
        let mut path = Vec::new();

        loop {
            if !seen.insert(current.id.as_str()) {
                let mut ids: Vec<String> = path.iter().map(|r: &&TestRequest| r.id.clone()).collect();
                ids.push(current.id.clone());
                return Err(AmendmentError::Cycle { ids });
            }
            path.push(current);
            match current.parent_id.as_deref() {
                Some(parent_id) => {
                    current = self.get(parent_id).ok_or_else(|| AmendmentError::UnknownParent {
                        id: current.id.clone(),
                        parent_id: parent_id.to_string(),
                    })?;
                }
                None => return Ok(path),
            }
        }
    }
}
