use super::{Location, Violation};
use crate::models::OperationAddress;
use serde::Serialize;

/// Outcome of validating one message against one operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub address: OperationAddress,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn new(address: OperationAddress, violations: Vec<Violation>) -> Self {
        Self {
            address,
            violations,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations_in(&self, location: Location) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.location == location)
    }
}

impl IntoIterator for ValidationReport {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.into_iter()
    }
}
