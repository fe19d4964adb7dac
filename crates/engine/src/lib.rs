pub mod index;
pub mod locator;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod planner;
pub mod reader;

#[cfg(test)]
mod locator_tests;

pub use index::{INDEX_SCALE, IndexError, compute_deposit_ratio, compute_index};
pub use locator::{LocateRequest, PredecessorLocator};
pub use reader::{ListReader, ReaderError, SafetyPoolReader, VaultsReader};
