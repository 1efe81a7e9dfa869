pub mod linkage;
pub mod performance;
