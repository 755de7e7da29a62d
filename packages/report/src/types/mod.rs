pub mod chart;
pub mod claim;
pub mod report;
pub mod source;
pub mod verdict;
