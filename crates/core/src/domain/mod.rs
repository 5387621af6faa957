pub mod contract;
pub mod quiz;
pub mod recommendation;
