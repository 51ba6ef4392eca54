pub mod batch;
pub mod evaluate;
pub mod tables;
pub mod trend;
