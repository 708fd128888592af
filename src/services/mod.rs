pub mod dataset;
pub mod eda;
pub mod file_processor;
pub mod report;
