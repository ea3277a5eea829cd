pub mod analysis_service;
pub mod file_service;
pub mod materialize_service;
pub mod organize_service;
pub mod query_classifier;
pub mod scan_service;
pub mod strategies;
pub mod undo_service;
pub mod workspace;
