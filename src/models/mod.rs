pub mod operation;
pub mod partition;
pub mod photo;
pub mod progress;
