pub mod auth_service;
pub mod blob_store;
pub mod dataset_service;
pub mod persist_utils;
pub mod report;
pub mod retention;

pub use auth_service::*;
pub use blob_store::BlobStore;
pub use dataset_service::*;
pub use report::{ReportView, RecordRow, TypeRow};
pub use retention::RetentionManager;
