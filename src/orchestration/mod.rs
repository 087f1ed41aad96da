pub mod service;

pub use service::{MarginService, ServiceError};
