pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;
pub mod seq;

pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{
    Address, AssetId, IssuerId, OptionType, ProductDescriptor, ProductId, Settlement,
    SettlementType, TokenDescriptor, TokenId,
};
pub use engine::{EngineError, FullMarginAccount, IssuerRegistry, PhysicalSettlement};
pub use error::AppError;
pub use orchestration::{MarginService, ServiceError};
