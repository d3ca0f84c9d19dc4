pub mod config;
pub mod conversation;
pub mod domain;
pub mod errors;
pub mod sizing;

pub use conversation::{ConversationHistory, KnowledgeBase};
pub use domain::catalog::{
    BatteryRow, InstallCostRef, InverterRow, PackageRow, ProductRow, Tier, VoltageRange,
};
pub use domain::conversation::{ConversationId, ConversationTurn, Role};
pub use domain::decision::{
    BuildSource, CustomBuildRecommendation, HomeInstallRecommendation, PortableRecommendation,
    SizingDecision,
};
pub use domain::load::{HousingType, LoadRequest};
pub use errors::{ApplicationError, DomainError};
pub use sizing::catalog::CatalogRepository;
pub use sizing::custom::EngineeringProfile;
pub use sizing::{SizingEngine, SizingMode};
