pub mod aggregation;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod correction;
pub mod errors;
pub mod models;
pub mod pairing;
pub mod pass;
pub mod pool;
pub mod quantification;
pub mod relations;
pub mod resolution;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod tolerance;
pub mod traits;
pub mod vetting;

pub use catalog::{
    CatalogInput,
    PtmCatalog,
    TheoreticalEntry,
};
pub use config::{
    EngineConfig,
    Labeling,
};
pub use correction::{
    Correction,
    CorrectionTable,
};
pub use errors::{
    ConfigError,
    PfClusterError,
};
pub use scheduler::{
    MassWindowScheduler,
    StopFlag,
};
pub use session::{
    AnalysisSession,
    IdentityResolution,
};
pub use store::RecordStore;
pub use tolerance::{
    MassTolerance,
    RtTolerance,
};
