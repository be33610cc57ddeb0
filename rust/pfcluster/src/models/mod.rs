mod candidate;
pub(crate) mod component;
mod identity;
mod isotope_pair;
mod modification;
mod relation;

pub use candidate::{
    ProteoformCandidate,
    RecordRef,
};
pub use component::{
    ChargeState,
    Component,
    ComponentId,
    Purpose,
    ScanRange,
};
pub use identity::{
    Identity,
    IdentityAssignment,
    IdentityId,
    IdentityKind,
    TheoreticalInfo,
};
pub use isotope_pair::{
    IsotopePair,
    PairId,
    lysine_count,
};
pub use modification::{
    Modification,
    ModificationKind,
    PtmSet,
};
pub use relation::{
    PtmChange,
    Relation,
    RelationAssignment,
    RelationId,
    RelationKind,
};
