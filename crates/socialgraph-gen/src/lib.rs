//! Deterministic social-graph generator and constraint engine.
//!
//! A [`Generator`] owns the entity registry, the relation ledger and a seeded
//! RNG. Each public operation samples whatever the caller did not pin down,
//! checks every constraint against what exists so far and returns the
//! abstract mutation operations describing the new instances. Two runs with
//! the same seed, resources and call sequence produce identical streams.

pub mod config;
pub mod diagnostics;
mod engagement;
pub mod error;
pub mod generator;
pub mod ids;
pub mod ledger;
pub mod mapper;
pub mod registry;
pub mod specs;
pub mod timestamps;

pub use config::{GeneratorConfig, OverridePolicy, RangeConfig, Ranges, RangesConfig};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::{GenerationError, Result};
pub use generator::Generator;
pub use ids::{Namespace, UsernamePolicy};
pub use ledger::Ledger;
pub use mapper::{ConversationSpec, MappedConversation, MappedNode, PostingMode};
pub use registry::{PageCategory, Registry};
pub use specs::{
    CommentSpec, EducationSpec, EmploymentSpec, FollowingSpec, GroupSpec, MembershipSpec,
    OrganisationSpec, PageFlags, PersonSpec, PlaceSpec, PostBody, PostSpec, ReactionSpec,
    ResponseSpec, SocialRelationSpec, SubscriptionSpec, ViewingSpec,
};
pub use timestamps::{Interval, Precision, Timestamp};
