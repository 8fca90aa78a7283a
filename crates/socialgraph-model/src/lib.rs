//! Socialgraph data model.
//!
//! Everything the generator reasons about, with no generation logic:
//!
//! - `tables`: closed categorical variants with their weights and role names
//! - `names`: cumulative-percentile name tables
//! - `entity`: page, place and relation records
//! - `conversation`: conversation templates flattened into node arenas
//! - `ops`: the abstract mutation operations handed to a loader

pub mod conversation;
pub mod entity;
pub mod names;
pub mod ops;
pub mod tables;

pub use conversation::{
    ConversationDocument, ConversationNode, ConversationTemplate, NodeContent, PollSpec,
    TagMapping, TemplateError,
};
pub use entity::*;
pub use names::{NameEntry, NameTable, NameTables};
pub use ops::{count_entities, count_relations, EntityRef, Field, FieldValue, Fields, MutationOp, RolePlayer};
pub use tables::{
    choose, choose_any, Emoji, EmailDomain, Gender, GroupMemberRank, InstituteKind,
    OrganisationKind, PageKind, PageVisibility, PlaceKind, PostKind, PostVisibility,
    RelationshipStatus, SocialRelationKind, Weighted,
};
