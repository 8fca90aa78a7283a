//! Entity and relation records.
//!
//! Records are immutable once created and reference each other by identifier,
//! never by pointer. The generator's registry and ledger own them.

use serde::{Deserialize, Serialize};

use crate::tables::{GroupMemberRank, PageKind, PlaceKind, PostKind, SocialRelationKind};

/// Page identifier: a username for profiles, a `grp-` token for groups.
pub type PageId = String;

/// Place identifier: a path-like id for scripted places or a `plc-` token.
pub type PlaceId = String;

/// Post (`pst-`) or comment (`cmt-`) identifier.
pub type ContentId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub kind: PageKind,
    pub id: PageId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub kind: PlaceKind,
    pub id: PlaceId,
    pub name: String,
    pub parent: Option<PlaceId>,
}

/// A role-ordered pair of persons: `persons.0` plays `kind.first_role()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialRelation {
    pub kind: SocialRelationKind,
    pub persons: (PageId, PageId),
}

impl SocialRelation {
    pub fn involves(&self, person: &str) -> bool {
        self.persons.0 == person || self.persons.1 == person
    }

    /// The other member of the pair, if `person` is in it.
    pub fn partner_of(&self, person: &str) -> Option<&PageId> {
        if self.persons.0 == person {
            Some(&self.persons.1)
        } else if self.persons.1 == person {
            Some(&self.persons.0)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Education {
    pub institute: PageId,
    pub attendee: PageId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employment {
    pub employer: PageId,
    pub employee: PageId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub group: PageId,
    pub member: PageId,
    pub rank: GroupMemberRank,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub kind: PostKind,
    pub id: ContentId,
    pub page: PageId,
    pub author: PageId,
    /// Millisecond-precision creation timestamp, rendered.
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: ContentId,
    pub parent: ContentId,
    pub author: PageId,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub id: ContentId,
    pub question: String,
    pub answers: Vec<String>,
}

/// Either kind of content a reaction, subscription or comment can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentKind {
    Post,
    Comment,
}

impl ContentKind {
    pub fn label(self) -> &'static str {
        match self {
            ContentKind::Post => "post",
            ContentKind::Comment => "comment",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRef {
    pub kind: ContentKind,
    pub id: ContentId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub content: ContentRef,
    pub author: PageId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub poll: ContentId,
    pub author: PageId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Following {
    pub page: PageId,
    pub follower: PageId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub content: ContentRef,
    pub subscriber: PageId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewing {
    pub post: ContentId,
    pub viewer: PageId,
}
