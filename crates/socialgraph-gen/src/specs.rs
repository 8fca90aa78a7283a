//! Per-operation inputs for the generation façade.
//!
//! Every `Option` is an explicit override of something otherwise sampled;
//! `Default` asks for a fully random instance.

use chrono::{NaiveDate, NaiveDateTime};
use socialgraph_model::{
    ContentId, Emoji, Gender, GroupMemberRank, InstituteKind, OrganisationKind, PageId,
    PageVisibility, PlaceId, PlaceKind, PostKind, PostVisibility, SocialRelationKind,
};

/// Activity flags shared by persons, organisations and groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageFlags {
    pub is_active: bool,
    pub is_visible: bool,
    pub can_publish: bool,
}

impl Default for PageFlags {
    fn default() -> Self {
        Self {
            is_active: true,
            is_visible: true,
            can_publish: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceSpec {
    pub kind: PlaceKind,
    pub name: String,
    pub id: Option<PlaceId>,
    /// Landmarks without a parent land in a random city; other kinds become
    /// roots.
    pub parent: Option<PlaceId>,
    pub languages: Vec<String>,
}

impl PlaceSpec {
    fn new(kind: PlaceKind, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            id: None,
            parent: None,
            languages: Vec::new(),
        }
    }

    pub fn region(name: &str) -> Self {
        Self::new(PlaceKind::Region, name)
    }

    pub fn country(name: &str, region: &str, languages: &[&str]) -> Self {
        let mut spec = Self::new(PlaceKind::Country, name).within(region);
        spec.languages = languages.iter().map(|l| l.to_string()).collect();
        spec
    }

    pub fn state(name: &str, country: &str) -> Self {
        Self::new(PlaceKind::State, name).within(country)
    }

    pub fn city(name: &str, parent: &str) -> Self {
        Self::new(PlaceKind::City, name).within(parent)
    }

    pub fn landmark(name: &str) -> Self {
        Self::new(PlaceKind::Landmark, name)
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn within(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonSpec {
    pub name: Option<String>,
    pub username: Option<PageId>,
    pub gender: Option<Gender>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub location: Option<PlaceId>,
    pub birth_place: Option<PlaceId>,
    pub languages: Vec<String>,
    pub flags: PageFlags,
    pub page_visibility: PageVisibility,
    pub post_visibility: PostVisibility,
}

impl Default for PersonSpec {
    fn default() -> Self {
        Self {
            name: None,
            username: None,
            gender: None,
            email: None,
            bio: None,
            birth_date: None,
            location: None,
            birth_place: None,
            languages: vec!["English".to_string()],
            flags: PageFlags::default(),
            page_visibility: PageVisibility::Public,
            post_visibility: PostVisibility::Public,
        }
    }
}

impl PersonSpec {
    pub fn with_bio(bio: &str) -> Self {
        Self {
            bio: Some(bio.to_string()),
            ..Self::default()
        }
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganisationSpec {
    pub kind: OrganisationKind,
    pub name: String,
    pub bio: String,
    pub tags: Vec<String>,
    pub location: Option<PlaceId>,
    pub flags: PageFlags,
}

impl OrganisationSpec {
    pub fn new(kind: OrganisationKind, name: &str, bio: &str, tags: Vec<String>) -> Self {
        Self {
            kind,
            name: name.to_string(),
            bio: bio.to_string(),
            tags,
            location: None,
            flags: PageFlags::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSpec {
    pub name: String,
    pub bio: String,
    pub tags: Vec<String>,
    pub id: Option<PageId>,
    pub flags: PageFlags,
    pub page_visibility: PageVisibility,
    pub post_visibility: PostVisibility,
}

impl GroupSpec {
    pub fn new(name: &str, bio: &str, tags: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            bio: bio.to_string(),
            tags,
            id: None,
            flags: PageFlags::default(),
            page_visibility: PageVisibility::Public,
            post_visibility: PostVisibility::Public,
        }
    }
}

/// Variant-specific payload of a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostBody {
    Text,
    Share { original: ContentId },
    Image,
    Video,
    LiveVideo,
    Poll { question: String, answers: Vec<String> },
}

impl PostBody {
    pub fn kind(&self) -> PostKind {
        match self {
            PostBody::Text => PostKind::Text,
            PostBody::Share { .. } => PostKind::Share,
            PostBody::Image => PostKind::Image,
            PostBody::Video => PostKind::Video,
            PostBody::LiveVideo => PostKind::LiveVideo,
            PostBody::Poll { .. } => PostKind::Poll,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSpec {
    pub page: PageId,
    pub author: PageId,
    pub text: String,
    pub body: PostBody,
    pub tags: Vec<String>,
    pub id: Option<ContentId>,
    pub timestamp: Option<NaiveDateTime>,
    pub location: Option<PlaceId>,
    pub language: String,
    pub is_visible: bool,
    pub visibility: PostVisibility,
}

impl PostSpec {
    pub fn new(page: &str, author: &str, text: &str, body: PostBody) -> Self {
        Self {
            page: page.to_string(),
            author: author.to_string(),
            text: text.to_string(),
            body,
            tags: Vec::new(),
            id: None,
            timestamp: None,
            location: None,
            language: "English".to_string(),
            is_visible: true,
            visibility: PostVisibility::Default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentSpec {
    pub parent: ContentId,
    pub author: PageId,
    pub text: String,
    pub tags: Vec<String>,
    pub id: Option<ContentId>,
    /// Defaults to a draw between the parent's creation and the content
    /// range end.
    pub timestamp: Option<NaiveDateTime>,
    pub is_visible: bool,
}

impl CommentSpec {
    pub fn new(parent: &str, author: &str, text: &str) -> Self {
        Self {
            parent: parent.to_string(),
            author: author.to_string(),
            text: text.to_string(),
            tags: Vec::new(),
            id: None,
            timestamp: None,
            is_visible: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocialRelationSpec {
    /// Role-ordered: the first person plays the kind's first role (the
    /// parent of a parentship).
    pub persons: Option<(PageId, PageId)>,
    pub kind: Option<SocialRelationKind>,
    pub location: Option<PlaceId>,
    pub date: Option<NaiveDate>,
}

impl SocialRelationSpec {
    pub fn between(first: &str, second: &str) -> Self {
        Self {
            persons: Some((first.to_string(), second.to_string())),
            ..Self::default()
        }
    }

    pub fn of_kind(mut self, kind: SocialRelationKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EducationSpec {
    pub person: Option<PageId>,
    pub institute: Option<PageId>,
    pub institute_kind: Option<InstituteKind>,
    pub dates: Option<(NaiveDate, Option<NaiveDate>)>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmploymentSpec {
    pub person: Option<PageId>,
    pub organisation: Option<PageId>,
    pub organisation_kind: Option<OrganisationKind>,
    pub dates: Option<(NaiveDate, Option<NaiveDate>)>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipSpec {
    pub group: Option<PageId>,
    pub profile: Option<PageId>,
    pub rank: Option<GroupMemberRank>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub badges: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReactionSpec {
    pub author: Option<PageId>,
    pub content: Option<ContentId>,
    pub emoji: Option<Emoji>,
    pub timestamp: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseSpec {
    pub author: Option<PageId>,
    pub poll: Option<ContentId>,
    pub answer: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowingSpec {
    pub page: Option<PageId>,
    pub follower: Option<PageId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionSpec {
    pub content: Option<ContentId>,
    pub subscriber: Option<PageId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewingSpec {
    pub post: Option<ContentId>,
    pub viewer: Option<PageId>,
}
