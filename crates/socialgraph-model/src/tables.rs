//! Variant tables for every categorical choice the generator makes.
//!
//! Each category is a closed enum. Everything variant-specific (relative
//! weight, role names, derived flags) lives in plain `match` lookups over the
//! tag, never in trait objects.
//!
//! Sampling is proportional over whatever candidate subset the caller hands
//! in, so excluding a variant (e.g. a rank already at capacity) needs no
//! explicit renormalisation.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A categorical variant carrying a non-negative relative weight.
pub trait Weighted: Copy + 'static {
    /// Every variant, in declaration order.
    const ALL: &'static [Self];

    fn weight(self) -> f64;
}

/// Draw one of `candidates` with probability proportional to its weight.
///
/// Returns `None` when `candidates` is empty or none of them carries a
/// positive weight. Zero-weight variants are never drawn; a caller that needs
/// one (the initial group owner) picks it explicitly.
pub fn choose<T: Weighted, R: Rng + ?Sized>(rng: &mut R, candidates: &[T]) -> Option<T> {
    if candidates.is_empty() {
        return None;
    }
    let dist = WeightedIndex::new(candidates.iter().map(|c| c.weight())).ok()?;
    Some(candidates[dist.sample(rng)])
}

/// [`choose`] over every variant of `T`.
pub fn choose_any<T: Weighted, R: Rng + ?Sized>(rng: &mut R) -> Option<T> {
    choose(rng, T::ALL)
}

// ============================================================================
// Weighted tables
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gender {
    Female,
    Male,
    Other,
}

impl Gender {
    pub fn label(self) -> &'static str {
        match self {
            Gender::Female => "female",
            Gender::Male => "male",
            Gender::Other => "other",
        }
    }
}

impl Weighted for Gender {
    const ALL: &'static [Self] = &[Gender::Female, Gender::Male, Gender::Other];

    fn weight(self) -> f64 {
        match self {
            Gender::Female => 50.0,
            Gender::Male => 45.0,
            Gender::Other => 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmailDomain {
    #[serde(rename = "gmail.com")]
    Google,
    #[serde(rename = "outlook.com")]
    Microsoft,
    #[serde(rename = "proton.me")]
    Proton,
    #[serde(rename = "aol.com")]
    Aol,
    #[serde(rename = "yahoo.com")]
    Yahoo,
}

impl EmailDomain {
    pub fn label(self) -> &'static str {
        match self {
            EmailDomain::Google => "gmail.com",
            EmailDomain::Microsoft => "outlook.com",
            EmailDomain::Proton => "proton.me",
            EmailDomain::Aol => "aol.com",
            EmailDomain::Yahoo => "yahoo.com",
        }
    }
}

impl Weighted for EmailDomain {
    const ALL: &'static [Self] = &[
        EmailDomain::Google,
        EmailDomain::Microsoft,
        EmailDomain::Proton,
        EmailDomain::Aol,
        EmailDomain::Yahoo,
    ];

    fn weight(self) -> f64 {
        match self {
            EmailDomain::Google => 50.0,
            EmailDomain::Microsoft => 30.0,
            EmailDomain::Proton => 10.0,
            EmailDomain::Aol => 5.0,
            EmailDomain::Yahoo => 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipStatus {
    Single,
    Relationship,
    Engaged,
    Married,
    Complicated,
}

impl RelationshipStatus {
    pub fn label(self) -> &'static str {
        match self {
            RelationshipStatus::Single => "single",
            RelationshipStatus::Relationship => "relationship",
            RelationshipStatus::Engaged => "engaged",
            RelationshipStatus::Married => "married",
            RelationshipStatus::Complicated => "complicated",
        }
    }

    /// Statuses that only make sense alongside a romantic relation record.
    pub fn implies_partner(self) -> bool {
        matches!(
            self,
            RelationshipStatus::Relationship
                | RelationshipStatus::Engaged
                | RelationshipStatus::Married
        )
    }
}

impl Weighted for RelationshipStatus {
    const ALL: &'static [Self] = &[
        RelationshipStatus::Single,
        RelationshipStatus::Relationship,
        RelationshipStatus::Engaged,
        RelationshipStatus::Married,
        RelationshipStatus::Complicated,
    ];

    fn weight(self) -> f64 {
        match self {
            RelationshipStatus::Single => 20.0,
            RelationshipStatus::Relationship => 40.0,
            RelationshipStatus::Engaged => 5.0,
            RelationshipStatus::Married => 30.0,
            RelationshipStatus::Complicated => 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SocialRelationKind {
    Friendship,
    Family,
    Parentship,
    Siblingship,
    Relationship,
    Engagement,
    Marriage,
}

impl SocialRelationKind {
    pub fn label(self) -> &'static str {
        match self {
            SocialRelationKind::Friendship => "friendship",
            SocialRelationKind::Family => "family",
            SocialRelationKind::Parentship => "parentship",
            SocialRelationKind::Siblingship => "siblingship",
            SocialRelationKind::Relationship => "relationship",
            SocialRelationKind::Engagement => "engagement",
            SocialRelationKind::Marriage => "marriage",
        }
    }

    pub fn is_family(self) -> bool {
        matches!(
            self,
            SocialRelationKind::Family
                | SocialRelationKind::Parentship
                | SocialRelationKind::Siblingship
        )
    }

    /// Relationship, engagement and marriage: mutually exclusive by default.
    pub fn is_romantic(self) -> bool {
        matches!(
            self,
            SocialRelationKind::Relationship
                | SocialRelationKind::Engagement
                | SocialRelationKind::Marriage
        )
    }

    pub fn romantic_kinds() -> impl Iterator<Item = Self> {
        Self::ALL.iter().copied().filter(|kind| kind.is_romantic())
    }

    /// Role played by the first person of the pair.
    pub fn first_role(self) -> &'static str {
        match self {
            SocialRelationKind::Friendship => "friend",
            SocialRelationKind::Family => "relative",
            SocialRelationKind::Parentship => "parent",
            SocialRelationKind::Siblingship => "sibling",
            SocialRelationKind::Relationship => "partner",
            SocialRelationKind::Engagement => "fiance",
            SocialRelationKind::Marriage => "spouse",
        }
    }

    /// Role played by the second person; only parentship is asymmetric.
    pub fn second_role(self) -> &'static str {
        match self {
            SocialRelationKind::Parentship => "child",
            other => other.first_role(),
        }
    }

    /// Date attribute carried by romantic relations.
    pub fn date_attribute(self) -> Option<&'static str> {
        match self {
            SocialRelationKind::Relationship => Some("start-date"),
            SocialRelationKind::Engagement => Some("engagement-date"),
            SocialRelationKind::Marriage => Some("marriage-date"),
            _ => None,
        }
    }

    pub fn has_location(self) -> bool {
        matches!(
            self,
            SocialRelationKind::Engagement | SocialRelationKind::Marriage
        )
    }

    /// Status attached to both partners when a romantic relation is created.
    pub fn relationship_status(self) -> Option<RelationshipStatus> {
        match self {
            SocialRelationKind::Relationship => Some(RelationshipStatus::Relationship),
            SocialRelationKind::Engagement => Some(RelationshipStatus::Engaged),
            SocialRelationKind::Marriage => Some(RelationshipStatus::Married),
            _ => None,
        }
    }
}

impl Weighted for SocialRelationKind {
    const ALL: &'static [Self] = &[
        SocialRelationKind::Friendship,
        SocialRelationKind::Family,
        SocialRelationKind::Parentship,
        SocialRelationKind::Siblingship,
        SocialRelationKind::Relationship,
        SocialRelationKind::Engagement,
        SocialRelationKind::Marriage,
    ];

    fn weight(self) -> f64 {
        match self {
            SocialRelationKind::Friendship => 70.0,
            SocialRelationKind::Family => 3.0,
            SocialRelationKind::Parentship => 3.0,
            SocialRelationKind::Siblingship => 3.0,
            SocialRelationKind::Relationship => 15.0,
            SocialRelationKind::Engagement => 3.0,
            SocialRelationKind::Marriage => 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupMemberRank {
    Member,
    Moderator,
    Admin,
    Owner,
}

impl GroupMemberRank {
    pub fn label(self) -> &'static str {
        match self {
            GroupMemberRank::Member => "member",
            GroupMemberRank::Moderator => "moderator",
            GroupMemberRank::Admin => "admin",
            GroupMemberRank::Owner => "owner",
        }
    }
}

impl Weighted for GroupMemberRank {
    const ALL: &'static [Self] = &[
        GroupMemberRank::Member,
        GroupMemberRank::Moderator,
        GroupMemberRank::Admin,
        GroupMemberRank::Owner,
    ];

    fn weight(self) -> f64 {
        match self {
            GroupMemberRank::Member => 85.0,
            GroupMemberRank::Moderator => 10.0,
            GroupMemberRank::Admin => 5.0,
            // Only ever assigned explicitly, to the first member of a group.
            GroupMemberRank::Owner => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Emoji {
    Like,
    Love,
    Funny,
    Surprise,
    Sad,
    Angry,
}

impl Emoji {
    pub fn label(self) -> &'static str {
        match self {
            Emoji::Like => "like",
            Emoji::Love => "love",
            Emoji::Funny => "funny",
            Emoji::Surprise => "surprise",
            Emoji::Sad => "sad",
            Emoji::Angry => "angry",
        }
    }
}

impl Weighted for Emoji {
    const ALL: &'static [Self] = &[
        Emoji::Like,
        Emoji::Love,
        Emoji::Funny,
        Emoji::Surprise,
        Emoji::Sad,
        Emoji::Angry,
    ];

    fn weight(self) -> f64 {
        match self {
            Emoji::Like => 60.0,
            Emoji::Love => 10.0,
            Emoji::Funny => 10.0,
            Emoji::Surprise => 10.0,
            Emoji::Sad => 5.0,
            Emoji::Angry => 5.0,
        }
    }
}

// ============================================================================
// Unweighted variants
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageVisibility {
    #[default]
    Public,
    Private,
}

impl PageVisibility {
    pub fn label(self) -> &'static str {
        match self {
            PageVisibility::Public => "public",
            PageVisibility::Private => "private",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PostVisibility {
    #[default]
    Default,
    Public,
    Private,
}

impl PostVisibility {
    pub fn label(self) -> &'static str {
        match self {
            PostVisibility::Default => "default",
            PostVisibility::Public => "public",
            PostVisibility::Private => "private",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostKind {
    #[serde(rename = "text-post")]
    Text,
    #[serde(rename = "share-post")]
    Share,
    #[serde(rename = "image-post")]
    Image,
    #[serde(rename = "video-post")]
    Video,
    #[serde(rename = "live-video-post")]
    LiveVideo,
    #[serde(rename = "poll-post")]
    Poll,
}

impl PostKind {
    pub const ALL: &'static [PostKind] = &[
        PostKind::Text,
        PostKind::Share,
        PostKind::Image,
        PostKind::Video,
        PostKind::LiveVideo,
        PostKind::Poll,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PostKind::Text => "text-post",
            PostKind::Share => "share-post",
            PostKind::Image => "image-post",
            PostKind::Video => "video-post",
            PostKind::LiveVideo => "live-video-post",
            PostKind::Poll => "poll-post",
        }
    }

    /// Resolve the short names used by conversation index files
    /// (`text`, `image`, `live`, ...) as well as the full labels.
    pub fn from_index_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "text" | "text-post" => Some(PostKind::Text),
            "share" | "share-post" => Some(PostKind::Share),
            "image" | "image-post" => Some(PostKind::Image),
            "video" | "video-post" => Some(PostKind::Video),
            "live" | "live-video" | "live-video-post" => Some(PostKind::LiveVideo),
            "poll" | "poll-post" => Some(PostKind::Poll),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlaceKind {
    Region,
    Country,
    State,
    City,
    Landmark,
}

impl PlaceKind {
    pub fn label(self) -> &'static str {
        match self {
            PlaceKind::Region => "region",
            PlaceKind::Country => "country",
            PlaceKind::State => "state",
            PlaceKind::City => "city",
            PlaceKind::Landmark => "landmark",
        }
    }

    /// Relation linking a place of this kind to its parent.
    pub fn location_relation(self) -> &'static str {
        match self {
            PlaceKind::Region => "region-location",
            PlaceKind::Country => "country-location",
            PlaceKind::State => "state-location",
            PlaceKind::City => "city-location",
            PlaceKind::Landmark => "landmark-location",
        }
    }

    pub fn parent_role(self) -> &'static str {
        match self {
            PlaceKind::Region => "parent-region",
            PlaceKind::Country => "region",
            PlaceKind::State => "country",
            PlaceKind::City | PlaceKind::Landmark => "parent",
        }
    }

    pub fn child_role(self) -> &'static str {
        match self {
            PlaceKind::Region => "child-region",
            PlaceKind::Country => "country",
            PlaceKind::State => "state",
            PlaceKind::City => "city",
            PlaceKind::Landmark => "landmark",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageKind {
    Person,
    Organisation,
    Company,
    Charity,
    #[serde(rename = "educational-institute")]
    Institute,
    School,
    College,
    University,
    Group,
}

impl PageKind {
    pub fn label(self) -> &'static str {
        match self {
            PageKind::Person => "person",
            PageKind::Organisation => "organisation",
            PageKind::Company => "company",
            PageKind::Charity => "charity",
            PageKind::Institute => "educational-institute",
            PageKind::School => "school",
            PageKind::College => "college",
            PageKind::University => "university",
            PageKind::Group => "group",
        }
    }

    /// Persons and organisations: pages that can author, follow and view.
    pub fn is_profile(self) -> bool {
        !matches!(self, PageKind::Group)
    }

    pub fn is_organisation(self) -> bool {
        !matches!(self, PageKind::Person | PageKind::Group)
    }

    pub fn is_institute(self) -> bool {
        matches!(
            self,
            PageKind::Institute | PageKind::School | PageKind::College | PageKind::University
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrganisationKind {
    Company,
    Charity,
    #[serde(rename = "educational-institute")]
    Institute,
    School,
    College,
    University,
}

impl OrganisationKind {
    pub fn page_kind(self) -> PageKind {
        match self {
            OrganisationKind::Company => PageKind::Company,
            OrganisationKind::Charity => PageKind::Charity,
            OrganisationKind::Institute => PageKind::Institute,
            OrganisationKind::School => PageKind::School,
            OrganisationKind::College => PageKind::College,
            OrganisationKind::University => PageKind::University,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstituteKind {
    #[serde(rename = "educational-institute")]
    Institute,
    School,
    College,
    University,
}

impl InstituteKind {
    pub fn page_kind(self) -> PageKind {
        match self {
            InstituteKind::Institute => PageKind::Institute,
            InstituteKind::School => PageKind::School,
            InstituteKind::College => PageKind::College,
            InstituteKind::University => PageKind::University,
        }
    }
}
