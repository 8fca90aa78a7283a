//! Relation ledger: every relation record plus the indices the constraint
//! checks read.
//!
//! Records are append-only. Queries never mutate; the façade is the only
//! caller of the `record_*` methods and calls them after its checks pass.

use std::collections::{HashMap, HashSet};

use socialgraph_model::{
    ContentId, Education, Employment, Following, GroupMemberRank, GroupMembership, PageId,
    Reaction, Response, SocialRelation, SocialRelationKind, Subscription, Viewing,
};

use crate::mapper::MappedConversation;

/// Unordered pair key: the lexicographically smaller id first.
fn pair_key(a: &str, b: &str) -> (PageId, PageId) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    social_relations: Vec<SocialRelation>,
    /// First relation recorded for each unordered pair.
    pair_index: HashMap<(PageId, PageId), usize>,
    /// Distinct partners per person, in first-relation order.
    partners: HashMap<PageId, Vec<PageId>>,
    relation_counts: HashMap<PageId, usize>,
    romantic_counts: HashMap<PageId, usize>,
    parent_counts: HashMap<PageId, usize>,

    educations: Vec<Education>,
    education_counts: HashMap<PageId, usize>,
    employments: Vec<Employment>,
    employment_counts: HashMap<PageId, usize>,

    memberships: Vec<GroupMembership>,
    members: HashMap<PageId, Vec<PageId>>,
    owner_counts: HashMap<PageId, usize>,

    reactions: Vec<Reaction>,
    responses: Vec<Response>,

    followings: Vec<Following>,
    followers: HashMap<PageId, Vec<PageId>>,

    subscriptions: Vec<Subscription>,
    subscribed: HashSet<(ContentId, PageId)>,

    viewings: Vec<Viewing>,
    viewers: HashMap<ContentId, Vec<PageId>>,

    conversations: Vec<MappedConversation>,
    content_conversation: HashMap<ContentId, usize>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Social relations
    // ========================================================================

    pub fn relation_between(&self, a: &str, b: &str) -> Option<&SocialRelation> {
        self.pair_index
            .get(&pair_key(a, b))
            .map(|&i| &self.social_relations[i])
    }

    /// Relations the person takes part in, duplicates included.
    pub fn relation_count(&self, person: &str) -> usize {
        self.relation_counts.get(person).copied().unwrap_or(0)
    }

    pub fn romantic_count(&self, person: &str) -> usize {
        self.romantic_counts.get(person).copied().unwrap_or(0)
    }

    /// Parentships where `person` holds the child role.
    pub fn parent_count(&self, person: &str) -> usize {
        self.parent_counts.get(person).copied().unwrap_or(0)
    }

    /// Distinct people related to `person`, in the order they were linked.
    pub fn partners(&self, person: &str) -> &[PageId] {
        self.partners.get(person).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn social_relations(&self) -> &[SocialRelation] {
        &self.social_relations
    }

    pub(crate) fn record_social_relation(&mut self, relation: SocialRelation) {
        let (first, second) = relation.persons.clone();
        let index = self.social_relations.len();
        let key = pair_key(&first, &second);
        if !self.pair_index.contains_key(&key) {
            self.pair_index.insert(key, index);
            self.partners.entry(first.clone()).or_default().push(second.clone());
            self.partners.entry(second.clone()).or_default().push(first.clone());
        }
        for person in [&first, &second] {
            *self.relation_counts.entry(person.clone()).or_default() += 1;
            if relation.kind.is_romantic() {
                *self.romantic_counts.entry(person.clone()).or_default() += 1;
            }
        }
        if relation.kind == SocialRelationKind::Parentship {
            *self.parent_counts.entry(second).or_default() += 1;
        }
        self.social_relations.push(relation);
    }

    // ========================================================================
    // Education and employment
    // ========================================================================

    pub fn education_of(&self, person: &str) -> Option<&Education> {
        self.educations.iter().find(|e| e.attendee == person)
    }

    pub fn education_count(&self, person: &str) -> usize {
        self.education_counts.get(person).copied().unwrap_or(0)
    }

    pub fn employment_of(&self, person: &str) -> Option<&Employment> {
        self.employments.iter().find(|e| e.employee == person)
    }

    pub fn employment_count(&self, person: &str) -> usize {
        self.employment_counts.get(person).copied().unwrap_or(0)
    }

    pub fn educations(&self) -> &[Education] {
        &self.educations
    }

    pub fn employments(&self) -> &[Employment] {
        &self.employments
    }

    pub(crate) fn record_education(&mut self, education: Education) {
        *self
            .education_counts
            .entry(education.attendee.clone())
            .or_default() += 1;
        self.educations.push(education);
    }

    pub(crate) fn record_employment(&mut self, employment: Employment) {
        *self
            .employment_counts
            .entry(employment.employee.clone())
            .or_default() += 1;
        self.employments.push(employment);
    }

    // ========================================================================
    // Group memberships
    // ========================================================================

    pub fn members(&self, group: &str) -> &[PageId] {
        self.members.get(group).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_member(&self, group: &str, profile: &str) -> bool {
        self.members(group).iter().any(|member| member == profile)
    }

    pub fn owner_count(&self, group: &str) -> usize {
        self.owner_counts.get(group).copied().unwrap_or(0)
    }

    pub fn has_owner(&self, group: &str) -> bool {
        self.owner_count(group) > 0
    }

    pub fn memberships(&self) -> &[GroupMembership] {
        &self.memberships
    }

    pub(crate) fn record_membership(&mut self, membership: GroupMembership) {
        self.members
            .entry(membership.group.clone())
            .or_default()
            .push(membership.member.clone());
        if membership.rank == GroupMemberRank::Owner {
            *self.owner_counts.entry(membership.group.clone()).or_default() += 1;
        }
        self.memberships.push(membership);
    }

    // ========================================================================
    // Engagement
    // ========================================================================

    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    pub(crate) fn record_reaction(&mut self, reaction: Reaction) {
        self.reactions.push(reaction);
    }

    pub(crate) fn record_response(&mut self, response: Response) {
        self.responses.push(response);
    }

    pub fn followers(&self, page: &str) -> &[PageId] {
        self.followers.get(page).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_following(&self, page: &str, profile: &str) -> bool {
        self.followers(page).iter().any(|f| f == profile)
    }

    pub fn followings(&self) -> &[Following] {
        &self.followings
    }

    pub(crate) fn record_following(&mut self, following: Following) {
        self.followers
            .entry(following.page.clone())
            .or_default()
            .push(following.follower.clone());
        self.followings.push(following);
    }

    pub fn is_subscribed(&self, content: &str, profile: &str) -> bool {
        self.subscribed
            .contains(&(content.to_string(), profile.to_string()))
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub(crate) fn record_subscription(&mut self, subscription: Subscription) {
        self.subscribed.insert((
            subscription.content.id.clone(),
            subscription.subscriber.clone(),
        ));
        self.subscriptions.push(subscription);
    }

    pub fn viewers(&self, post: &str) -> &[PageId] {
        self.viewers.get(post).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_viewed(&self, post: &str, profile: &str) -> bool {
        self.viewers(post).iter().any(|v| v == profile)
    }

    pub fn viewings(&self) -> &[Viewing] {
        &self.viewings
    }

    pub(crate) fn record_viewing(&mut self, viewing: Viewing) {
        self.viewers
            .entry(viewing.post.clone())
            .or_default()
            .push(viewing.viewer.clone());
        self.viewings.push(viewing);
    }

    // ========================================================================
    // Conversations
    // ========================================================================

    pub fn conversations(&self) -> &[MappedConversation] {
        &self.conversations
    }

    /// The mapped conversation a post or comment was created for.
    pub fn conversation_of(&self, content: &str) -> Option<&MappedConversation> {
        self.content_conversation
            .get(content)
            .map(|&i| &self.conversations[i])
    }

    pub(crate) fn record_conversation(&mut self, conversation: MappedConversation) {
        let index = self.conversations.len();
        for node in &conversation.nodes {
            self.content_conversation.insert(node.content.id.clone(), index);
        }
        self.conversations.push(conversation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relation(kind: SocialRelationKind, a: &str, b: &str) -> SocialRelation {
        SocialRelation {
            kind,
            persons: (a.to_string(), b.to_string()),
        }
    }

    #[test]
    fn pair_lookup_ignores_order() {
        let mut ledger = Ledger::new();
        ledger.record_social_relation(relation(SocialRelationKind::Friendship, "ann", "bob"));
        assert!(ledger.relation_between("bob", "ann").is_some());
        assert!(ledger.relation_between("ann", "cat").is_none());
        assert_eq!(ledger.partners("bob"), ["ann".to_string()]);
    }

    #[test]
    fn duplicate_pair_counts_but_keeps_partners_distinct() {
        let mut ledger = Ledger::new();
        ledger.record_social_relation(relation(SocialRelationKind::Friendship, "ann", "bob"));
        ledger.record_social_relation(relation(SocialRelationKind::Family, "bob", "ann"));
        assert_eq!(ledger.relation_count("ann"), 2);
        assert_eq!(ledger.partners("ann").len(), 1);
        assert_eq!(
            ledger.relation_between("ann", "bob").unwrap().kind,
            SocialRelationKind::Friendship
        );
    }

    #[test]
    fn parent_and_romantic_counts_track_roles() {
        let mut ledger = Ledger::new();
        ledger.record_social_relation(relation(SocialRelationKind::Parentship, "mum", "kid"));
        ledger.record_social_relation(relation(SocialRelationKind::Marriage, "mum", "dad"));
        assert_eq!(ledger.parent_count("kid"), 1);
        assert_eq!(ledger.parent_count("mum"), 0);
        assert_eq!(ledger.romantic_count("mum"), 1);
        assert_eq!(ledger.romantic_count("kid"), 0);
    }

    #[test]
    fn owner_tracking() {
        let mut ledger = Ledger::new();
        ledger.record_membership(GroupMembership {
            group: "grp-1".to_string(),
            member: "ann".to_string(),
            rank: GroupMemberRank::Owner,
        });
        ledger.record_membership(GroupMembership {
            group: "grp-1".to_string(),
            member: "bob".to_string(),
            rank: GroupMemberRank::Member,
        });
        assert!(ledger.has_owner("grp-1"));
        assert_eq!(ledger.owner_count("grp-1"), 1);
        assert!(ledger.is_member("grp-1", "bob"));
        assert!(!ledger.has_owner("grp-2"));
    }
}
