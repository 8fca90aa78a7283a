//! Engagement: reactions, poll responses, followings, subscriptions and
//! viewings, single and bulk.
//!
//! Bulk passes walk the ledger in insertion order and skip anything already
//! recorded, so running one twice emits nothing the second time.

use socialgraph_model::{
    choose_any, ContentKind, ContentRef, Emoji, EntityRef, Fields, Following, MutationOp, PageId,
    Reaction, Response, RolePlayer, Subscription, Viewing,
};
use tracing::debug;

use crate::error::{GenerationError, Result};
use crate::generator::{millis_stamp, page_ref, pick, Generator};
use crate::specs::{FollowingSpec, ReactionSpec, ResponseSpec, SubscriptionSpec, ViewingSpec};

impl Generator {
    fn profile_ids(&self) -> Vec<PageId> {
        self.registry.profiles().map(|p| p.id.clone()).collect()
    }

    /// Profiles a default target is sampled against: just the explicit one
    /// when given, otherwise all of them.
    fn candidate_profiles(&self, explicit: Option<&PageId>) -> Vec<PageId> {
        match explicit {
            Some(id) => vec![id.clone()],
            None => self.profile_ids(),
        }
    }

    fn random_profile(&mut self, explicit: Option<PageId>) -> Result<PageId> {
        match explicit {
            Some(id) => Ok(self.profile(&id)?.id),
            None => {
                let profiles = self.profile_ids();
                pick(&mut self.rng, &profiles)
                    .ok_or_else(|| GenerationError::exhausted("no profiles exist"))
            }
        }
    }

    fn post_ref(&self, id: &str) -> Result<EntityRef> {
        let post = self
            .registry
            .post(id)
            .ok_or_else(|| GenerationError::not_found("post", id))?;
        Ok(EntityRef::new(post.kind.label(), &post.id))
    }

    // ========================================================================
    // Reactions and responses
    // ========================================================================

    /// An emoji reaction on a post or comment, no earlier than the content.
    pub fn reaction(&mut self, spec: ReactionSpec) -> Result<Vec<MutationOp>> {
        let content = match spec.content {
            Some(id) => self
                .registry
                .content(&id)
                .ok_or_else(|| GenerationError::not_found("content", id.as_str()))?,
            None => {
                let contents: Vec<ContentRef> = self.registry.contents().collect();
                pick(&mut self.rng, &contents)
                    .ok_or_else(|| GenerationError::exhausted("no content to react to"))?
            }
        };
        let author = self.random_profile(spec.author)?;
        let emoji = match spec.emoji {
            Some(emoji) => emoji,
            None => choose_any(&mut self.rng).unwrap_or(Emoji::Like),
        };
        let created = match spec.timestamp {
            Some(value) => millis_stamp(value),
            None => {
                let after = self
                    .content_created_at(&content)
                    .unwrap_or(self.ranges.content.start());
                self.ranges.content.starting_at(after).sample(&mut self.rng)
            }
        };

        let author_page = self.profile(&author)?;
        let ops = vec![MutationOp::relation(
            "reaction",
            vec![
                RolePlayer::new("parent", self.content_entity(&content)),
                RolePlayer::new("author", page_ref(&author_page)),
            ],
            Fields::new()
                .text("emoji", emoji.label())
                .timestamp("creation-timestamp", created.render()),
        )];

        debug!(content = %content.id, author = %author, emoji = emoji.label(), "reaction");
        self.ledger.record_reaction(Reaction { content, author });
        Ok(ops)
    }

    /// A poll answer, no earlier than the poll post.
    pub fn response(&mut self, spec: ResponseSpec) -> Result<Vec<MutationOp>> {
        let poll = match spec.poll {
            Some(id) => self
                .registry
                .poll(&id)
                .cloned()
                .ok_or_else(|| GenerationError::not_found("poll", id.as_str()))?,
            None => {
                let polls: Vec<_> = self.registry.polls().cloned().collect();
                pick(&mut self.rng, &polls)
                    .ok_or_else(|| GenerationError::exhausted("no polls to answer"))?
            }
        };
        let author = self.random_profile(spec.author)?;
        let answer = match spec.answer {
            Some(answer) if poll.answers.contains(&answer) => answer,
            Some(answer) => {
                return Err(GenerationError::ConstraintViolation(format!(
                    "`{answer}` is not an answer of poll {}",
                    poll.id
                )))
            }
            None => pick(&mut self.rng, &poll.answers).ok_or_else(|| {
                GenerationError::exhausted(format!("poll {} has no answers", poll.id))
            })?,
        };
        let content = ContentRef {
            kind: ContentKind::Post,
            id: poll.id.clone(),
        };
        let created = match spec.timestamp {
            Some(value) => millis_stamp(value),
            None => {
                let after = self
                    .content_created_at(&content)
                    .unwrap_or(self.ranges.content.start());
                self.ranges.content.starting_at(after).sample(&mut self.rng)
            }
        };

        let author_page = self.profile(&author)?;
        let ops = vec![MutationOp::relation(
            "response",
            vec![
                RolePlayer::new("poll", self.post_ref(&poll.id)?),
                RolePlayer::new("author", page_ref(&author_page)),
            ],
            Fields::new()
                .text("answer", answer)
                .timestamp("creation-timestamp", created.render()),
        )];

        debug!(poll = %poll.id, author = %author, "response");
        self.ledger.record_response(Response {
            poll: poll.id,
            author,
        });
        Ok(ops)
    }

    // ========================================================================
    // Followings
    // ========================================================================

    fn can_follow(&self, page: &str, follower: &str) -> bool {
        page != follower && !self.ledger.is_following(page, follower)
    }

    fn following_op(&self, page: &str, follower: &str) -> Result<MutationOp> {
        let page = self
            .registry
            .page(page)
            .ok_or_else(|| GenerationError::not_found("page", page))?;
        let follower = self.profile(follower)?;
        Ok(MutationOp::relation(
            "following",
            vec![
                RolePlayer::new("page", page_ref(page)),
                RolePlayer::new("follower", page_ref(&follower)),
            ],
            Fields::new(),
        ))
    }

    fn record_following(&mut self, page: &str, follower: &str) {
        self.ledger.record_following(Following {
            page: page.to_string(),
            follower: follower.to_string(),
        });
    }

    /// A profile following a page; a page never follows itself and a
    /// following is never recorded twice.
    pub fn following(&mut self, spec: FollowingSpec) -> Result<Vec<MutationOp>> {
        let profiles = self.candidate_profiles(spec.follower.as_ref());
        let page = match spec.page {
            Some(id) => {
                self.registry
                    .page(&id)
                    .ok_or_else(|| GenerationError::not_found("page", id.as_str()))?;
                id
            }
            None => {
                let candidates: Vec<PageId> = self
                    .registry
                    .pages()
                    .filter(|page| profiles.iter().any(|p| self.can_follow(&page.id, p)))
                    .map(|page| page.id.clone())
                    .collect();
                pick(&mut self.rng, &candidates)
                    .ok_or_else(|| GenerationError::exhausted("every page is followed by every profile"))?
            }
        };
        let follower = match spec.follower {
            Some(id) => {
                if !self.can_follow(&page, &id) {
                    return Err(GenerationError::ConstraintViolation(format!(
                        "{id} cannot follow {page}"
                    )));
                }
                id
            }
            None => {
                let candidates: Vec<PageId> = profiles
                    .into_iter()
                    .filter(|p| self.can_follow(&page, p))
                    .collect();
                pick(&mut self.rng, &candidates).ok_or_else(|| {
                    GenerationError::exhausted(format!("every profile already follows {page}"))
                })?
            }
        };

        let op = self.following_op(&page, &follower)?;
        debug!(page = %page, follower = %follower, "following");
        self.record_following(&page, &follower);
        Ok(vec![op])
    }

    fn follow_all(&mut self, pairs: Vec<(PageId, PageId)>) -> Result<Vec<MutationOp>> {
        let mut ops = Vec::new();
        for (page, follower) in pairs {
            if !self.can_follow(&page, &follower) {
                continue;
            }
            ops.push(self.following_op(&page, &follower)?);
            self.record_following(&page, &follower);
        }
        Ok(ops)
    }

    /// Both people of every social relation follow each other.
    pub fn relation_followings(&mut self) -> Result<Vec<MutationOp>> {
        let pairs: Vec<(PageId, PageId)> = self
            .ledger
            .social_relations()
            .iter()
            .flat_map(|relation| {
                let (first, second) = relation.persons.clone();
                [(first.clone(), second.clone()), (second, first)]
            })
            .collect();
        let ops = self.follow_all(pairs)?;
        debug!(count = ops.len(), "relation followings");
        Ok(ops)
    }

    /// Every group member follows the group.
    pub fn member_followings(&mut self) -> Result<Vec<MutationOp>> {
        let pairs: Vec<(PageId, PageId)> = self
            .ledger
            .memberships()
            .iter()
            .map(|membership| (membership.group.clone(), membership.member.clone()))
            .collect();
        let ops = self.follow_all(pairs)?;
        debug!(count = ops.len(), "member followings");
        Ok(ops)
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    fn subscription_op(&self, content: &ContentRef, subscriber: &str) -> Result<MutationOp> {
        let subscriber = self.profile(subscriber)?;
        Ok(MutationOp::relation(
            "subscription",
            vec![
                RolePlayer::new("content", self.content_entity(content)),
                RolePlayer::new("subscriber", page_ref(&subscriber)),
            ],
            Fields::new(),
        ))
    }

    pub fn subscription(&mut self, spec: SubscriptionSpec) -> Result<Vec<MutationOp>> {
        let profiles = self.candidate_profiles(spec.subscriber.as_ref());
        let content = match spec.content {
            Some(id) => self
                .registry
                .content(&id)
                .ok_or_else(|| GenerationError::not_found("content", id.as_str()))?,
            None => {
                let contents: Vec<ContentRef> = self
                    .registry
                    .contents()
                    .filter(|c| profiles.iter().any(|p| !self.ledger.is_subscribed(&c.id, p)))
                    .collect();
                pick(&mut self.rng, &contents)
                    .ok_or_else(|| GenerationError::exhausted("every profile is subscribed to everything"))?
            }
        };
        let subscriber = match spec.subscriber {
            Some(id) => {
                if self.ledger.is_subscribed(&content.id, &id) {
                    return Err(GenerationError::ConstraintViolation(format!(
                        "{id} is already subscribed to {}",
                        content.id
                    )));
                }
                id
            }
            None => {
                let candidates: Vec<PageId> = profiles
                    .into_iter()
                    .filter(|p| !self.ledger.is_subscribed(&content.id, p))
                    .collect();
                pick(&mut self.rng, &candidates).ok_or_else(|| {
                    GenerationError::exhausted(format!("every profile subscribes to {}", content.id))
                })?
            }
        };

        let op = self.subscription_op(&content, &subscriber)?;
        debug!(content = %content.id, subscriber = %subscriber, "subscription");
        self.ledger.record_subscription(Subscription {
            content,
            subscriber,
        });
        Ok(vec![op])
    }

    /// Every author subscribes to each post and comment they wrote.
    pub fn content_subscriptions(&mut self) -> Result<Vec<MutationOp>> {
        let pairs: Vec<(ContentRef, PageId)> = self
            .registry
            .contents()
            .filter_map(|content| {
                let author = self.registry.content_author(&content)?.to_string();
                Some((content, author))
            })
            .collect();

        let mut ops = Vec::new();
        for (content, author) in pairs {
            if self.ledger.is_subscribed(&content.id, &author) {
                continue;
            }
            ops.push(self.subscription_op(&content, &author)?);
            self.ledger.record_subscription(Subscription {
                content,
                subscriber: author,
            });
        }
        debug!(count = ops.len(), "content subscriptions");
        Ok(ops)
    }

    // ========================================================================
    // Viewings
    // ========================================================================

    fn can_view(&self, post: &str, viewer: &str) -> bool {
        let author = self.registry.post(post).map(|p| p.author.as_str());
        author != Some(viewer) && !self.ledger.has_viewed(post, viewer)
    }

    fn viewing_op(&self, post: &str, viewer: &str) -> Result<MutationOp> {
        let viewer = self.profile(viewer)?;
        Ok(MutationOp::relation(
            "viewing",
            vec![
                RolePlayer::new("viewed", self.post_ref(post)?),
                RolePlayer::new("viewer", page_ref(&viewer)),
            ],
            Fields::new(),
        ))
    }

    fn record_viewing(&mut self, post: &str, viewer: &str) {
        self.ledger.record_viewing(Viewing {
            post: post.to_string(),
            viewer: viewer.to_string(),
        });
    }

    /// A profile other than the author viewing a post, at most once.
    pub fn viewing(&mut self, spec: ViewingSpec) -> Result<Vec<MutationOp>> {
        let profiles = self.candidate_profiles(spec.viewer.as_ref());
        let post = match spec.post {
            Some(id) => {
                self.post_ref(&id)?;
                id
            }
            None => {
                let candidates: Vec<PageId> = self
                    .registry
                    .posts()
                    .filter(|post| profiles.iter().any(|p| self.can_view(&post.id, p)))
                    .map(|post| post.id.clone())
                    .collect();
                pick(&mut self.rng, &candidates)
                    .ok_or_else(|| GenerationError::exhausted("every post is viewed by every profile"))?
            }
        };
        let viewer = match spec.viewer {
            Some(id) => {
                if self.ledger.has_viewed(&post, &id) {
                    return Err(GenerationError::ConstraintViolation(format!(
                        "{id} has already viewed {post}"
                    )));
                }
                id
            }
            None => {
                let candidates: Vec<PageId> = profiles
                    .into_iter()
                    .filter(|p| self.can_view(&post, p))
                    .collect();
                pick(&mut self.rng, &candidates).ok_or_else(|| {
                    GenerationError::exhausted(format!("every profile has viewed {post}"))
                })?
            }
        };

        let op = self.viewing_op(&post, &viewer)?;
        debug!(post = %post, viewer = %viewer, "viewing");
        self.record_viewing(&post, &viewer);
        Ok(vec![op])
    }

    /// Bulk viewings skip anything already viewed, and the post's author
    /// unless `include_author` is set.
    fn view_all(
        &mut self,
        pairs: Vec<(PageId, PageId)>,
        include_author: bool,
    ) -> Result<Vec<MutationOp>> {
        let mut ops = Vec::new();
        for (post, viewer) in pairs {
            let allowed = if include_author {
                !self.ledger.has_viewed(&post, &viewer)
            } else {
                self.can_view(&post, &viewer)
            };
            if !allowed {
                continue;
            }
            ops.push(self.viewing_op(&post, &viewer)?);
            self.record_viewing(&post, &viewer);
        }
        Ok(ops)
    }

    /// Every participant of a mapped conversation views its root post, the
    /// root's own author included.
    pub fn participant_viewings(&mut self) -> Result<Vec<MutationOp>> {
        let pairs: Vec<(PageId, PageId)> = self
            .ledger
            .conversations()
            .iter()
            .flat_map(|conversation| {
                conversation
                    .participants
                    .iter()
                    .map(|p| (conversation.root_post.clone(), p.clone()))
            })
            .collect();
        let ops = self.view_all(pairs, true)?;
        debug!(count = ops.len(), "participant viewings");
        Ok(ops)
    }

    /// Whoever reacted to conversation content views the conversation's
    /// root post.
    pub fn reaction_viewings(&mut self) -> Result<Vec<MutationOp>> {
        let pairs: Vec<(PageId, PageId)> = self
            .ledger
            .reactions()
            .iter()
            .filter_map(|reaction| {
                let conversation = self.ledger.conversation_of(&reaction.content.id)?;
                Some((conversation.root_post.clone(), reaction.author.clone()))
            })
            .collect();
        let ops = self.view_all(pairs, false)?;
        debug!(count = ops.len(), "reaction viewings");
        Ok(ops)
    }

    /// Every poll responder views the poll.
    pub fn response_viewings(&mut self) -> Result<Vec<MutationOp>> {
        let pairs: Vec<(PageId, PageId)> = self
            .ledger
            .responses()
            .iter()
            .map(|response| (response.poll.clone(), response.author.clone()))
            .collect();
        let ops = self.view_all(pairs, false)?;
        debug!(count = ops.len(), "response viewings");
        Ok(ops)
    }
}
