//! Conversation mapper: binds a template's local authors to concrete
//! profiles and replays the tree as posts and comments.

use rand::seq::index;
use serde::{Deserialize, Serialize};
use socialgraph_model::{
    ContentId, ContentKind, ContentRef, ConversationTemplate, MutationOp, NodeContent, PageId,
    PageKind, PostKind, TagMapping, TemplateError,
};
use tracing::{debug, info};

use crate::error::{GenerationError, Result};
use crate::generator::{pick, Generator};
use crate::ids::{self, Namespace};
use crate::registry::PageCategory;
use crate::specs::{CommentSpec, PostBody, PostSpec};

/// Where the root post of a conversation lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostingMode {
    /// On the root author's own page; commenters are people they know.
    #[serde(rename = "person-self")]
    SelfPage,
    /// On a group page; every participant is a member.
    #[serde(rename = "person-group")]
    Group,
}

#[derive(Debug, Clone)]
pub struct ConversationSpec {
    pub template: ConversationTemplate,
    pub mode: PostingMode,
    /// Display name of the host page: the person for `SelfPage`, the group
    /// for `Group`.
    pub page_name: Option<String>,
    pub place_name: Option<String>,
}

impl ConversationSpec {
    pub fn new(template: ConversationTemplate, mode: PostingMode) -> Self {
        Self {
            template,
            mode,
            page_name: None,
            place_name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedNode {
    pub local_id: String,
    pub content: ContentRef,
}

/// A template as it landed in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedConversation {
    pub reference: String,
    /// Page the root post was posted to.
    pub host: PageId,
    pub mapping: TagMapping,
    /// Template order; `nodes[0]` is the root post.
    pub nodes: Vec<MappedNode>,
    pub root_post: ContentId,
    /// Root author first, then the commenters in local-tag order.
    pub participants: Vec<PageId>,
}

impl MappedConversation {
    /// Global content id of a template node.
    pub fn global_id(&self, local_id: &str) -> Option<&str> {
        self.nodes
            .iter()
            .find(|node| node.local_id == local_id)
            .map(|node| node.content.id.as_str())
    }
}

/// Everything resolved before the first operation is built.
struct Plan {
    host: PageId,
    mapping: TagMapping,
    participants: Vec<PageId>,
    place: Option<String>,
    share_original: Option<ContentId>,
    content_ids: Vec<ContentId>,
}

impl Generator {
    /// Map a conversation template onto the graph.
    ///
    /// Participant selection, name resolution and the share original are all
    /// settled before anything is emitted; a failed mapping changes nothing.
    pub fn conversation(&mut self, spec: ConversationSpec) -> Result<Vec<MutationOp>> {
        let plan = self.plan_conversation(&spec)?;
        let template = &spec.template;

        let mut ops = Vec::new();
        let mut nodes = Vec::with_capacity(template.len());
        for (index, node) in template.nodes().iter().enumerate() {
            let id = plan.content_ids[index].clone();
            let author = plan
                .mapping
                .global(&node.author_tag)
                .map(str::to_string)
                .ok_or_else(|| GenerationError::not_found("participant", node.author_tag.as_str()))?;
            let text = node.globalised_body(&plan.mapping);
            let tags = node.globalised_tags(&plan.mapping);

            let kind = match (&node.content, node.parent) {
                (NodeContent::Post(kind), None) => {
                    let body = match kind {
                        PostKind::Text => PostBody::Text,
                        PostKind::Image => PostBody::Image,
                        PostKind::Video => PostBody::Video,
                        PostKind::LiveVideo => PostBody::LiveVideo,
                        PostKind::Share => PostBody::Share {
                            original: plan.share_original.clone().unwrap_or_default(),
                        },
                        PostKind::Poll => {
                            let poll = node.poll.clone().ok_or_else(|| TemplateError::MissingPoll {
                                reference: template.reference.clone(),
                            })?;
                            PostBody::Poll {
                                question: poll.question,
                                answers: poll.answers,
                            }
                        }
                    };
                    let mut post = PostSpec::new(&plan.host, &author, &text, body);
                    post.tags = tags;
                    post.id = Some(id.clone());
                    post.timestamp = node.timestamp;
                    post.location = plan.place.clone();
                    ops.extend(self.post(post)?);
                    ContentKind::Post
                }
                (_, parent) => {
                    let parent = parent.unwrap_or(0);
                    let mut comment =
                        CommentSpec::new(&plan.content_ids[parent], &author, &text);
                    comment.tags = tags;
                    comment.id = Some(id.clone());
                    comment.timestamp = node.timestamp;
                    ops.extend(self.comment(comment)?);
                    ContentKind::Comment
                }
            };
            nodes.push(MappedNode {
                local_id: node.local_id.clone(),
                content: ContentRef { kind, id },
            });
        }

        info!(
            reference = %template.reference,
            host = %plan.host,
            nodes = nodes.len(),
            "mapped conversation"
        );
        self.ledger.record_conversation(MappedConversation {
            reference: template.reference.clone(),
            host: plan.host,
            mapping: plan.mapping,
            root_post: plan.content_ids[0].clone(),
            nodes,
            participants: plan.participants,
        });
        Ok(ops)
    }

    fn plan_conversation(&mut self, spec: &ConversationSpec) -> Result<Plan> {
        let template = &spec.template;
        if template.is_empty() {
            return Err(GenerationError::ConstraintViolation(format!(
                "conversation `{}` has no nodes",
                template.reference
            )));
        }
        template
            .validate()
            .map_err(|offenders| GenerationError::ConversationIntegrity {
                reference: template.reference.clone(),
                offenders,
            })?;
        if template.root_kind() == PostKind::Poll && template.root().poll.is_none() {
            return Err(TemplateError::MissingPoll {
                reference: template.reference.clone(),
            }
            .into());
        }

        let commenters: Vec<String> = template.commenters().into_iter().map(str::to_string).collect();
        let (host, participants) = match spec.mode {
            PostingMode::SelfPage => self.self_page_participants(spec, commenters.len())?,
            PostingMode::Group => self.group_participants(spec, commenters.len() + 1)?,
        };

        let place = spec
            .place_name
            .as_deref()
            .map(|name| self.registry.place_by_name(name, None).map(|p| p.id.clone()))
            .transpose()?;

        let share_original = if template.root_kind() == PostKind::Share {
            let posts: Vec<ContentId> = self.registry.posts().map(|p| p.id.clone()).collect();
            Some(pick(&mut self.rng, &posts).ok_or_else(|| {
                GenerationError::exhausted(format!(
                    "conversation `{}` shares a post but none exist",
                    template.reference
                ))
            })?)
        } else {
            None
        };

        let mut mapping = TagMapping::new();
        mapping.bind(template.root_author(), participants[0].clone());
        for (local, global) in commenters.iter().zip(participants.iter().skip(1)) {
            mapping.bind(local.as_str(), global.clone());
        }

        let mut content_ids = Vec::with_capacity(template.len());
        for node in template.nodes() {
            let namespace = if node.is_root() {
                Namespace::Post
            } else {
                Namespace::Comment
            };
            let id = ids::token(&mut self.rng, namespace);
            self.registry.ensure_content_free(&id)?;
            if content_ids.contains(&id) {
                return Err(GenerationError::DuplicateIdentifier {
                    namespace: "content",
                    id,
                });
            }
            content_ids.push(id);
        }

        debug!(
            reference = %template.reference,
            host = %host,
            participants = participants.len(),
            "planned conversation"
        );
        Ok(Plan {
            host,
            mapping,
            participants,
            place,
            share_original,
            content_ids,
        })
    }

    /// Host person plus `commenters` distinct people related to them.
    fn self_page_participants(
        &mut self,
        spec: &ConversationSpec,
        commenters: usize,
    ) -> Result<(PageId, Vec<PageId>)> {
        let host = match &spec.page_name {
            Some(name) => {
                let host = self.registry.page_by_name(name, PageCategory::Person)?.id.clone();
                if self.ledger.partners(&host).len() < commenters {
                    return Err(GenerationError::exhausted(format!(
                        "{host} knows fewer than {commenters} people"
                    )));
                }
                host
            }
            None => {
                let hosts: Vec<PageId> = self
                    .registry
                    .persons()
                    .filter(|p| self.ledger.partners(&p.id).len() >= commenters)
                    .map(|p| p.id.clone())
                    .collect();
                pick(&mut self.rng, &hosts).ok_or_else(|| {
                    GenerationError::exhausted(format!(
                        "no person knows at least {commenters} people"
                    ))
                })?
            }
        };

        let partners = self.ledger.partners(&host);
        let drawn = index::sample(&mut self.rng, partners.len(), commenters);
        let mut participants = Vec::with_capacity(commenters + 1);
        participants.push(host.clone());
        participants.extend(drawn.iter().map(|i| partners[i].clone()));
        Ok((host, participants))
    }

    /// A group plus `needed` distinct person members; the first drawn
    /// authors the root post.
    fn group_participants(
        &mut self,
        spec: &ConversationSpec,
        needed: usize,
    ) -> Result<(PageId, Vec<PageId>)> {
        let group = match &spec.page_name {
            Some(name) => {
                let group = self.registry.page_by_name(name, PageCategory::Group)?.id.clone();
                if self.person_members(&group).len() < needed {
                    return Err(GenerationError::exhausted(format!(
                        "group {group} has fewer than {needed} person members"
                    )));
                }
                group
            }
            None => {
                let groups: Vec<PageId> = self
                    .registry
                    .groups()
                    .filter(|g| self.person_members(&g.id).len() >= needed)
                    .map(|g| g.id.clone())
                    .collect();
                pick(&mut self.rng, &groups).ok_or_else(|| {
                    GenerationError::exhausted(format!(
                        "no group has {needed} person members"
                    ))
                })?
            }
        };

        let members = self.person_members(&group);
        let drawn = index::sample(&mut self.rng, members.len(), needed);
        let participants = drawn.iter().map(|i| members[i].clone()).collect();
        Ok((group, participants))
    }

    fn person_members(&self, group: &str) -> Vec<PageId> {
        self.ledger
            .members(group)
            .iter()
            .filter(|member| {
                self.registry
                    .page(member)
                    .is_some_and(|page| page.kind == PageKind::Person)
            })
            .cloned()
            .collect()
    }
}
