//! Conversation templates: abstract post/comment trees.
//!
//! A template is authored as a nested JSON document (a post with nested
//! comments). [`ConversationTemplate::from_document`] flattens it into an
//! arena of nodes in pre-order, each holding the index of its parent, so the
//! mapper can walk it twice (allocate ids, then emit) without recursion.
//!
//! Authors are template-local tags (`@alice`), bound to real profiles only
//! when the template is mapped. Mention tags (`@name`) and topic tags
//! (`#name`) are derived from the body text, never authored separately.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::PageId;
use crate::tables::PostKind;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("conversation `{reference}`: poll post is missing its question or answers")]
    MissingPoll { reference: String },

    #[error("conversation `{reference}`: invalid timestamp `{value}`")]
    InvalidTimestamp { reference: String, value: String },

    #[error("conversation `{reference}`: empty author tag")]
    EmptyAuthor { reference: String },
}

fn mention_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@\w+").expect("mention pattern is valid"))
}

fn topic_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#\w+").expect("topic pattern is valid"))
}

fn sorted_matches(pattern: &Regex, text: &str) -> Vec<String> {
    pattern
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// ============================================================================
// Authored documents
// ============================================================================

/// One post or comment as written in a template file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationDocument {
    pub username: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub comments: Vec<ConversationDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<String>>,
}

// ============================================================================
// Flattened template
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSpec {
    pub question: String,
    pub answers: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "content", content = "post_kind", rename_all = "snake_case")]
pub enum NodeContent {
    Post(PostKind),
    Comment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationNode {
    /// Template-scoped identifier (`n0`, `n1`, ... in pre-order).
    pub local_id: String,
    /// Index of the parent node; `None` only for the root.
    pub parent: Option<usize>,
    pub content: NodeContent,
    pub author_tag: String,
    pub body: String,
    pub timestamp: Option<NaiveDateTime>,
    pub poll: Option<PollSpec>,
}

impl ConversationNode {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Distinct `@name` tags in the body, sorted.
    pub fn mention_tags(&self) -> Vec<String> {
        sorted_matches(mention_pattern(), &self.body)
    }

    /// Distinct `#name` tags in the body, sorted.
    pub fn topic_tags(&self) -> Vec<String> {
        sorted_matches(topic_pattern(), &self.body)
    }

    /// Mentions followed by topics.
    pub fn tags(&self) -> Vec<String> {
        let mut tags = self.mention_tags();
        tags.extend(self.topic_tags());
        tags
    }

    /// Body with every mapped `@local` token replaced by its global tag.
    pub fn globalised_body(&self, mapping: &TagMapping) -> String {
        mapping.globalise_body(&self.body)
    }

    /// [`Self::tags`] with mentions rewritten through `mapping`.
    pub fn globalised_tags(&self, mapping: &TagMapping) -> Vec<String> {
        mapping.globalise_tags(self.tags())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTemplate {
    pub reference: String,
    /// Pre-order; `nodes[0]` is the root and parents precede children.
    nodes: Vec<ConversationNode>,
}

fn parse_template_timestamp(reference: &str, raw: &str) -> Result<NaiveDateTime, TemplateError> {
    let trimmed = raw.trim().trim_end_matches('Z');
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| TemplateError::InvalidTimestamp {
            reference: reference.to_string(),
            value: raw.to_string(),
        })
}

fn normalise_author(reference: &str, raw: &str) -> Result<String, TemplateError> {
    let tag = raw.trim();
    let name = tag.trim_start_matches('@');
    if name.is_empty() {
        return Err(TemplateError::EmptyAuthor {
            reference: reference.to_string(),
        });
    }
    Ok(format!("@{name}"))
}

impl ConversationTemplate {
    /// Flatten a nested document into a pre-order arena.
    ///
    /// The root takes `root_kind`; every nested node is a comment. Poll roots
    /// must carry a question and at least one answer.
    pub fn from_document(
        reference: impl Into<String>,
        document: &ConversationDocument,
        root_kind: PostKind,
    ) -> Result<Self, TemplateError> {
        let reference = reference.into();
        let mut nodes: Vec<ConversationNode> = Vec::new();
        let mut stack: Vec<(&ConversationDocument, Option<usize>)> = vec![(document, None)];

        while let Some((doc, parent)) = stack.pop() {
            let index = nodes.len();
            let content = match parent {
                None => NodeContent::Post(root_kind),
                Some(_) => NodeContent::Comment,
            };

            let poll = if content == NodeContent::Post(PostKind::Poll) {
                match (&doc.question, &doc.answers) {
                    (Some(question), Some(answers)) if !answers.is_empty() => Some(PollSpec {
                        question: question.clone(),
                        answers: answers.clone(),
                    }),
                    _ => {
                        return Err(TemplateError::MissingPoll {
                            reference: reference.clone(),
                        })
                    }
                }
            } else {
                None
            };

            let timestamp = doc
                .timestamp
                .as_deref()
                .map(|raw| parse_template_timestamp(&reference, raw))
                .transpose()?;

            nodes.push(ConversationNode {
                local_id: format!("n{index}"),
                parent,
                content,
                author_tag: normalise_author(&reference, &doc.username)?,
                body: doc.body.clone(),
                timestamp,
                poll,
            });

            // Reverse so the first comment is popped (and numbered) first.
            for child in doc.comments.iter().rev() {
                stack.push((child, Some(index)));
            }
        }

        Ok(Self { reference, nodes })
    }

    pub fn nodes(&self) -> &[ConversationNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> &ConversationNode {
        &self.nodes[0]
    }

    pub fn root_kind(&self) -> PostKind {
        match self.root().content {
            NodeContent::Post(kind) => kind,
            // Unreachable through `from_document`; text is the neutral choice.
            NodeContent::Comment => PostKind::Text,
        }
    }

    pub fn root_author(&self) -> &str {
        &self.root().author_tag
    }

    pub fn parent_of(&self, index: usize) -> Option<&ConversationNode> {
        self.nodes
            .get(index)
            .and_then(|node| node.parent)
            .map(|parent| &self.nodes[parent])
    }

    pub fn children_of(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, node)| node.parent == Some(index))
            .map(|(i, _)| i)
    }

    /// Authors of every non-root node.
    pub fn comment_authors(&self) -> BTreeSet<&str> {
        self.nodes
            .iter()
            .skip(1)
            .map(|node| node.author_tag.as_str())
            .collect()
    }

    /// Root author plus every comment author.
    pub fn participants(&self) -> BTreeSet<&str> {
        let mut participants = self.comment_authors();
        participants.insert(self.root_author());
        participants
    }

    /// Comment authors other than the root author, sorted.
    pub fn commenters(&self) -> Vec<&str> {
        let root = self.root_author();
        self.comment_authors()
            .into_iter()
            .filter(|author| *author != root)
            .collect()
    }

    /// Every `@name` mentioned anywhere in the conversation.
    pub fn mentions(&self) -> BTreeSet<String> {
        self.nodes
            .iter()
            .flat_map(|node| node.mention_tags())
            .collect()
    }

    /// Every `#name` used anywhere in the conversation.
    pub fn topics(&self) -> BTreeSet<String> {
        self.nodes
            .iter()
            .flat_map(|node| node.topic_tags())
            .collect()
    }

    /// Mentions that do not name a participant. Empty for a well-formed
    /// template.
    pub fn non_participant_mentions(&self) -> Vec<String> {
        let participants = self.participants();
        self.mentions()
            .into_iter()
            .filter(|tag| !participants.contains(tag.as_str()))
            .collect()
    }

    /// Check that every mention names a participant; on failure returns the
    /// offending tags.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let offenders = self.non_participant_mentions();
        if offenders.is_empty() {
            Ok(())
        } else {
            Err(offenders)
        }
    }
}

// ============================================================================
// Local ↔ global author binding
// ============================================================================

/// Bidirectional binding between template-local author tags and global
/// profile identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagMapping {
    local_to_global: BTreeMap<String, PageId>,
    global_to_local: BTreeMap<PageId, String>,
}

impl TagMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `local` (`@alice`) to the profile `global`, replacing any
    /// previous binding of either side.
    pub fn bind(&mut self, local: impl Into<String>, global: impl Into<PageId>) {
        let local = local.into();
        let global = global.into();
        if let Some(previous) = self.local_to_global.remove(&local) {
            self.global_to_local.remove(&previous);
        }
        if let Some(previous) = self.global_to_local.remove(&global) {
            self.local_to_global.remove(&previous);
        }
        self.local_to_global.insert(local.clone(), global.clone());
        self.global_to_local.insert(global, local);
    }

    /// Profile identifier bound to a local tag.
    pub fn global(&self, local: &str) -> Option<&str> {
        self.local_to_global.get(local).map(String::as_str)
    }

    /// Local tag bound to a profile identifier.
    pub fn local(&self, global: &str) -> Option<&str> {
        self.global_to_local.get(global).map(String::as_str)
    }

    /// `@{global}` for a bound local tag.
    pub fn global_tag(&self, local: &str) -> Option<String> {
        self.global(local).map(|global| format!("@{global}"))
    }

    /// Rewrite every bound `@local` token in `body` to its global tag.
    ///
    /// Substitution is per whole token: `@bob` never rewrites part of
    /// `@bobby`. Unbound tokens are left alone.
    pub fn globalise_body(&self, body: &str) -> String {
        mention_pattern()
            .replace_all(body, |caps: &Captures<'_>| {
                let local = &caps[0];
                self.global_tag(local).unwrap_or_else(|| local.to_string())
            })
            .into_owned()
    }

    /// Rewrite mention tags through the mapping; topic tags pass through.
    pub fn globalise_tags<I>(&self, tags: I) -> Vec<String>
    where
        I: IntoIterator<Item = String>,
    {
        tags.into_iter()
            .map(|tag| self.global_tag(&tag).unwrap_or(tag))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.local_to_global.len()
    }

    pub fn is_empty(&self) -> bool {
        self.local_to_global.is_empty()
    }

    pub fn profiles(&self) -> impl Iterator<Item = &str> {
        self.local_to_global.values().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.local_to_global
            .iter()
            .map(|(local, global)| (local.as_str(), global.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(username: &str, body: &str, comments: Vec<ConversationDocument>) -> ConversationDocument {
        ConversationDocument {
            username: username.to_string(),
            body: body.to_string(),
            timestamp: None,
            comments,
            question: None,
            answers: None,
        }
    }

    fn sample() -> ConversationTemplate {
        let document = doc(
            "@alice",
            "Anyone up for #hiking this weekend?",
            vec![
                doc(
                    "@bob",
                    "@alice count me in",
                    vec![doc("@alice", "@bob great, bring @carol #hiking", vec![])],
                ),
                doc("@carol", "Sure!", vec![]),
            ],
        );
        ConversationTemplate::from_document("hike", &document, PostKind::Text).unwrap()
    }

    #[test]
    fn flattens_in_pre_order_with_parent_indices() {
        let template = sample();
        let parents: Vec<_> = template.nodes().iter().map(|n| n.parent).collect();
        assert_eq!(parents, vec![None, Some(0), Some(1), Some(0)]);
        assert_eq!(template.nodes()[1].author_tag, "@bob");
        assert_eq!(template.nodes()[3].author_tag, "@carol");
        assert_eq!(template.root_kind(), PostKind::Text);
        assert_eq!(template.children_of(0).collect::<Vec<_>>(), vec![1, 3]);
        assert!(matches!(template.nodes()[2].content, NodeContent::Comment));
    }

    #[test]
    fn participants_and_commenters() {
        let template = sample();
        let participants: Vec<_> = template.participants().into_iter().collect();
        assert_eq!(participants, vec!["@alice", "@bob", "@carol"]);
        assert_eq!(template.commenters(), vec!["@bob", "@carol"]);
        assert!(template.validate().is_ok());
    }

    #[test]
    fn detects_mentions_of_non_participants() {
        let document = doc("@alice", "hi @dave and @bob", vec![doc("@bob", "hey", vec![])]);
        let template =
            ConversationTemplate::from_document("bad", &document, PostKind::Text).unwrap();
        assert_eq!(template.validate(), Err(vec!["@dave".to_string()]));
    }

    #[test]
    fn tags_are_sorted_and_deduplicated() {
        let template = sample();
        let node = &template.nodes()[2];
        assert_eq!(node.tags(), vec!["@bob", "@carol", "#hiking"]);
    }

    #[test]
    fn globalisation_rewrites_whole_tokens_only() {
        let document = doc("@bob", "@bob and @bobby said hi to @bo", vec![]);
        let template = ConversationTemplate::from_document("x", &document, PostKind::Text).unwrap();
        let mut mapping = TagMapping::new();
        mapping.bind("@bob", "BobSmith123");
        mapping.bind("@bo", "BoLee004");
        let body = template.root().globalised_body(&mapping);
        assert_eq!(body, "@BobSmith123 and @bobby said hi to @BoLee004");
        assert_eq!(
            template.root().globalised_tags(&mapping),
            vec!["@BoLee004", "@BobSmith123", "@bobby"]
        );
    }

    #[test]
    fn poll_root_requires_question_and_answers() {
        let mut document = doc("@alice", "Vote!", vec![]);
        let err = ConversationTemplate::from_document("poll", &document, PostKind::Poll);
        assert!(matches!(err, Err(TemplateError::MissingPoll { .. })));

        document.question = Some("Tea or coffee?".to_string());
        document.answers = Some(vec!["Tea".to_string(), "Coffee".to_string()]);
        let template =
            ConversationTemplate::from_document("poll", &document, PostKind::Poll).unwrap();
        assert_eq!(template.root().poll.as_ref().unwrap().answers.len(), 2);
    }

    #[test]
    fn timestamps_accept_zulu_and_fractional_forms() {
        let mut document = doc("alice", "hi", vec![]);
        document.timestamp = Some("2023-04-05T06:07:08Z".to_string());
        let mut reply = doc("bob", "yo", vec![]);
        reply.timestamp = Some("2023-04-05T06:09:00.250".to_string());
        document.comments.push(reply);

        let template = ConversationTemplate::from_document("t", &document, PostKind::Text).unwrap();
        assert_eq!(template.root_author(), "@alice");
        let reply_ts = template.nodes()[1].timestamp.unwrap();
        assert_eq!(reply_ts.format("%H:%M:%S%.3f").to_string(), "06:09:00.250");

        let mut broken = doc("alice", "hi", vec![]);
        broken.timestamp = Some("yesterday".to_string());
        assert!(matches!(
            ConversationTemplate::from_document("t", &broken, PostKind::Text),
            Err(TemplateError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn mapping_is_bidirectional() {
        let mut mapping = TagMapping::new();
        mapping.bind("@alice", "AliceW001");
        mapping.bind("@bob", "BobK002");
        assert_eq!(mapping.global("@alice"), Some("AliceW001"));
        assert_eq!(mapping.local("BobK002"), Some("@bob"));

        mapping.bind("@alice", "BobK002");
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.local("AliceW001"), None);
    }
}
