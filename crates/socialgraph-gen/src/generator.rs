//! Generation façade.
//!
//! Every public operation follows the same shape:
//!
//! 1. resolve explicit overrides and sample everything else,
//! 2. run every hard check,
//! 3. build the mutation operations,
//! 4. update the registry and ledger once, and flush any soft diagnostics.
//!
//! A hard failure returns before step 4, so the generator state is exactly
//! what it was before the call.
//!
//! Conversation mapping lives in `mapper`, engagement (reactions, responses,
//! followings, subscriptions, viewings) in `engagement`.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use socialgraph_model::{
    choose, choose_any, ContentKind, ContentRef, EmailDomain, Education, Employment, EntityRef,
    Fields, Gender, GroupMemberRank, GroupMembership, MutationOp, NameTables, Page, PageKind,
    Place, PlaceKind, Post, RelationshipStatus, RolePlayer, SocialRelation, SocialRelationKind,
    Weighted,
};
use tracing::debug;

use crate::config::{GeneratorConfig, OverridePolicy, Ranges};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::{GenerationError, Result};
use crate::ids::{self, Namespace, UsernamePolicy};
use crate::ledger::Ledger;
use crate::registry::{PageCategory, Registry};
use crate::specs::{
    EducationSpec, EmploymentSpec, GroupSpec, MembershipSpec, OrganisationSpec, PersonSpec,
    PlaceSpec, PostBody, PostSpec, CommentSpec, SocialRelationSpec,
};
use crate::timestamps::{parse_datetime, Precision, Timestamp};

pub(crate) fn pick<T: Clone>(rng: &mut ChaCha8Rng, items: &[T]) -> Option<T> {
    items.choose(rng).cloned()
}

pub(crate) fn page_ref(page: &Page) -> EntityRef {
    EntityRef::new(page.kind.label(), page.id.clone())
}

pub(crate) fn place_ref(place: &Place) -> EntityRef {
    EntityRef::new(place.kind.label(), place.id.clone())
}

fn date_stamp(date: NaiveDate) -> Timestamp {
    Timestamp::new(date.and_time(NaiveTime::MIN), Precision::Date)
}

pub(crate) fn millis_stamp(value: NaiveDateTime) -> Timestamp {
    Timestamp::new(value, Precision::Millisecond)
}

/// The single owner of all generation state.
pub struct Generator {
    pub(crate) config: GeneratorConfig,
    pub(crate) ranges: Ranges,
    pub(crate) names: NameTables,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) registry: Registry,
    pub(crate) ledger: Ledger,
    pub(crate) diagnostics: Diagnostics,
}

impl Generator {
    pub fn new(config: GeneratorConfig, names: NameTables) -> Result<Self> {
        let ranges = config.ranges.parse()?;
        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            ranges,
            names,
            registry: Registry::new(),
            ledger: Ledger::new(),
            diagnostics: Diagnostics::new(),
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn ranges(&self) -> &Ranges {
        &self.ranges
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.drain()
    }

    // ========================================================================
    // Shared helpers
    // ========================================================================

    /// Apply the override policy to a default-only invariant an explicit
    /// override breaks.
    pub(crate) fn soft_violation(
        &self,
        pending: &mut Diagnostics,
        kind: DiagnosticKind,
        message: String,
    ) -> Result<()> {
        match self.config.override_policy {
            OverridePolicy::Strict => Err(GenerationError::ConstraintViolation(message)),
            OverridePolicy::Warn => {
                pending.push(kind, message);
                Ok(())
            }
        }
    }

    fn username_policy(&self) -> UsernamePolicy {
        UsernamePolicy {
            suffix_digits: self.config.username_suffix_digits,
            max_attempts: self.config.username_max_attempts,
        }
    }

    pub(crate) fn lookup_place(&self, id: &str) -> Result<Place> {
        self.registry
            .place(id)
            .cloned()
            .ok_or_else(|| GenerationError::not_found("place", id))
    }

    /// The explicit place, or a random place of `kind`.
    pub(crate) fn place_or_random(&mut self, explicit: Option<&str>, kind: PlaceKind) -> Result<Place> {
        if let Some(id) = explicit {
            return self.lookup_place(id);
        }
        let candidates: Vec<&Place> = self.registry.places_of_kind(kind).collect();
        candidates
            .choose(&mut self.rng)
            .map(|place| (*place).clone())
            .ok_or_else(|| GenerationError::exhausted(format!("no {} places exist", kind.label())))
    }

    pub(crate) fn profile(&self, id: &str) -> Result<Page> {
        self.registry
            .page_in(id, PageCategory::Profile)
            .cloned()
    }

    /// Entity reference for a post (by its variant) or a comment.
    pub(crate) fn content_entity(&self, content: &ContentRef) -> EntityRef {
        let kind = match content.kind {
            ContentKind::Post => self
                .registry
                .post(&content.id)
                .map_or("post", |post| post.kind.label()),
            ContentKind::Comment => ContentKind::Comment.label(),
        };
        EntityRef::new(kind, content.id.clone())
    }

    pub(crate) fn content_created_at(&self, content: &ContentRef) -> Option<NaiveDateTime> {
        self.registry
            .content_timestamp(content)
            .and_then(parse_datetime)
    }

    // ========================================================================
    // Places
    // ========================================================================

    /// A place plus its `{kind}-location` link to the parent.
    pub fn place(&mut self, spec: PlaceSpec) -> Result<Vec<MutationOp>> {
        let id = match spec.id {
            Some(id) => id,
            None => ids::token(&mut self.rng, Namespace::Place),
        };
        self.registry.ensure_place_free(&id)?;

        let parent = match (&spec.parent, spec.kind) {
            (Some(parent), _) => Some(self.lookup_place(parent)?),
            (None, PlaceKind::Landmark) => Some(self.place_or_random(None, PlaceKind::City)?),
            (None, _) => None,
        };

        let kind = spec.kind;
        let place = Place {
            kind,
            id: id.clone(),
            name: spec.name.clone(),
            parent: parent.as_ref().map(|p| p.id.clone()),
        };

        let fields = Fields::new()
            .text("place-id", &id)
            .text("name", &spec.name)
            .texts("language", spec.languages);
        let mut ops = vec![MutationOp::entity(kind.label(), &id, fields)];
        if let Some(parent) = &parent {
            ops.push(MutationOp::relation(
                kind.location_relation(),
                vec![
                    RolePlayer::new(kind.parent_role(), place_ref(parent)),
                    RolePlayer::new(kind.child_role(), place_ref(&place)),
                ],
                Fields::new(),
            ));
        }

        debug!(kind = kind.label(), id = %id, name = %spec.name, "place");
        self.registry.register_place(place)?;
        Ok(ops)
    }

    // ========================================================================
    // Pages
    // ========================================================================

    /// A person with a sampled identity, a home location and a birth record.
    pub fn person(&mut self, spec: PersonSpec) -> Result<Vec<MutationOp>> {
        let location = self.place_or_random(spec.location.as_deref(), PlaceKind::City)?;
        let birth_place = self.place_or_random(spec.birth_place.as_deref(), PlaceKind::City)?;

        let gender = match spec.gender {
            Some(gender) => gender,
            None => choose_any(&mut self.rng).unwrap_or(Gender::Female),
        };
        let name = match spec.name {
            Some(name) => name,
            None => self
                .names
                .full_name(&mut self.rng, gender)
                .ok_or_else(|| GenerationError::exhausted("name tables are empty"))?,
        };

        let mut pending = Diagnostics::new();
        let username = match spec.username {
            Some(username) => {
                self.registry.ensure_page_free(&username)?;
                username
            }
            None => {
                let policy = self.username_policy();
                let registry = &self.registry;
                ids::username(
                    &mut self.rng,
                    &name,
                    |candidate| registry.is_username_taken(candidate),
                    registry.person_count(),
                    policy,
                    &mut pending,
                )?
            }
        };

        let email = match spec.email {
            Some(email) => email,
            None => {
                let domain = choose_any(&mut self.rng).unwrap_or(EmailDomain::Google);
                format!("{username}@{}", domain.label())
            }
        };
        let picture = ids::token(&mut self.rng, Namespace::Media);
        let birth_date = match spec.birth_date {
            Some(date) => date_stamp(date),
            None => self.ranges.birth.sample(&mut self.rng),
        };

        let page = Page {
            kind: PageKind::Person,
            id: username.clone(),
            name: name.clone(),
        };
        let person = page_ref(&page);

        let fields = Fields::new()
            .text("username", &username)
            .text("name", &name)
            .maybe_text("bio", spec.bio)
            .text("profile-picture", picture)
            .text("gender", gender.label())
            .text("email", email)
            .flag("is-active", spec.flags.is_active)
            .flag("is-visible", spec.flags.is_visible)
            .flag("can-publish", spec.flags.can_publish)
            .text("page-visibility", spec.page_visibility.label())
            .text("post-visibility", spec.post_visibility.label())
            .texts("language", spec.languages);

        let ops = vec![
            MutationOp::entity(PageKind::Person.label(), &username, fields),
            MutationOp::relation(
                "location",
                vec![
                    RolePlayer::new("place", place_ref(&location)),
                    RolePlayer::new("located", person.clone()),
                ],
                Fields::new(),
            ),
            MutationOp::relation(
                "birth",
                vec![
                    RolePlayer::new("born", person),
                    RolePlayer::new("place", place_ref(&birth_place)),
                ],
                Fields::new().date("birth-date", birth_date.render()),
            ),
        ];

        debug!(username = %username, name = %name, "person");
        self.registry.register_page(page)?;
        self.diagnostics.absorb(pending);
        Ok(ops)
    }

    /// An organisation page; its username is the name without whitespace.
    pub fn organisation(&mut self, spec: OrganisationSpec) -> Result<Vec<MutationOp>> {
        let username: String = spec.name.split_whitespace().collect();
        self.registry.ensure_page_free(&username)?;
        let location = self.place_or_random(spec.location.as_deref(), PlaceKind::City)?;
        let picture = ids::token(&mut self.rng, Namespace::Media);
        let kind = spec.kind.page_kind();

        let page = Page {
            kind,
            id: username.clone(),
            name: spec.name.clone(),
        };
        let fields = Fields::new()
            .text("username", &username)
            .text("name", &spec.name)
            .text("bio", spec.bio)
            .text("profile-picture", picture)
            .flag("is-active", spec.flags.is_active)
            .flag("is-visible", spec.flags.is_visible)
            .flag("can-publish", spec.flags.can_publish)
            .texts("tag", spec.tags);
        let ops = vec![
            MutationOp::entity(kind.label(), &username, fields),
            MutationOp::relation(
                "location",
                vec![
                    RolePlayer::new("place", place_ref(&location)),
                    RolePlayer::new("located", page_ref(&page)),
                ],
                Fields::new(),
            ),
        ];

        debug!(kind = kind.label(), username = %username, "organisation");
        self.registry.register_page(page)?;
        Ok(ops)
    }

    pub fn group(&mut self, spec: GroupSpec) -> Result<Vec<MutationOp>> {
        let id = match spec.id {
            Some(id) => id,
            None => ids::token(&mut self.rng, Namespace::Group),
        };
        self.registry.ensure_page_free(&id)?;
        let picture = ids::token(&mut self.rng, Namespace::Media);

        let fields = Fields::new()
            .text("group-id", &id)
            .text("name", &spec.name)
            .text("bio", spec.bio)
            .text("profile-picture", picture)
            .flag("is-active", spec.flags.is_active)
            .flag("is-visible", spec.flags.is_visible)
            .text("page-visibility", spec.page_visibility.label())
            .text("post-visibility", spec.post_visibility.label())
            .texts("tag", spec.tags);
        let ops = vec![MutationOp::entity(PageKind::Group.label(), &id, fields)];

        debug!(id = %id, name = %spec.name, "group");
        self.registry.register_page(Page {
            kind: PageKind::Group,
            id,
            name: spec.name,
        })?;
        Ok(ops)
    }

    // ========================================================================
    // Content
    // ========================================================================

    /// Any post variant, posted to `page` by `author`.
    pub fn post(&mut self, spec: PostSpec) -> Result<Vec<MutationOp>> {
        let page = self
            .registry
            .page(&spec.page)
            .cloned()
            .ok_or_else(|| GenerationError::not_found("page", spec.page.as_str()))?;
        let author = self.profile(&spec.author)?;
        let original = match &spec.body {
            PostBody::Share { original } => Some(
                self.registry
                    .post(original)
                    .cloned()
                    .ok_or_else(|| GenerationError::not_found("post", original.as_str()))?,
            ),
            _ => None,
        };
        if let PostBody::Poll { answers, .. } = &spec.body {
            if answers.is_empty() {
                return Err(GenerationError::ConstraintViolation(
                    "poll post needs at least one answer".to_string(),
                ));
            }
        }
        let location = spec
            .location
            .as_deref()
            .map(|id| self.lookup_place(id))
            .transpose()?;

        let id = match spec.id {
            Some(id) => id,
            None => ids::token(&mut self.rng, Namespace::Post),
        };
        self.registry.ensure_content_free(&id)?;
        let created = match spec.timestamp {
            Some(value) => millis_stamp(value),
            None => self.ranges.content.sample(&mut self.rng),
        };

        let kind = spec.body.kind();
        let fields = Fields::new()
            .text("post-id", &id)
            .text("post-text", spec.text)
            .timestamp("creation-timestamp", created.render())
            .text("language", spec.language)
            .flag("is-visible", spec.is_visible)
            .text("post-visibility", spec.visibility.label())
            .texts("tag", spec.tags);
        let fields = match &spec.body {
            PostBody::Image => fields.text("post-image", ids::token(&mut self.rng, Namespace::Media)),
            PostBody::Video | PostBody::LiveVideo => {
                fields.text("post-video", ids::token(&mut self.rng, Namespace::Media))
            }
            PostBody::Poll { question, answers } => fields
                .text("question", question)
                .texts("answer", answers.iter().cloned()),
            PostBody::Text | PostBody::Share { .. } => fields,
        };

        let post = EntityRef::new(kind.label(), &id);
        let author_ref = page_ref(&author);
        let mut ops = vec![
            MutationOp::entity(kind.label(), &id, fields),
            MutationOp::relation(
                "posting",
                vec![
                    RolePlayer::new("page", page_ref(&page)),
                    RolePlayer::new("post", post.clone()),
                    RolePlayer::new("author", author_ref.clone()),
                ],
                Fields::new(),
            ),
        ];
        if let Some(original) = &original {
            ops.push(MutationOp::relation(
                "sharing",
                vec![
                    RolePlayer::new("original-post", EntityRef::new(original.kind.label(), &original.id)),
                    RolePlayer::new("share-post", post.clone()),
                    RolePlayer::new("author", author_ref),
                ],
                Fields::new(),
            ));
        }
        if let Some(location) = &location {
            ops.push(MutationOp::relation(
                "location",
                vec![
                    RolePlayer::new("place", place_ref(location)),
                    RolePlayer::new("located", post),
                ],
                Fields::new(),
            ));
        }

        debug!(kind = kind.label(), id = %id, page = %page.id, "post");
        self.registry.register_post(Post {
            kind,
            id: id.clone(),
            page: page.id,
            author: author.id,
            timestamp: created.render(),
        })?;
        if let PostBody::Poll { question, answers } = spec.body {
            self.registry.register_poll(socialgraph_model::Poll {
                id,
                question,
                answers,
            })?;
        }
        Ok(ops)
    }

    /// A comment on an existing post or comment.
    pub fn comment(&mut self, spec: CommentSpec) -> Result<Vec<MutationOp>> {
        let parent = self
            .registry
            .content(&spec.parent)
            .ok_or_else(|| GenerationError::not_found("content", spec.parent.as_str()))?;
        let author = self.profile(&spec.author)?;

        let id = match spec.id {
            Some(id) => id,
            None => ids::token(&mut self.rng, Namespace::Comment),
        };
        self.registry.ensure_content_free(&id)?;
        let created = match spec.timestamp {
            Some(value) => millis_stamp(value),
            None => {
                let after = self
                    .content_created_at(&parent)
                    .unwrap_or(self.ranges.content.start());
                self.ranges.content.starting_at(after).sample(&mut self.rng)
            }
        };

        let fields = Fields::new()
            .text("comment-id", &id)
            .text("comment-text", spec.text)
            .timestamp("creation-timestamp", created.render())
            .flag("is-visible", spec.is_visible)
            .texts("tag", spec.tags);
        let ops = vec![
            MutationOp::entity(ContentKind::Comment.label(), &id, fields),
            MutationOp::relation(
                "commenting",
                vec![
                    RolePlayer::new("parent", self.content_entity(&parent)),
                    RolePlayer::new("comment", EntityRef::new(ContentKind::Comment.label(), &id)),
                    RolePlayer::new("author", page_ref(&author)),
                ],
                Fields::new(),
            ),
        ];

        debug!(id = %id, parent = %parent.id, "comment");
        self.registry.register_comment(socialgraph_model::Comment {
            id,
            parent: parent.id,
            author: author.id,
            timestamp: created.render(),
        })?;
        Ok(ops)
    }

    // ========================================================================
    // Social relations
    // ========================================================================

    /// Ordered pairs of distinct persons with no relation yet.
    fn unrelated_pairs(&self) -> Vec<(String, String)> {
        let persons: Vec<&str> = self.registry.persons().map(|p| p.id.as_str()).collect();
        let mut pairs = Vec::new();
        for first in &persons {
            for second in &persons {
                if first != second && self.ledger.relation_between(first, second).is_none() {
                    pairs.push((first.to_string(), second.to_string()));
                }
            }
        }
        pairs
    }

    /// Kinds allowed for a pair under default sampling.
    fn plausible_kinds(&self, first: &str, second: &str) -> Vec<SocialRelationKind> {
        let mut kinds = vec![
            SocialRelationKind::Friendship,
            SocialRelationKind::Family,
            SocialRelationKind::Siblingship,
        ];
        if self.ledger.parent_count(second) < 2 {
            kinds.push(SocialRelationKind::Parentship);
        }
        if self.ledger.romantic_count(first) == 0 && self.ledger.romantic_count(second) == 0 {
            kinds.extend(SocialRelationKind::romantic_kinds());
        }
        kinds
    }

    pub fn social_relation(&mut self, spec: SocialRelationSpec) -> Result<Vec<MutationOp>> {
        let (first, second) = match spec.persons {
            Some((first, second)) => {
                self.registry.page_in(&first, PageCategory::Person)?;
                self.registry.page_in(&second, PageCategory::Person)?;
                if first == second {
                    return Err(GenerationError::ConstraintViolation(format!(
                        "{first} cannot be related to themselves"
                    )));
                }
                (first, second)
            }
            None => {
                let mut pairs = self.unrelated_pairs();
                if let Some(kind) = spec.kind {
                    pairs.retain(|(first, second)| {
                        self.plausible_kinds(first, second).contains(&kind)
                    });
                }
                pick(&mut self.rng, &pairs).ok_or_else(|| match spec.kind {
                    Some(kind) => GenerationError::exhausted(format!(
                        "no unrelated pair of persons admits a {} relation",
                        kind.label()
                    )),
                    None => GenerationError::exhausted("every pair of persons is already related"),
                })?
            }
        };

        let kind = match spec.kind {
            Some(kind) => kind,
            None => {
                let kinds = self.plausible_kinds(&first, &second);
                choose(&mut self.rng, &kinds).unwrap_or(SocialRelationKind::Friendship)
            }
        };

        let mut pending = Diagnostics::new();
        if self.ledger.relation_between(&first, &second).is_some() {
            self.soft_violation(
                &mut pending,
                DiagnosticKind::DuplicateRelationForced,
                format!("{first} and {second} are already related"),
            )?;
        }
        if kind.is_romantic()
            && (self.ledger.romantic_count(&first) > 0 || self.ledger.romantic_count(&second) > 0)
        {
            self.soft_violation(
                &mut pending,
                DiagnosticKind::RomanticConflictForced,
                format!("{first} or {second} already has a romantic partner"),
            )?;
        }
        if kind == SocialRelationKind::Parentship && self.ledger.parent_count(&second) >= 2 {
            self.soft_violation(
                &mut pending,
                DiagnosticKind::ExtraParentForced,
                format!("{second} already has two parents"),
            )?;
        }

        let location = if kind.has_location() {
            Some(self.place_or_random(spec.location.as_deref(), PlaceKind::City)?)
        } else {
            None
        };
        let date = match spec.date {
            Some(date) => date_stamp(date),
            None => self.ranges.social_relation.sample(&mut self.rng),
        };

        let first_ref = EntityRef::new(PageKind::Person.label(), &first);
        let second_ref = EntityRef::new(PageKind::Person.label(), &second);
        let mut roles = vec![
            RolePlayer::new(kind.first_role(), first_ref.clone()),
            RolePlayer::new(kind.second_role(), second_ref.clone()),
        ];
        if let Some(location) = &location {
            roles.push(RolePlayer::new("location", place_ref(location)));
        }
        let fields = Fields::new().date(kind.date_attribute().unwrap_or("start-date"), date.render());
        let mut ops = vec![MutationOp::relation(kind.label(), roles, fields)];
        if let Some(status) = kind.relationship_status() {
            for person in [first_ref, second_ref] {
                ops.push(MutationOp::attach(
                    person,
                    Fields::new().text("relationship-status", status.label()),
                ));
            }
        }

        debug!(kind = kind.label(), first = %first, second = %second, "social relation");
        self.ledger.record_social_relation(SocialRelation {
            kind,
            persons: (first, second),
        });
        self.diagnostics.absorb(pending);
        Ok(ops)
    }

    /// A relationship status for every person without a romantic relation,
    /// drawn among statuses that do not imply a partner.
    pub fn relationship_statuses(&mut self) -> Result<Vec<MutationOp>> {
        let statuses: Vec<RelationshipStatus> = RelationshipStatus::ALL
            .iter()
            .copied()
            .filter(|status| !status.implies_partner())
            .collect();
        let persons: Vec<Page> = self
            .registry
            .persons()
            .filter(|person| self.ledger.romantic_count(&person.id) == 0)
            .cloned()
            .collect();

        let mut ops = Vec::with_capacity(persons.len());
        for person in &persons {
            let status = choose(&mut self.rng, &statuses).unwrap_or(RelationshipStatus::Single);
            ops.push(MutationOp::attach(
                page_ref(person),
                Fields::new().text("relationship-status", status.label()),
            ));
        }
        debug!(count = ops.len(), "relationship statuses");
        Ok(ops)
    }

    // ========================================================================
    // Education, employment and memberships
    // ========================================================================

    fn date_range(
        &mut self,
        explicit: Option<(NaiveDate, Option<NaiveDate>)>,
        range: crate::timestamps::Interval,
        sample_end: bool,
    ) -> (Timestamp, Option<Timestamp>) {
        match explicit {
            Some((start, end)) => (date_stamp(start), end.map(date_stamp)),
            None => {
                let start = range.sample(&mut self.rng);
                let end = sample_end.then(|| range.starting_at(start.value()).sample(&mut self.rng));
                (start, end)
            }
        }
    }

    pub fn education(&mut self, spec: EducationSpec) -> Result<Vec<MutationOp>> {
        let mut pending = Diagnostics::new();
        let person = match spec.person {
            Some(id) => {
                self.registry.page_in(&id, PageCategory::Person)?;
                if self.ledger.education_count(&id) > 0 {
                    self.soft_violation(
                        &mut pending,
                        DiagnosticKind::SecondEducationForced,
                        format!("{id} already has an education"),
                    )?;
                }
                id
            }
            None => {
                let candidates: Vec<String> = self
                    .registry
                    .persons()
                    .filter(|p| self.ledger.education_count(&p.id) == 0)
                    .map(|p| p.id.clone())
                    .collect();
                pick(&mut self.rng, &candidates)
                    .ok_or_else(|| GenerationError::exhausted("every person already has an education"))?
            }
        };

        let institute = match spec.institute {
            Some(id) => self.registry.page_in(&id, PageCategory::Institute)?.clone(),
            None => {
                let wanted = spec.institute_kind.map(|kind| kind.page_kind());
                let candidates: Vec<Page> = self
                    .registry
                    .institutes()
                    .filter(|page| wanted.map_or(true, |kind| page.kind == kind))
                    .cloned()
                    .collect();
                pick(&mut self.rng, &candidates)
                    .ok_or_else(|| GenerationError::exhausted("no institute of the requested kind"))?
            }
        };

        let range = self.ranges.education;
        let (start, end) = self.date_range(spec.dates, range, true);
        let fields = Fields::new().date("start-date", start.render());
        let fields = match end {
            Some(end) => fields.date("end-date", end.render()),
            None => fields,
        }
        .maybe_text("description", spec.description);

        let ops = vec![MutationOp::relation(
            "education",
            vec![
                RolePlayer::new("institute", page_ref(&institute)),
                RolePlayer::new("attendee", EntityRef::new(PageKind::Person.label(), &person)),
            ],
            fields,
        )];

        debug!(person = %person, institute = %institute.id, "education");
        self.ledger.record_education(Education {
            institute: institute.id,
            attendee: person,
        });
        self.diagnostics.absorb(pending);
        Ok(ops)
    }

    pub fn employment(&mut self, spec: EmploymentSpec) -> Result<Vec<MutationOp>> {
        let mut pending = Diagnostics::new();
        let person = match spec.person {
            Some(id) => {
                self.registry.page_in(&id, PageCategory::Person)?;
                if self.ledger.employment_count(&id) > 0 {
                    self.soft_violation(
                        &mut pending,
                        DiagnosticKind::SecondEmploymentForced,
                        format!("{id} already has an employment"),
                    )?;
                }
                id
            }
            None => {
                let candidates: Vec<String> = self
                    .registry
                    .persons()
                    .filter(|p| self.ledger.employment_count(&p.id) == 0)
                    .map(|p| p.id.clone())
                    .collect();
                pick(&mut self.rng, &candidates)
                    .ok_or_else(|| GenerationError::exhausted("every person already has an employment"))?
            }
        };

        let employer = match spec.organisation {
            Some(id) => self.registry.page_in(&id, PageCategory::Organisation)?.clone(),
            None => {
                let wanted = spec.organisation_kind.map(|kind| kind.page_kind());
                let candidates: Vec<Page> = self
                    .registry
                    .organisations()
                    .filter(|page| wanted.map_or(true, |kind| page.kind == kind))
                    .cloned()
                    .collect();
                pick(&mut self.rng, &candidates)
                    .ok_or_else(|| GenerationError::exhausted("no organisation of the requested kind"))?
            }
        };

        let range = self.ranges.employment;
        let (start, end) = self.date_range(spec.dates, range, false);
        let fields = Fields::new().date("start-date", start.render());
        let fields = match end {
            Some(end) => fields.date("end-date", end.render()),
            None => fields,
        }
        .maybe_text("description", spec.description);

        let ops = vec![MutationOp::relation(
            "employment",
            vec![
                RolePlayer::new("employer", page_ref(&employer)),
                RolePlayer::new("employee", EntityRef::new(PageKind::Person.label(), &person)),
            ],
            fields,
        )];

        debug!(person = %person, employer = %employer.id, "employment");
        self.ledger.record_employment(Employment {
            employer: employer.id,
            employee: person,
        });
        self.diagnostics.absorb(pending);
        Ok(ops)
    }

    pub fn group_membership(&mut self, spec: MembershipSpec) -> Result<Vec<MutationOp>> {
        let profiles: Vec<String> = match &spec.profile {
            Some(id) => vec![id.clone()],
            None => self.registry.profiles().map(|p| p.id.clone()).collect(),
        };

        let group = match spec.group {
            Some(id) => self.registry.page_in(&id, PageCategory::Group)?.clone(),
            None => {
                // An explicit profile only draws from groups it can still join.
                let candidates: Vec<Page> = self
                    .registry
                    .groups()
                    .filter(|group| profiles.iter().any(|p| !self.ledger.is_member(&group.id, p)))
                    .cloned()
                    .collect();
                pick(&mut self.rng, &candidates).ok_or_else(|| {
                    GenerationError::exhausted("no group has a profile left to join")
                })?
            }
        };

        let profile = match spec.profile {
            Some(id) => {
                let profile = self.profile(&id)?;
                if self.ledger.is_member(&group.id, &id) {
                    return Err(GenerationError::ConstraintViolation(format!(
                        "{id} is already a member of {}",
                        group.id
                    )));
                }
                profile
            }
            None => {
                let candidates: Vec<String> = profiles
                    .iter()
                    .filter(|p| !self.ledger.is_member(&group.id, p))
                    .cloned()
                    .collect();
                let id = pick(&mut self.rng, &candidates).ok_or_else(|| {
                    GenerationError::exhausted(format!("group {} holds every profile", group.id))
                })?;
                self.profile(&id)?
            }
        };

        let has_owner = self.ledger.has_owner(&group.id);
        let rank = match spec.rank {
            Some(GroupMemberRank::Owner) if has_owner => {
                return Err(GenerationError::ConstraintViolation(format!(
                    "group {} already has an owner",
                    group.id
                )))
            }
            Some(rank) => rank,
            None if !has_owner => GroupMemberRank::Owner,
            None => choose_any(&mut self.rng).unwrap_or(GroupMemberRank::Member),
        };

        let start = match spec.start {
            Some(value) => millis_stamp(value),
            None => self.ranges.content.sample(&mut self.rng),
        };
        let fields = Fields::new()
            .timestamp("start-timestamp", start.render())
            .text("rank", rank.label());
        let fields = match spec.end {
            Some(end) => fields.timestamp("end-timestamp", millis_stamp(end).render()),
            None => fields,
        }
        .texts("badge", spec.badges);

        let ops = vec![MutationOp::relation(
            "group-membership",
            vec![
                RolePlayer::new("group", page_ref(&group)),
                RolePlayer::new("member", page_ref(&profile)),
            ],
            fields,
        )];

        debug!(group = %group.id, member = %profile.id, rank = rank.label(), "membership");
        self.ledger.record_membership(GroupMembership {
            group: group.id,
            member: profile.id,
            rank,
        });
        Ok(ops)
    }
}
