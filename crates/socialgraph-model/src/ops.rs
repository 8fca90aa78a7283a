//! Abstract graph-mutation operations.
//!
//! The generator emits an ordered stream of these; a loader turns them into
//! whatever the target store speaks. No concrete query grammar is implied.
//!
//! Ordering contract: an operation only references entities created by
//! earlier operations in the same stream.

use serde::{Deserialize, Serialize};

/// Reference to an entity by kind and identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: String,
    pub key: String,
}

impl EntityRef {
    pub fn new(kind: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            key: key.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum FieldValue {
    Text(String),
    Bool(bool),
    /// `YYYY-MM-DD`
    Date(String),
    /// `YYYY-MM-DDTHH:MM:SS[.fff]`
    Timestamp(String),
}

impl FieldValue {
    /// The rendered value of any textual variant.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::Date(s) | FieldValue::Timestamp(s) => Some(s),
            FieldValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
}

/// Ordered attribute list. Multi-valued attributes repeat their name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fields(pub Vec<Field>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, name: &str, value: FieldValue) -> Self {
        self.0.push(Field {
            name: name.to_string(),
            value,
        });
        self
    }

    pub fn text(self, name: &str, value: impl Into<String>) -> Self {
        self.push(name, FieldValue::Text(value.into()))
    }

    pub fn texts<I, S>(self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        values
            .into_iter()
            .fold(self, |fields, value| fields.text(name, value))
    }

    pub fn flag(self, name: &str, value: bool) -> Self {
        self.push(name, FieldValue::Bool(value))
    }

    pub fn date(self, name: &str, value: impl Into<String>) -> Self {
        self.push(name, FieldValue::Date(value.into()))
    }

    pub fn timestamp(self, name: &str, value: impl Into<String>) -> Self {
        self.push(name, FieldValue::Timestamp(value.into()))
    }

    pub fn maybe_text(self, name: &str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.text(name, value),
            None => self,
        }
    }

    /// First value recorded under `name`.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.value)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_str)
    }

    /// Every value recorded under `name`, in insertion order.
    pub fn all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FieldValue> + 'a {
        self.0
            .iter()
            .filter(move |field| field.name == name)
            .map(|field| &field.value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePlayer {
    pub role: String,
    pub player: EntityRef,
}

impl RolePlayer {
    pub fn new(role: impl Into<String>, player: EntityRef) -> Self {
        Self {
            role: role.into(),
            player,
        }
    }
}

/// One atomic instruction for the external graph store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum MutationOp {
    CreateEntity {
        kind: String,
        key: String,
        fields: Fields,
    },
    CreateRelation {
        kind: String,
        roles: Vec<RolePlayer>,
        fields: Fields,
    },
    /// Attributes attached to an existing entity. Only used for the
    /// relationship-status side effect of romantic relations.
    AttachAttributes { target: EntityRef, fields: Fields },
}

impl MutationOp {
    pub fn entity(kind: impl Into<String>, key: impl Into<String>, fields: Fields) -> Self {
        MutationOp::CreateEntity {
            kind: kind.into(),
            key: key.into(),
            fields,
        }
    }

    pub fn relation(kind: impl Into<String>, roles: Vec<RolePlayer>, fields: Fields) -> Self {
        MutationOp::CreateRelation {
            kind: kind.into(),
            roles,
            fields,
        }
    }

    pub fn attach(target: EntityRef, fields: Fields) -> Self {
        MutationOp::AttachAttributes { target, fields }
    }

    /// Entity or relation kind; `None` for attribute attachments.
    pub fn kind(&self) -> Option<&str> {
        match self {
            MutationOp::CreateEntity { kind, .. } | MutationOp::CreateRelation { kind, .. } => {
                Some(kind)
            }
            MutationOp::AttachAttributes { .. } => None,
        }
    }

    pub fn fields(&self) -> &Fields {
        match self {
            MutationOp::CreateEntity { fields, .. }
            | MutationOp::CreateRelation { fields, .. }
            | MutationOp::AttachAttributes { fields, .. } => fields,
        }
    }

    /// The entity created by this operation, if it creates one.
    pub fn created_entity(&self) -> Option<EntityRef> {
        match self {
            MutationOp::CreateEntity { kind, key, .. } => Some(EntityRef::new(kind, key)),
            _ => None,
        }
    }

    /// First player bound to `role` in a relation operation.
    pub fn role(&self, role: &str) -> Option<&EntityRef> {
        match self {
            MutationOp::CreateRelation { roles, .. } => roles
                .iter()
                .find(|player| player.role == role)
                .map(|player| &player.player),
            _ => None,
        }
    }

    /// Whether applying this operation creates a new instance in the store.
    pub fn creates_instance(&self) -> bool {
        !matches!(self, MutationOp::AttachAttributes { .. })
    }

    /// Every entity reference this operation depends on.
    pub fn references(&self) -> Vec<&EntityRef> {
        match self {
            MutationOp::CreateEntity { .. } => Vec::new(),
            MutationOp::CreateRelation { roles, .. } => {
                roles.iter().map(|player| &player.player).collect()
            }
            MutationOp::AttachAttributes { target, .. } => vec![target],
        }
    }
}

/// Number of `create-entity` operations in a stream.
pub fn count_entities(ops: &[MutationOp]) -> usize {
    ops.iter()
        .filter(|op| matches!(op, MutationOp::CreateEntity { .. }))
        .count()
}

/// Number of `create-relation` operations in a stream.
pub fn count_relations(ops: &[MutationOp]) -> usize {
    ops.iter()
        .filter(|op| matches!(op, MutationOp::CreateRelation { .. }))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_valued_fields_keep_order() {
        let fields = Fields::new()
            .text("name", "Amina")
            .texts("language", ["English", "French"])
            .flag("is-active", true);
        let languages: Vec<_> = fields
            .all("language")
            .filter_map(FieldValue::as_str)
            .collect();
        assert_eq!(languages, vec!["English", "French"]);
        assert_eq!(fields.get("is-active").and_then(FieldValue::as_bool), Some(true));
        assert_eq!(fields.len(), 4);
    }

    #[test]
    fn relation_exposes_roles_and_references() {
        let op = MutationOp::relation(
            "friendship",
            vec![
                RolePlayer::new("friend", EntityRef::new("person", "a")),
                RolePlayer::new("friend", EntityRef::new("person", "b")),
            ],
            Fields::new().date("start-date", "2010-04-01"),
        );
        assert_eq!(op.kind(), Some("friendship"));
        assert_eq!(op.role("friend").map(|r| r.key.as_str()), Some("a"));
        assert_eq!(op.references().len(), 2);
        assert!(op.creates_instance());
        assert!(op.created_entity().is_none());
    }

    #[test]
    fn serialized_shape_is_tagged() {
        let op = MutationOp::entity("group", "grp-1", Fields::new().text("name", "Chess"));
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["op"], "create-entity");
        assert_eq!(json["fields"][0]["value"]["type"], "text");
        let back: MutationOp = serde_json::from_value(json).unwrap();
        assert_eq!(back, op);
    }

    #[test]
    fn stream_counts_split_by_operation() {
        let target = EntityRef::new("person", "AminaRahman042");
        let ops = vec![
            MutationOp::entity("person", "AminaRahman042", Fields::new()),
            MutationOp::relation(
                "location",
                vec![RolePlayer::new("located", target.clone())],
                Fields::new(),
            ),
            MutationOp::attach(target, Fields::new().text("relationship-status", "single")),
        ];
        assert_eq!(count_entities(&ops), 1);
        assert_eq!(count_relations(&ops), 1);
        assert_eq!(ops.iter().filter(|op| op.creates_instance()).count(), 2);
    }
}
