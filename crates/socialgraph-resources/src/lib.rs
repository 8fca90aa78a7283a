//! Static resource tables for the socialgraph generator.
//!
//! A resource directory looks like:
//!
//! ```text
//! resources/
//!   female_names.json      [{ "percentile": 1.2, "value": "Amina" }, ...]
//!   male_names.json
//!   last_names.json
//!   landmarks.txt          one name per line
//!   bios.txt               one person bio per line
//!   organisations.json     [{ "type": "company", "name", "bio", "tags" }]
//!   groups.json            [{ "name", "bio", "tags" }]
//!   conversations/
//!     index.json           [{ "ref", "type", "posting_type", "page_name", "location_name" }]
//!     <ref>.json           nested post/comment document
//! ```
//!
//! Empty strings in the conversation index mean "none".

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use socialgraph_gen::{ConversationSpec, GroupSpec, OrganisationSpec, PostingMode};
use socialgraph_model::{
    ConversationDocument, ConversationTemplate, NameEntry, NameTable, NameTables, OrganisationKind,
    PostKind,
};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrganisationDescriptor {
    #[serde(rename = "type")]
    pub kind: OrganisationKind,
    pub name: String,
    pub bio: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl OrganisationDescriptor {
    pub fn to_spec(&self) -> OrganisationSpec {
        OrganisationSpec::new(self.kind, &self.name, &self.bio, self.tags.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GroupDescriptor {
    pub name: String,
    pub bio: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl GroupDescriptor {
    pub fn to_spec(&self) -> GroupSpec {
        GroupSpec::new(&self.name, &self.bio, self.tags.clone())
    }
}

/// One row of `conversations/index.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConversationIndexEntry {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(rename = "type")]
    pub post_type: String,
    pub posting_type: PostingMode,
    #[serde(default)]
    pub page_name: String,
    #[serde(default)]
    pub location_name: String,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Everything the driver script needs besides the generator config.
#[derive(Debug, Clone, Default)]
pub struct ResourceBundle {
    pub names: NameTables,
    pub landmarks: Vec<String>,
    pub bios: Vec<String>,
    pub organisations: Vec<OrganisationDescriptor>,
    pub groups: Vec<GroupDescriptor>,
    /// In index order.
    pub conversations: Vec<ConversationSpec>,
}

impl ResourceBundle {
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let names = NameTables {
            female: read_names(&dir.join("female_names.json"))?,
            male: read_names(&dir.join("male_names.json"))?,
            last: read_names(&dir.join("last_names.json"))?,
        };
        let bundle = Self {
            names,
            landmarks: read_lines(&dir.join("landmarks.txt"))?,
            bios: read_lines(&dir.join("bios.txt"))?,
            organisations: read_json(&dir.join("organisations.json"))?,
            groups: read_json(&dir.join("groups.json"))?,
            conversations: read_conversations(&dir.join("conversations"))?,
        };
        tracing::info!(
            dir = %dir.display(),
            bios = bundle.bios.len(),
            landmarks = bundle.landmarks.len(),
            organisations = bundle.organisations.len(),
            groups = bundle.groups.len(),
            conversations = bundle.conversations.len(),
            "loaded resources"
        );
        Ok(bundle)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

fn read_names(path: &Path) -> Result<NameTable> {
    let entries: Vec<NameEntry> = read_json(path)?;
    if entries.is_empty() {
        return Err(anyhow!("name table {} is empty", path.display()));
    }
    Ok(NameTable::new(entries))
}

/// Non-blank trimmed lines.
fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn read_conversations(dir: &Path) -> Result<Vec<ConversationSpec>> {
    let index: Vec<ConversationIndexEntry> = read_json(&dir.join("index.json"))?;
    index
        .iter()
        .map(|entry| {
            let path: PathBuf = dir.join(format!("{}.json", entry.reference));
            let root_kind = PostKind::from_index_name(&entry.post_type).ok_or_else(|| {
                anyhow!(
                    "unknown post type `{}` for conversation `{}`",
                    entry.post_type,
                    entry.reference
                )
            })?;
            let document: ConversationDocument = read_json(&path)?;
            let template = ConversationTemplate::from_document(&entry.reference, &document, root_kind)
                .with_context(|| format!("invalid conversation {}", path.display()))?;
            Ok(ConversationSpec {
                page_name: non_empty(&entry.page_name),
                place_name: non_empty(&entry.location_name),
                ..ConversationSpec::new(template, entry.posting_type)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_entries_treat_empty_strings_as_none() {
        let entry: ConversationIndexEntry = serde_json::from_str(
            r#"{"ref": "c1", "type": "text", "posting_type": "person-group",
                "page_name": "Book Club", "location_name": ""}"#,
        )
        .unwrap();
        assert_eq!(entry.posting_type, PostingMode::Group);
        assert_eq!(non_empty(&entry.page_name).as_deref(), Some("Book Club"));
        assert_eq!(non_empty(&entry.location_name), None);
    }

    #[test]
    fn organisation_types_use_page_labels() {
        let org: OrganisationDescriptor = serde_json::from_str(
            r#"{"type": "educational-institute", "name": "Open Academy", "bio": "Learn."}"#,
        )
        .unwrap();
        assert_eq!(org.kind, OrganisationKind::Institute);
        assert!(org.tags.is_empty());
        assert_eq!(org.to_spec().name, "Open Academy");
    }
}
