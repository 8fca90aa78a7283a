//! Entity registry: every page, place and piece of content created so far.
//!
//! Each namespace is an insertion-ordered arena plus an id index. Iteration
//! always follows insertion order, which keeps sampling reproducible for a
//! given seed.

use std::collections::HashMap;

use socialgraph_model::{
    Comment, ContentKind, ContentRef, Page, PageKind, Place, PlaceKind, Poll, Post,
};

use crate::error::{GenerationError, Result};

/// Filtered projections over pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCategory {
    Any,
    Person,
    Organisation,
    Institute,
    Group,
    /// Persons and organisations.
    Profile,
}

impl PageCategory {
    pub fn matches(self, kind: PageKind) -> bool {
        match self {
            PageCategory::Any => true,
            PageCategory::Person => kind == PageKind::Person,
            PageCategory::Organisation => kind.is_organisation(),
            PageCategory::Institute => kind.is_institute(),
            PageCategory::Group => kind == PageKind::Group,
            PageCategory::Profile => kind.is_profile(),
        }
    }

    fn label(self) -> &'static str {
        match self {
            PageCategory::Any => "page",
            PageCategory::Person => "person",
            PageCategory::Organisation => "organisation",
            PageCategory::Institute => "institute",
            PageCategory::Group => "group",
            PageCategory::Profile => "profile",
        }
    }
}

/// Insertion-ordered records indexed by identifier.
#[derive(Debug, Clone)]
struct Arena<T> {
    namespace: &'static str,
    items: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Arena<T> {
    fn new(namespace: &'static str) -> Self {
        Self {
            namespace,
            items: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn ensure_free(&self, id: &str) -> Result<()> {
        if self.index.contains_key(id) {
            return Err(GenerationError::DuplicateIdentifier {
                namespace: self.namespace,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    fn insert(&mut self, id: String, item: T) {
        self.index.insert(id, self.items.len());
        self.items.push(item);
    }

    fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|&i| &self.items[i])
    }

    fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }
}

fn unique<'a, T>(
    kind: &'static str,
    name: &str,
    mut matches: impl Iterator<Item = &'a T>,
) -> Result<&'a T> {
    let first = matches
        .next()
        .ok_or_else(|| GenerationError::not_found(kind, name))?;
    let extra = matches.count();
    if extra > 0 {
        return Err(GenerationError::AmbiguousName {
            kind,
            name: name.to_string(),
            matches: extra + 1,
        });
    }
    Ok(first)
}

#[derive(Debug, Clone)]
pub struct Registry {
    pages: Arena<Page>,
    places: Arena<Place>,
    posts: Arena<Post>,
    comments: Arena<Comment>,
    polls: Arena<Poll>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            pages: Arena::new("page"),
            places: Arena::new("place"),
            posts: Arena::new("post"),
            comments: Arena::new("comment"),
            polls: Arena::new("poll"),
        }
    }

    // ========================================================================
    // Checks (no mutation)
    // ========================================================================

    pub fn ensure_page_free(&self, id: &str) -> Result<()> {
        self.pages.ensure_free(id)
    }

    pub fn ensure_place_free(&self, id: &str) -> Result<()> {
        self.places.ensure_free(id)
    }

    /// Posts and comments share one content namespace.
    pub fn ensure_content_free(&self, id: &str) -> Result<()> {
        self.posts.ensure_free(id)?;
        self.comments.ensure_free(id)
    }

    pub fn is_username_taken(&self, id: &str) -> bool {
        self.pages.contains(id)
    }

    // ========================================================================
    // Registration
    // ========================================================================

    pub(crate) fn register_page(&mut self, page: Page) -> Result<()> {
        self.pages.ensure_free(&page.id)?;
        self.pages.insert(page.id.clone(), page);
        Ok(())
    }

    pub(crate) fn register_place(&mut self, place: Place) -> Result<()> {
        self.places.ensure_free(&place.id)?;
        if let Some(parent) = &place.parent {
            if !self.places.contains(parent) {
                return Err(GenerationError::not_found("place", parent.clone()));
            }
        }
        self.places.insert(place.id.clone(), place);
        Ok(())
    }

    pub(crate) fn register_post(&mut self, post: Post) -> Result<()> {
        self.ensure_content_free(&post.id)?;
        if !self.pages.contains(&post.page) {
            return Err(GenerationError::not_found("page", post.page.clone()));
        }
        self.posts.insert(post.id.clone(), post);
        Ok(())
    }

    pub(crate) fn register_comment(&mut self, comment: Comment) -> Result<()> {
        self.ensure_content_free(&comment.id)?;
        if !self.posts.contains(&comment.parent) && !self.comments.contains(&comment.parent) {
            return Err(GenerationError::not_found("content", comment.parent.clone()));
        }
        self.comments.insert(comment.id.clone(), comment);
        Ok(())
    }

    pub(crate) fn register_poll(&mut self, poll: Poll) -> Result<()> {
        self.polls.ensure_free(&poll.id)?;
        if !self.posts.contains(&poll.id) {
            return Err(GenerationError::not_found("post", poll.id.clone()));
        }
        self.polls.insert(poll.id.clone(), poll);
        Ok(())
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn page(&self, id: &str) -> Option<&Page> {
        self.pages.get(id)
    }

    /// A page by id, restricted to a category.
    pub fn page_in(&self, id: &str, category: PageCategory) -> Result<&Page> {
        self.pages
            .get(id)
            .filter(|page| category.matches(page.kind))
            .ok_or_else(|| GenerationError::not_found(category.label(), id))
    }

    pub fn place(&self, id: &str) -> Option<&Place> {
        self.places.get(id)
    }

    pub fn post(&self, id: &str) -> Option<&Post> {
        self.posts.get(id)
    }

    pub fn comment(&self, id: &str) -> Option<&Comment> {
        self.comments.get(id)
    }

    pub fn poll(&self, id: &str) -> Option<&Poll> {
        self.polls.get(id)
    }

    /// Resolve a bare content id to a post or comment reference.
    pub fn content(&self, id: &str) -> Option<ContentRef> {
        let kind = if self.posts.contains(id) {
            ContentKind::Post
        } else if self.comments.contains(id) {
            ContentKind::Comment
        } else {
            return None;
        };
        Some(ContentRef {
            kind,
            id: id.to_string(),
        })
    }

    pub fn content_timestamp(&self, content: &ContentRef) -> Option<&str> {
        match content.kind {
            ContentKind::Post => self.post(&content.id).map(|p| p.timestamp.as_str()),
            ContentKind::Comment => self.comment(&content.id).map(|c| c.timestamp.as_str()),
        }
    }

    pub fn content_author(&self, content: &ContentRef) -> Option<&str> {
        match content.kind {
            ContentKind::Post => self.post(&content.id).map(|p| p.author.as_str()),
            ContentKind::Comment => self.comment(&content.id).map(|c| c.author.as_str()),
        }
    }

    /// Exactly one page in `category` carrying `name`.
    pub fn page_by_name(&self, name: &str, category: PageCategory) -> Result<&Page> {
        unique(
            category.label(),
            name,
            self.pages_in(category).filter(|page| page.name == name),
        )
    }

    /// Exactly one place (optionally of `kind`) carrying `name`.
    pub fn place_by_name(&self, name: &str, kind: Option<PlaceKind>) -> Result<&Place> {
        unique(
            "place",
            name,
            self.places
                .items
                .iter()
                .filter(|place| kind.map_or(true, |k| place.kind == k) && place.name == name),
        )
    }

    // ========================================================================
    // Iteration
    // ========================================================================

    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.items.iter()
    }

    pub fn pages_in(&self, category: PageCategory) -> impl Iterator<Item = &Page> {
        self.pages
            .items
            .iter()
            .filter(move |page| category.matches(page.kind))
    }

    pub fn persons(&self) -> impl Iterator<Item = &Page> {
        self.pages_in(PageCategory::Person)
    }

    pub fn organisations(&self) -> impl Iterator<Item = &Page> {
        self.pages_in(PageCategory::Organisation)
    }

    pub fn institutes(&self) -> impl Iterator<Item = &Page> {
        self.pages_in(PageCategory::Institute)
    }

    pub fn groups(&self) -> impl Iterator<Item = &Page> {
        self.pages_in(PageCategory::Group)
    }

    pub fn profiles(&self) -> impl Iterator<Item = &Page> {
        self.pages_in(PageCategory::Profile)
    }

    pub fn person_count(&self) -> usize {
        self.persons().count()
    }

    pub fn places(&self) -> impl Iterator<Item = &Place> {
        self.places.items.iter()
    }

    pub fn places_of_kind(&self, kind: PlaceKind) -> impl Iterator<Item = &Place> {
        self.places.items.iter().filter(move |place| place.kind == kind)
    }

    pub fn posts(&self) -> impl Iterator<Item = &Post> {
        self.posts.items.iter()
    }

    pub fn comments(&self) -> impl Iterator<Item = &Comment> {
        self.comments.items.iter()
    }

    pub fn polls(&self) -> impl Iterator<Item = &Poll> {
        self.polls.items.iter()
    }

    /// Posts then comments, each in creation order.
    pub fn contents(&self) -> impl Iterator<Item = ContentRef> + '_ {
        let posts = self.posts().map(|post| ContentRef {
            kind: ContentKind::Post,
            id: post.id.clone(),
        });
        let comments = self.comments().map(|comment| ContentRef {
            kind: ContentKind::Comment,
            id: comment.id.clone(),
        });
        posts.chain(comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(kind: PageKind, id: &str, name: &str) -> Page {
        Page {
            kind,
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    fn place(kind: PlaceKind, id: &str, name: &str, parent: Option<&str>) -> Place {
        Place {
            kind,
            id: id.to_string(),
            name: name.to_string(),
            parent: parent.map(str::to_string),
        }
    }

    #[test]
    fn duplicate_page_identifier_is_rejected() {
        let mut registry = Registry::new();
        registry
            .register_page(page(PageKind::Person, "Amina001", "Amina Rahman"))
            .unwrap();
        let err = registry
            .register_page(page(PageKind::Group, "Amina001", "Chess"))
            .unwrap_err();
        assert!(matches!(err, GenerationError::DuplicateIdentifier { namespace: "page", .. }));
        assert_eq!(registry.pages().count(), 1);
    }

    #[test]
    fn place_parent_must_exist() {
        let mut registry = Registry::new();
        let err = registry
            .register_place(place(PlaceKind::City, "plc-x", "Nowhere", Some("plc-missing")))
            .unwrap_err();
        assert!(matches!(err, GenerationError::NotFound { .. }));

        registry
            .register_place(place(PlaceKind::Region, "plc-eu", "Europe", None))
            .unwrap();
        registry
            .register_place(place(PlaceKind::Country, "plc-eu/uk", "United Kingdom", Some("plc-eu")))
            .unwrap();
        assert_eq!(registry.places_of_kind(PlaceKind::Country).count(), 1);
    }

    #[test]
    fn name_lookup_distinguishes_missing_from_ambiguous() {
        let mut registry = Registry::new();
        registry
            .register_page(page(PageKind::Group, "grp-1", "Chess Club"))
            .unwrap();
        registry
            .register_page(page(PageKind::Group, "grp-2", "Chess Club"))
            .unwrap();
        registry
            .register_page(page(PageKind::Company, "Acme", "Acme"))
            .unwrap();

        assert!(matches!(
            registry.page_by_name("Chess Club", PageCategory::Group),
            Err(GenerationError::AmbiguousName { matches: 2, .. })
        ));
        assert!(matches!(
            registry.page_by_name("Go Club", PageCategory::Group),
            Err(GenerationError::NotFound { .. })
        ));
        assert_eq!(
            registry.page_by_name("Acme", PageCategory::Profile).unwrap().id,
            "Acme"
        );
    }

    #[test]
    fn filtered_views_follow_page_kinds() {
        let mut registry = Registry::new();
        for (kind, id) in [
            (PageKind::Person, "p"),
            (PageKind::University, "u"),
            (PageKind::Charity, "c"),
            (PageKind::Group, "g"),
        ] {
            registry.register_page(page(kind, id, id)).unwrap();
        }
        fn ids<'a>(pages: impl Iterator<Item = &'a Page>) -> Vec<&'a str> {
            pages.map(|p| p.id.as_str()).collect()
        }
        assert_eq!(ids(registry.persons()), vec!["p"]);
        assert_eq!(ids(registry.organisations()), vec!["u", "c"]);
        assert_eq!(ids(registry.institutes()), vec!["u"]);
        assert_eq!(ids(registry.profiles()), vec!["p", "u", "c"]);
        assert_eq!(ids(registry.groups()), vec!["g"]);
    }

    #[test]
    fn comments_need_existing_parent_content() {
        let mut registry = Registry::new();
        registry
            .register_page(page(PageKind::Person, "p", "P"))
            .unwrap();
        let comment = Comment {
            id: "cmt-1".to_string(),
            parent: "pst-1".to_string(),
            author: "p".to_string(),
            timestamp: "2021-01-01T00:00:00.000".to_string(),
        };
        assert!(registry.register_comment(comment.clone()).is_err());

        registry
            .register_post(Post {
                kind: socialgraph_model::PostKind::Text,
                id: "pst-1".to_string(),
                page: "p".to_string(),
                author: "p".to_string(),
                timestamp: "2020-06-01T00:00:00.000".to_string(),
            })
            .unwrap();
        registry.register_comment(comment).unwrap();
        assert_eq!(registry.content("cmt-1").unwrap().kind, ContentKind::Comment);
        assert_eq!(registry.contents().count(), 2);
    }
}
