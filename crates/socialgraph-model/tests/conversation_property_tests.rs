use proptest::prelude::*;
use socialgraph_model::{ConversationDocument, ConversationTemplate, PostKind, TagMapping};

const AUTHORS: [&str; 5] = ["@ana", "@anabel", "@bo", "@bob", "@bobby"];

fn leaf(author: usize, body: String) -> ConversationDocument {
    ConversationDocument {
        username: AUTHORS[author].to_string(),
        body,
        timestamp: None,
        comments: Vec::new(),
        question: None,
        answers: None,
    }
}

/// Bodies built from author mentions, topic tags and filler words.
fn body_strategy() -> impl Strategy<Value = String> {
    let token = prop_oneof![
        (0usize..AUTHORS.len()).prop_map(|i| AUTHORS[i].to_string()),
        "#[a-z]{1,6}",
        "[a-z]{1,8}",
    ];
    prop::collection::vec(token, 0..8).prop_map(|tokens| tokens.join(" "))
}

/// A root with up to two levels of replies; every author also comments so
/// every mention names a participant.
fn document_strategy() -> impl Strategy<Value = ConversationDocument> {
    let reply = || (0usize..AUTHORS.len(), body_strategy());
    (
        body_strategy(),
        prop::collection::vec((reply(), prop::collection::vec(reply(), 0..3)), 0..4),
    )
        .prop_map(|(root_body, replies)| {
            let mut root = leaf(0, root_body);
            for ((author, body), nested) in replies {
                let mut comment = leaf(author, body);
                comment.comments = nested
                    .into_iter()
                    .map(|(author, body)| leaf(author, body))
                    .collect();
                root.comments.push(comment);
            }
            root.comments.extend(
                (1..AUTHORS.len()).map(|author| leaf(author, "joined".to_string())),
            );
            root
        })
}

fn count_nodes(doc: &ConversationDocument) -> usize {
    1 + doc.comments.iter().map(count_nodes).sum::<usize>()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn arena_preserves_every_node_and_orders_parents_first(doc in document_strategy()) {
        let template = ConversationTemplate::from_document("prop", &doc, PostKind::Text)
            .expect("text root needs no poll");
        prop_assert_eq!(template.len(), count_nodes(&doc));
        prop_assert!(template.root().is_root());
        for (index, node) in template.nodes().iter().enumerate().skip(1) {
            let parent = node.parent.expect("non-root nodes have parents");
            prop_assert!(parent < index);
        }
        prop_assert!(template.validate().is_ok());
    }

    #[test]
    fn globalised_mentions_resolve_to_bound_profiles(doc in document_strategy()) {
        let template = ConversationTemplate::from_document("prop", &doc, PostKind::Text)
            .expect("text root needs no poll");
        let mut mapping = TagMapping::new();
        for (i, author) in template.participants().into_iter().enumerate() {
            mapping.bind(author, format!("User{i:03}"));
        }
        let bound: Vec<String> = mapping.profiles().map(|p| format!("@{p}")).collect();
        for node in template.nodes() {
            let body = node.globalised_body(&mapping);
            for tag in body.split_whitespace().filter(|t| t.starts_with('@')) {
                prop_assert!(bound.contains(&tag.to_string()), "unbound mention {}", tag);
            }
            for tag in node.globalised_tags(&mapping).iter().filter(|t| t.starts_with('@')) {
                prop_assert!(bound.contains(tag));
            }
        }
    }
}
