use serde::Serialize;
use tracing::debug;

use audiff_types::{DiffRecord, FieldPath, TypeKey};

use crate::config::DiffConfig;
use crate::defaults::default_handlers;
use crate::error::{DiffError, DiffResult};
use crate::introspect::introspect;
use crate::node::Node;
use crate::walker::Walker;

/// A diff engine bound to one frozen [`DiffConfig`].
///
/// The engine only exposes `&self` operations, so one instance can serve
/// concurrent diff calls; every call allocates its own record buffer.
#[derive(Clone, Debug, Default)]
pub struct DiffEngine {
    config: DiffConfig,
}

impl DiffEngine {
    /// Freeze `config` into an engine.
    pub fn new(config: DiffConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Diff two values of the same type.
    ///
    /// Returns the change records in emission order, or an error if the
    /// values differ in type anywhere or a handler fails. An empty vector
    /// means nothing auditable changed.
    pub fn diff<O, N>(&self, old: &O, new: &N) -> DiffResult<Vec<DiffRecord>>
    where
        O: ?Sized + Serialize,
        N: ?Sized + Serialize,
    {
        let (old_key, new_key) = (TypeKey::of::<O>(), TypeKey::of::<N>());
        if old_key != new_key {
            return Err(DiffError::TypeMismatch {
                old: old_key.short_name(),
                new: new_key.short_name(),
            });
        }

        let old = introspect(old, self.config.max_depth())?;
        let new = introspect(new, self.config.max_depth())?;
        self.diff_nodes(&old, &new)
    }

    /// Diff two already-introspected values.
    pub fn diff_nodes(&self, old: &Node, new: &Node) -> DiffResult<Vec<DiffRecord>> {
        let mut walker = Walker::new(&self.config, default_handlers());
        walker.walk(old, new, &FieldPath::root())?;
        let records = walker.into_records();
        debug!(records = records.len(), "diff complete");
        Ok(records)
    }
}

/// One-off diff with a borrowed config.
pub fn diff_with<O, N>(config: &DiffConfig, old: &O, new: &N) -> DiffResult<Vec<DiffRecord>>
where
    O: ?Sized + Serialize,
    N: ?Sized + Serialize,
{
    DiffEngine::new(config.clone()).diff(old, new)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;
    use serde::Serialize;
    use serde_json::json;

    use audiff_types::Media;

    use super::*;
    use crate::handler::compare_by_field;
    use crate::introspect::Opaque;

    #[derive(Clone, Debug, Default, Serialize)]
    #[serde(rename_all = "PascalCase")]
    struct Comment {
        text: String,
    }

    #[derive(Clone, Debug, Default, Serialize)]
    #[serde(rename_all = "PascalCase")]
    struct Tag {
        name: String,
    }

    #[derive(Clone, Debug, Default, Serialize)]
    #[serde(rename_all = "PascalCase")]
    struct Post {
        #[serde(rename = "ID")]
        id: u64,
        title: String,
        content: String,
        comments: Vec<Comment>,
        tags: BTreeMap<String, Tag>,
    }

    #[derive(Clone, Debug, Default, Serialize)]
    #[serde(rename_all = "PascalCase")]
    struct Author {
        name: String,
    }

    #[derive(Clone, Debug, Serialize)]
    #[serde(rename_all = "PascalCase")]
    struct Article {
        title: String,
        cover: Media,
        published_at: DateTime<Utc>,
        tags: Vec<Tag>,
        session: Opaque<u64>,
    }

    #[derive(Clone, Debug, Serialize)]
    #[serde(rename_all = "PascalCase")]
    struct Model {
        #[serde(rename = "ID")]
        id: u64,
        created_at: DateTime<Utc>,
    }

    #[derive(Clone, Debug, Serialize)]
    #[serde(rename_all = "PascalCase")]
    struct Page {
        #[serde(flatten)]
        model: Model,
        title: String,
        published_at: DateTime<Utc>,
        labels: Vec<Tag>,
    }

    #[derive(Clone, Debug, Default, Serialize)]
    #[serde(rename_all = "PascalCase")]
    struct Draft {
        title: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        published_at: Option<DateTime<Utc>>,
    }

    fn page() -> Page {
        Page {
            model: Model {
                id: 1,
                created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            },
            title: "hello".into(),
            published_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            labels: vec![],
        }
    }

    fn comments(texts: &[&str]) -> Vec<Comment> {
        texts
            .iter()
            .map(|t| Comment {
                text: t.to_string(),
            })
            .collect()
    }

    fn article() -> Article {
        Article {
            title: "hello".into(),
            cover: Media::new("/a.png"),
            published_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            tags: vec![Tag { name: "rust".into() }],
            session: Opaque(1),
        }
    }

    fn engine() -> DiffEngine {
        DiffEngine::default()
    }

    #[test]
    fn identical_values_produce_no_records() {
        let post = Post {
            title: "t".into(),
            comments: comments(&["a", "b"]),
            ..Post::default()
        };
        assert!(engine().diff(&post, &post).unwrap().is_empty());
    }

    #[test]
    fn ignored_identity_key_produces_no_records() {
        let old = Post {
            id: 1,
            ..Post::default()
        };
        let new = Post {
            id: 2,
            ..Post::default()
        };
        assert!(engine().diff(&old, &new).unwrap().is_empty());
    }

    #[test]
    fn struct_fields_are_reported_in_declaration_order() {
        let old = Post {
            title: "test".into(),
            content: "".into(),
            ..Post::default()
        };
        let new = Post {
            title: "test1".into(),
            content: "124".into(),
            ..Post::default()
        };
        assert_eq!(
            engine().diff(&old, &new).unwrap(),
            vec![
                DiffRecord::new("Title", "test", "test1"),
                DiffRecord::new("Content", "", "124"),
            ]
        );
    }

    #[test]
    fn truncated_sequence_reports_removed_tail() {
        let old = Post {
            comments: comments(&["1", "2"]),
            ..Post::default()
        };
        let new = Post {
            comments: comments(&["1.1"]),
            ..Post::default()
        };
        assert_eq!(
            engine().diff(&old, &new).unwrap(),
            vec![
                DiffRecord::new("Comments.0.Text", "1", "1.1"),
                DiffRecord::new("Comments.1", "{Text:2}", ""),
            ]
        );
    }

    #[test]
    fn extended_sequence_reports_added_tail() {
        let old = Post {
            comments: comments(&["1"]),
            ..Post::default()
        };
        let new = Post {
            comments: comments(&["1.1", "2"]),
            ..Post::default()
        };
        assert_eq!(
            engine().diff(&old, &new).unwrap(),
            vec![
                DiffRecord::new("Comments.0.Text", "1", "1.1"),
                DiffRecord::new("Comments.1", "", "{Text:2}"),
            ]
        );
    }

    #[test]
    fn added_map_key_is_reported_whole() {
        let tag = |name: &str| Tag { name: name.into() };
        let old = Post {
            tags: BTreeMap::from([("t1".to_string(), tag("a"))]),
            ..Post::default()
        };
        let new = Post {
            tags: BTreeMap::from([("t1".to_string(), tag("a")), ("t2".to_string(), tag("b"))]),
            ..Post::default()
        };
        assert_eq!(
            engine().diff(&old, &new).unwrap(),
            vec![DiffRecord::new("Tags.t2", "", "{Name:b}")]
        );
    }

    #[test]
    fn different_types_are_rejected() {
        let post = Post {
            title: "123".into(),
            ..Post::default()
        };
        let author = Author { name: "ccc".into() };
        let err = engine().diff(&post, &author).unwrap_err();
        assert_eq!(err.to_string(), "old and new type mismatch: Post != Author");
    }

    #[test]
    fn dynamic_values_with_different_shapes_are_rejected() {
        let err = engine()
            .diff(&json!({"a": "x"}), &json!({"a": {"b": 1}}))
            .unwrap_err();
        assert_eq!(err.to_string(), "old and new type mismatch: string != map");
    }

    #[test]
    fn json_null_follows_the_optional_rule() {
        let records = engine()
            .diff(&json!({"a": null}), &json!({"a": "x"}))
            .unwrap();
        assert_eq!(records, vec![DiffRecord::new("a", "", "x")]);
    }

    #[test]
    fn default_handlers_shape_known_types() {
        let old = article();
        let mut new = article();
        new.cover.file_size = 42;
        new.cover.description = "banner".into();
        new.published_at = new.published_at + chrono::Duration::milliseconds(10);
        new.session = Opaque(2);
        assert_eq!(
            engine().diff(&old, &new).unwrap(),
            vec![DiffRecord::new("Cover.description", "", "banner")]
        );
    }

    #[test]
    fn default_handler_wins_over_caller_handler() {
        let mut config = DiffConfig::new();
        config.add_type_handler::<Media, _>(|_, _, path| {
            Ok(vec![DiffRecord::new(path, "caller", "caller")])
        });
        let old = article();
        let mut new = article();
        new.cover.url = "/b.png".into();
        let records = DiffEngine::new(config).diff(&old, &new).unwrap();
        assert_eq!(records, vec![DiffRecord::new("Cover.url", "/a.png", "/b.png")]);
    }

    #[test]
    fn caller_handler_for_tag_lists() {
        let mut config = DiffConfig::new();
        config.add_type_handler::<Vec<Tag>, _>(compare_by_field("Name"));
        let old = article();
        let mut new = article();
        new.tags.push(Tag { name: "serde".into() });
        let records = DiffEngine::new(config).diff(&old, &new).unwrap();
        assert_eq!(records, vec![DiffRecord::new("Tags.1", "", "{Name:serde}")]);
    }

    #[test]
    fn failing_caller_handler_surfaces_its_path() {
        let mut config = DiffConfig::new();
        config.add_type_handler::<Vec<Tag>, _>(compare_by_field("Missing"));
        let err = DiffEngine::new(config)
            .diff(&article(), &article())
            .unwrap_err();
        assert!(matches!(
            err,
            DiffError::HandlerFailure { ref field_path, .. } if field_path == "Tags"
        ));
    }

    #[test]
    fn extra_ignored_fields_are_skipped() {
        let mut config = DiffConfig::new();
        config.add_ignored_fields(["Content"]);
        let old = Post::default();
        let new = Post {
            content: "changed".into(),
            ..Post::default()
        };
        assert!(diff_with(&config, &old, &new).unwrap().is_empty());
    }

    #[test]
    fn flattened_base_model_keeps_ignore_rules_and_defaults() {
        let old = page();
        let mut new = page();
        new.model.id = 2;
        new.model.created_at = new.model.created_at + chrono::Duration::seconds(5);
        new.published_at = new.published_at + chrono::Duration::milliseconds(10);
        assert!(engine().diff(&old, &new).unwrap().is_empty());
    }

    #[test]
    fn flattened_struct_fields_reach_caller_handlers() {
        let mut config = DiffConfig::new();
        config.add_type_handler::<Vec<Tag>, _>(|_, _, path| {
            Ok(vec![DiffRecord::new(path, "old labels", "new labels")])
        });
        let old = page();
        let mut new = page();
        new.title = "bye".into();
        new.published_at = new.published_at + chrono::Duration::hours(1);
        assert_eq!(
            DiffEngine::new(config).diff(&old, &new).unwrap(),
            vec![
                DiffRecord::new("Title", "hello", "bye"),
                DiffRecord::new("PublishedAt", "2024-01-01 00:00:00", "2024-01-01 01:00:00"),
                DiffRecord::new("Labels", "old labels", "new labels"),
            ]
        );
    }

    #[test]
    fn skipped_optional_fields_still_use_default_handlers() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
            + chrono::Duration::milliseconds(123);
        let unpublished = Draft::default();
        let published = Draft {
            published_at: Some(at),
            ..Draft::default()
        };
        assert_eq!(
            engine().diff(&unpublished, &published).unwrap(),
            vec![DiffRecord::new("PublishedAt", "", "2024-01-01 00:00:00")]
        );
        assert_eq!(
            engine().diff(&published, &unpublished).unwrap(),
            vec![DiffRecord::new("PublishedAt", "2024-01-01 00:00:00", "")]
        );
    }

    #[test]
    fn engine_is_shareable_across_threads() {
        let engine = std::sync::Arc::new(engine());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let engine = engine.clone();
                std::thread::spawn(move || {
                    let old = Author { name: "a".into() };
                    let new = Author {
                        name: format!("b{i}"),
                    };
                    engine.diff(&old, &new).unwrap()
                })
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            let records = handle.join().unwrap();
            assert_eq!(records, vec![DiffRecord::new("Name", "a", format!("b{i}"))]);
        }
    }

    proptest! {
        #[test]
        fn diff_is_reflexive(
            title in ".{0,12}",
            texts in proptest::collection::vec("[a-z0-9]{0,6}", 0..5),
            tags in proptest::collection::btree_map("[a-z]{1,4}", "[a-z]{0,4}", 0..4),
        ) {
            let post = Post {
                id: 7,
                title,
                content: String::new(),
                comments: texts.iter().map(|t| Comment { text: t.clone() }).collect(),
                tags: tags.into_iter().map(|(k, v)| (k, Tag { name: v })).collect(),
            };
            prop_assert!(engine().diff(&post, &post).unwrap().is_empty());
        }

        #[test]
        fn only_changed_titles_are_reported(a in "[a-z]{1,8}", b in "[a-z]{1,8}") {
            let old = Post { title: a.clone(), ..Post::default() };
            let new = Post { title: b.clone(), ..Post::default() };
            let records = engine().diff(&old, &new).unwrap();
            if a == b {
                prop_assert!(records.is_empty());
            } else {
                prop_assert_eq!(records, vec![DiffRecord::new("Title", a, b)]);
            }
        }
    }
}
