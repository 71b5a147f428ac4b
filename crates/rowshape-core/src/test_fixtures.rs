//! Shared blog/post/comment fixtures for unit tests.

use crate::{
    model::{EntityRef, ModelError, Navigation, Record, RecordNavigation, downcast},
    shape::{EntityShape, KeySelector, ShapeNode, ShapePlan, ValueBinding},
    source::MemoryRowSource,
    tracking::ChangeTracker,
    value::{Value, ValueKind},
};
use parking_lot::Mutex;

pub(crate) const BLOG: &str = "Blog";
pub(crate) const POST: &str = "Post";
pub(crate) const COMMENT: &str = "Comment";

// Blog/post layout: [blog.id, blog.title, post.id, post.title]
pub(crate) const BLOG_POST_COLUMNS: usize = 4;

// Nested layout: [blog.id, blog.title, post.id, post.title, comment.id, comment.body]
pub(crate) const NESTED_COLUMNS: usize = 6;

pub(crate) fn blog_posts() -> Navigation {
    Navigation::collection(BLOG, "posts", POST, RecordNavigation::shared("posts"))
}

pub(crate) fn post_blog() -> Navigation {
    Navigation::reference(POST, "blog", BLOG, RecordNavigation::shared("blog"))
}

pub(crate) fn post_comments() -> Navigation {
    Navigation::collection(POST, "comments", COMMENT, RecordNavigation::shared("comments"))
}

pub(crate) fn comment_post() -> Navigation {
    Navigation::reference(COMMENT, "post", POST, RecordNavigation::shared("post"))
}

pub(crate) fn blog_shape() -> EntityShape {
    EntityShape::new(
        BLOG,
        vec![
            ValueBinding::new(0, ValueKind::Int),
            ValueBinding::new(1, ValueKind::Text),
        ],
        Record::constructor(BLOG, &["id", "title"]),
    )
}

/// Post read from columns 2 and 3; absent when the post id is NULL.
pub(crate) fn post_shape() -> EntityShape {
    EntityShape::new(
        POST,
        vec![
            ValueBinding::new(2, ValueKind::Int),
            ValueBinding::new(3, ValueKind::Text),
        ],
        Record::constructor(POST, &["id", "title"]),
    )
    .null_when(0)
}

pub(crate) fn comment_shape() -> EntityShape {
    EntityShape::new(
        COMMENT,
        vec![
            ValueBinding::new(4, ValueKind::Int),
            ValueBinding::new(5, ValueKind::Text),
        ],
        Record::constructor(COMMENT, &["id", "body"]),
    )
    .null_when(0)
}

/// Blog with its posts; post rows keyed by (blog.id, post.id).
pub(crate) fn blog_posts_node() -> ShapeNode {
    ShapeNode::entity(blog_shape()).include_collection(
        ShapeNode::entity(post_shape()),
        blog_posts(),
        Some(post_blog()),
        KeySelector::column(0, ValueKind::Int),
        KeySelector::optional_column(2, ValueKind::Int),
    )
}

pub(crate) fn blog_posts_plan() -> ShapePlan {
    ShapePlan::compile(blog_posts_node()).unwrap()
}

/// Blog -> posts -> comments.
pub(crate) fn nested_plan() -> ShapePlan {
    let post = ShapeNode::entity(post_shape()).include_collection(
        ShapeNode::entity(comment_shape()),
        post_comments(),
        Some(comment_post()),
        KeySelector::optional_column(2, ValueKind::Int),
        KeySelector::optional_column(4, ValueKind::Int),
    );
    let root = ShapeNode::entity(blog_shape()).include_collection(
        post,
        blog_posts(),
        Some(post_blog()),
        KeySelector::column(0, ValueKind::Int),
        KeySelector::optional_column(2, ValueKind::Int),
    );

    ShapePlan::compile(root).unwrap()
}

/// Rows for `(blog_id, post_id)` pairs; titles derive from ids.
pub(crate) fn blog_post_source(pairs: &[(i64, Option<i64>)]) -> MemoryRowSource {
    let rows = pairs
        .iter()
        .map(|&(blog, post)| {
            vec![
                Value::Int(blog),
                Value::from(format!("blog {blog}")),
                Value::from(post),
                Value::from(post.map(|id| format!("post {id}"))),
            ]
        })
        .collect();

    MemoryRowSource::new(BLOG_POST_COLUMNS, rows)
}

/// Rows for `(blog_id, post_id, comment_id)` triples.
pub(crate) fn nested_source(rows: &[(i64, Option<i64>, Option<i64>)]) -> MemoryRowSource {
    let rows = rows
        .iter()
        .map(|&(blog, post, comment)| {
            vec![
                Value::Int(blog),
                Value::from(format!("blog {blog}")),
                Value::from(post),
                Value::from(post.map(|id| format!("post {id}"))),
                Value::from(comment),
                Value::from(comment.map(|id| format!("comment {id}"))),
            ]
        })
        .collect();

    MemoryRowSource::new(NESTED_COLUMNS, rows)
}

pub(crate) fn record(entity: &EntityRef) -> &Record {
    downcast::<Record>(entity).unwrap()
}

pub(crate) fn id_of(entity: &EntityRef) -> i64 {
    record(entity).field("id").and_then(Value::as_int).unwrap()
}

pub(crate) fn collection_ids(entity: &EntityRef, navigation: &str) -> Vec<i64> {
    record(entity)
        .collection(navigation)
        .unwrap()
        .iter()
        .map(id_of)
        .collect()
}

///
/// RecordingTracker
///
/// Change tracker that only records what it was asked to do.
///

#[derive(Debug, Default)]
pub(crate) struct RecordingTracker {
    loaded: Mutex<Vec<&'static str>>,
    attached: Mutex<Vec<(&'static str, i64, i64)>>,
}

impl RecordingTracker {
    pub(crate) fn loaded(&self) -> Vec<&'static str> {
        self.loaded.lock().clone()
    }

    pub(crate) fn attached(&self) -> Vec<(&'static str, i64, i64)> {
        self.attached.lock().clone()
    }
}

impl ChangeTracker for RecordingTracker {
    fn mark_loaded(&self, _entity: &EntityRef, navigation: &Navigation) -> Result<(), ModelError> {
        self.loaded.lock().push(navigation.name());

        Ok(())
    }

    fn attach_fixup(
        &self,
        owner: &EntityRef,
        related: &EntityRef,
        navigation: &Navigation,
    ) -> Result<(), ModelError> {
        self.attached
            .lock()
            .push((navigation.name(), id_of(owner), id_of(related)));

        Ok(())
    }
}
