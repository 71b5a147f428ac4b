//! Blog/post/comment schema shared by the integration tests.
#![allow(dead_code)]

use rowshape_core::{
    model::{EntityConstructor, EntityRef, Navigation, Record, RecordNavigation, downcast},
    shape::{EntityShape, KeySelector, ShapeNode, ShapePlan, ValueBinding},
    source::MemoryRowSource,
    value::{Value, ValueKind},
};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

pub const BLOG: &str = "Blog";
pub const POST: &str = "Post";
pub const COMMENT: &str = "Comment";

pub fn blog_posts() -> Navigation {
    Navigation::collection(BLOG, "posts", POST, RecordNavigation::shared("posts"))
}

pub fn post_blog() -> Navigation {
    Navigation::reference(POST, "blog", BLOG, RecordNavigation::shared("blog"))
}

pub fn post_comments() -> Navigation {
    Navigation::collection(POST, "comments", COMMENT, RecordNavigation::shared("comments"))
}

pub fn comment_post() -> Navigation {
    Navigation::reference(COMMENT, "post", POST, RecordNavigation::shared("post"))
}

///
/// Counted
///
/// Wraps a constructor and counts how many entities it built.
///

#[derive(Clone, Default)]
pub struct Counted {
    calls: Arc<AtomicUsize>,
}

impl Counted {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn wrap(&self, inner: Arc<dyn EntityConstructor>) -> Arc<dyn EntityConstructor> {
        let calls = Arc::clone(&self.calls);

        Arc::new(move |values: Vec<Value>| {
            calls.fetch_add(1, Ordering::Relaxed);
            inner.construct(values)
        })
    }
}

// [blog.id, blog.title, post.id, post.title, comment.id, comment.body]
pub fn blog_shape(counted: &Counted) -> EntityShape {
    EntityShape::new(
        BLOG,
        vec![
            ValueBinding::new(0, ValueKind::Int),
            ValueBinding::new(1, ValueKind::Text),
        ],
        counted.wrap(Record::constructor(BLOG, &["id", "title"])),
    )
}

pub fn post_shape(counted: &Counted) -> EntityShape {
    EntityShape::new(
        POST,
        vec![
            ValueBinding::new(2, ValueKind::Int),
            ValueBinding::new(3, ValueKind::Text),
        ],
        counted.wrap(Record::constructor(POST, &["id", "title"])),
    )
    .null_when(0)
}

pub fn comment_shape(counted: &Counted) -> EntityShape {
    EntityShape::new(
        COMMENT,
        vec![
            ValueBinding::new(4, ValueKind::Int),
            ValueBinding::new(5, ValueKind::Text),
        ],
        counted.wrap(Record::constructor(COMMENT, &["id", "body"])),
    )
    .null_when(0)
}

pub fn posts_include(owner: ShapeNode, posts: ShapeNode) -> ShapeNode {
    owner.include_collection(
        posts,
        blog_posts(),
        Some(post_blog()),
        KeySelector::column(0, ValueKind::Int),
        KeySelector::optional_column(2, ValueKind::Int),
    )
}

/// Blog with posts; returns the plan and the post constructor counter.
pub fn blog_posts_plan() -> (ShapePlan, Counted) {
    let posts = Counted::default();
    let root = posts_include(
        ShapeNode::entity(blog_shape(&Counted::default())),
        ShapeNode::entity(post_shape(&posts)),
    );

    (ShapePlan::compile(root).unwrap(), posts)
}

/// Blog with posts, each post with comments.
pub fn nested_plan() -> ShapePlan {
    let counted = Counted::default();
    let post = ShapeNode::entity(post_shape(&counted)).include_collection(
        ShapeNode::entity(comment_shape(&counted)),
        post_comments(),
        Some(comment_post()),
        KeySelector::optional_column(2, ValueKind::Int),
        KeySelector::optional_column(4, ValueKind::Int),
    );

    ShapePlan::compile(posts_include(ShapeNode::entity(blog_shape(&counted)), post)).unwrap()
}

/// One row per `(blog, post, comment)`; titles are derived from ids.
pub fn rows(rows: &[(i64, Option<i64>, Option<i64>)]) -> MemoryRowSource {
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

    MemoryRowSource::new(6, rows)
}

pub fn record(entity: &EntityRef) -> &Record {
    downcast::<Record>(entity).unwrap()
}

pub fn id_of(entity: &EntityRef) -> i64 {
    record(entity).field("id").and_then(Value::as_int).unwrap()
}

pub fn ids(entities: &[EntityRef]) -> Vec<i64> {
    entities.iter().map(id_of).collect()
}

pub fn children(entity: &EntityRef, navigation: &str) -> Vec<EntityRef> {
    record(entity).collection(navigation).unwrap()
}
