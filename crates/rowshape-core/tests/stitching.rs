mod common;

use common::{blog_posts_plan, children, id_of, ids, nested_plan, record, rows};
use futures::StreamExt;
use rowshape_core::{
    enumerator::{AsyncShapedQuery, EnumeratorState, ShapedQuery},
    materialize::Materialized,
    model::{EntityRef, same_entity},
    obs::{DiagnosticsSink, MemoryDiagnosticsSink},
    shape::ShapePlan,
    source::MemoryRowSource,
};
use std::sync::Arc;

fn collect(plan: ShapePlan, source: MemoryRowSource) -> Vec<EntityRef> {
    ShapedQuery::new(plan, source)
        .iter()
        .map(|root| root.unwrap().into_entity().unwrap())
        .collect()
}

#[test]
fn round_trip_groups_three_rows_into_two_owners() {
    let source = rows(&[(1, Some(10), None), (1, Some(11), None), (2, Some(10), None)]);
    let activity = source.activity();
    let (plan, _) = blog_posts_plan();

    let blogs = collect(plan, source);

    assert_eq!(ids(&blogs), vec![1, 2]);
    assert_eq!(ids(&children(&blogs[0], "posts")), vec![10, 11]);
    assert_eq!(ids(&children(&blogs[1], "posts")), vec![10]);
    assert_eq!(activity.advances(), 4);
}

#[test]
fn duplicate_rows_contribute_one_related_entity() {
    let source = rows(&[(1, Some(10), Some(1)), (1, Some(10), Some(2))]);
    let (plan, posts) = blog_posts_plan();

    let blogs = collect(plan, source);

    assert_eq!(ids(&children(&blogs[0], "posts")), vec![10]);
    assert_eq!(posts.calls(), 1);
}

#[test]
fn each_row_builds_at_most_one_entity_per_node() {
    let source = rows(&[
        (1, Some(10), None),
        (1, Some(10), None),
        (1, Some(11), None),
        (2, None, None),
        (3, Some(30), None),
    ]);
    let (plan, posts) = blog_posts_plan();

    let blogs = collect(plan, source);

    assert_eq!(ids(&blogs), vec![1, 2, 3]);
    assert_eq!(posts.calls(), 3);
}

#[test]
fn owner_without_matches_gets_an_empty_collection() {
    let source = rows(&[(1, None, None), (2, None, None)]);
    let (plan, posts) = blog_posts_plan();

    let blogs = collect(plan, source);

    for blog in &blogs {
        assert_eq!(record(blog).collection("posts").map(|items| items.len()), Some(0));
        assert!(record(blog).is_loaded("posts"));
    }
    assert_eq!(posts.calls(), 0);
}

#[test]
fn related_entities_point_back_at_their_owner() {
    let source = rows(&[(1, Some(10), None), (1, Some(11), None)]);
    let (plan, _) = blog_posts_plan();

    let blogs = collect(plan, source);

    for post in children(&blogs[0], "posts") {
        let owner = record(&post).reference("blog").unwrap();
        assert!(same_entity(&owner, &blogs[0]));
    }
}

#[test]
fn nested_collections_attribute_sub_rows_to_the_right_parent() {
    let source = rows(&[
        (1, Some(10), Some(100)),
        (1, Some(10), Some(101)),
        (1, Some(11), None),
        (2, Some(20), Some(200)),
        (2, Some(20), Some(201)),
        (3, None, None),
    ]);
    let activity = source.activity();

    let blogs = collect(nested_plan(), source);

    assert_eq!(ids(&blogs), vec![1, 2, 3]);

    let first_posts = children(&blogs[0], "posts");
    assert_eq!(ids(&first_posts), vec![10, 11]);
    assert_eq!(ids(&children(&first_posts[0], "comments")), vec![100, 101]);
    assert_eq!(ids(&children(&first_posts[1], "comments")), Vec::<i64>::new());

    let second_posts = children(&blogs[1], "posts");
    assert_eq!(ids(&second_posts), vec![20]);
    assert_eq!(ids(&children(&second_posts[0], "comments")), vec![200, 201]);

    assert_eq!(ids(&children(&blogs[2], "posts")), Vec::<i64>::new());
    assert_eq!(activity.advances(), 7);
}

#[test]
fn nested_comment_references_its_post() {
    let source = rows(&[(1, Some(10), Some(100)), (1, Some(11), Some(110))]);

    let blogs = collect(nested_plan(), source);

    for post in children(&blogs[0], "posts") {
        for comment in children(&post, "comments") {
            let parent = record(&comment).reference("post").unwrap();
            assert_eq!(id_of(&parent), id_of(&post));
            assert!(same_entity(&parent, &post));
        }
    }
}

#[test]
fn disposing_after_exhaustion_is_a_no_op() {
    let source = rows(&[(1, Some(10), None)]);
    let activity = source.activity();
    let (plan, _) = blog_posts_plan();
    let mut query = ShapedQuery::new(plan, source);
    let mut enumerator = query.iter();

    while enumerator.move_next().unwrap() {}
    assert_eq!(enumerator.state(), EnumeratorState::Exhausted);

    enumerator.dispose();
    enumerator.dispose();

    assert_eq!(enumerator.state(), EnumeratorState::Exhausted);
    assert_eq!(activity.closes(), 1);
    assert_eq!(activity.cursor_closes(), 1);
}

#[tokio::test]
async fn cancellation_mid_advance_exposes_no_partial_root() {
    let source = rows(&[
        (1, Some(10), None),
        (1, Some(11), None),
        (2, Some(20), None),
    ])
    .with_stall_at(2);
    let sink = Arc::new(MemoryDiagnosticsSink::new());
    let (plan, _) = blog_posts_plan();
    let mut query = AsyncShapedQuery::new(plan, source)
        .with_diagnostics(Arc::clone(&sink) as Arc<dyn DiagnosticsSink>);
    let cancel = query.cancellation_token().clone();
    let mut enumerator = query.iter();

    tokio::spawn(async move { cancel.cancel() });
    let outcome = enumerator.move_next().await;

    assert!(outcome.unwrap_err().is_cancelled());
    assert!(enumerator.current().is_none());
    assert_eq!(enumerator.state(), EnumeratorState::Faulted);
    assert_eq!(sink.len(), 1);
}

#[tokio::test]
async fn stream_yields_the_same_roots_as_the_blocking_iterator() {
    let data = [
        (1, Some(10), Some(100)),
        (1, Some(10), Some(101)),
        (2, None, None),
        (3, Some(30), Some(300)),
    ];
    let expected = collect(nested_plan(), rows(&data));

    let mut query = AsyncShapedQuery::new(nested_plan(), rows(&data));
    let roots: Vec<Materialized> = query
        .iter()
        .into_stream()
        .map(Result::unwrap)
        .collect()
        .await;
    let blogs: Vec<EntityRef> = roots
        .into_iter()
        .map(|root| root.into_entity().unwrap())
        .collect();

    assert_eq!(ids(&blogs), ids(&expected));
    for (left, right) in blogs.iter().zip(&expected) {
        assert_eq!(ids(&children(left, "posts")), ids(&children(right, "posts")));
    }
}
