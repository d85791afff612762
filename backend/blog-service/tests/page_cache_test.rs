#[macro_use]
mod common;

use actix_web::test;
use blog_service::cache::PageCache;
use blog_service::db::{PostFilter, PostRepository};

use common::Harness;

#[actix_web::test]
async fn deleted_post_stays_on_cached_index_until_cleared() {
    let harness = Harness::new();
    let author = harness.user("auth").await;
    harness.posts(&author, None, 1).await;
    let app = init_app!(harness);

    let req = test::TestRequest::get().uri("/").to_request();
    let before = test::call_and_read_body(&app, req).await;

    let posts = harness
        .store
        .list_posts(PostFilter::All, 10, 0)
        .await
        .unwrap();
    harness.store.delete_post(posts[0].id).await.unwrap();

    let req = test::TestRequest::get().uri("/").to_request();
    let cached = test::call_and_read_body(&app, req).await;
    assert_eq!(before, cached);

    harness.cache.clear().await.unwrap();

    let req = test::TestRequest::get().uri("/").to_request();
    let fresh = test::call_and_read_body(&app, req).await;
    assert_ne!(before, fresh);
}

#[actix_web::test]
async fn new_post_is_not_visible_on_cached_index() {
    let harness = Harness::new();
    let author = harness.user("auth").await;
    let app = init_app!(harness);

    let req = test::TestRequest::get().uri("/").to_request();
    let before = test::call_and_read_body(&app, req).await;
    assert_eq!(harness.cache.len(), 1);

    harness.posts(&author, None, 1).await;

    let req = test::TestRequest::get().uri("/").to_request();
    assert_eq!(test::call_and_read_body(&app, req).await, before);
}

#[actix_web::test]
async fn each_page_is_cached_separately() {
    let harness = Harness::new();
    let author = harness.user("auth").await;
    harness.posts(&author, None, 11).await;
    let app = init_app!(harness);

    for uri in ["/", "/?page=2"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        test::call_service(&app, req).await;
    }
    assert_eq!(harness.cache.len(), 2);
}
