#[macro_use]
mod common;

use actix_web::{http::StatusCode, test};
use blog_service::models::Identity;
use serde_json::Value;

use common::{bearer, location, Harness};

fn object_count(body: &Value) -> usize {
    body["context"]["page_obj"]["object_list"]
        .as_array()
        .map(Vec::len)
        .unwrap_or_default()
}

#[actix_web::test]
async fn follow_and_unfollow_redirect_to_follow_feed() {
    let harness = Harness::new();
    let reader = harness.user("reader").await;
    let author = harness.user("author").await;
    let app = init_app!(harness);

    let req = test::TestRequest::get()
        .uri("/profile/author/follow/")
        .insert_header(bearer(&reader))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/follow/");
    assert_eq!(harness.store.follow_count().await, 1);

    let req = test::TestRequest::get()
        .uri("/profile/author/")
        .insert_header(bearer(&reader))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["context"]["following"], true);

    let req = test::TestRequest::get()
        .uri("/profile/author/unfollow/")
        .insert_header(bearer(&reader))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(location(&resp), "/follow/");
    assert_eq!(harness.store.follow_count().await, 0);

    let req = test::TestRequest::get()
        .uri("/profile/author/")
        .insert_header(bearer(&author))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["context"]["itsme"], true);
}

#[actix_web::test]
async fn following_twice_leaves_one_edge() {
    let harness = Harness::new();
    let reader = harness.user("reader").await;
    harness.user("author").await;
    let app = init_app!(harness);

    for _ in 0..2 {
        let req = test::TestRequest::get()
            .uri("/profile/author/follow/")
            .insert_header(bearer(&reader))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
    }
    assert_eq!(harness.store.follow_count().await, 1);
}

#[actix_web::test]
async fn following_yourself_is_ignored() {
    let harness = Harness::new();
    let reader = harness.user("reader").await;
    let app = init_app!(harness);

    let req = test::TestRequest::get()
        .uri("/profile/reader/follow/")
        .insert_header(bearer(&reader))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(location(&resp), "/follow/");
    assert_eq!(harness.store.follow_count().await, 0);
}

#[actix_web::test]
async fn following_unknown_author_is_not_found() {
    let harness = Harness::new();
    let reader = harness.user("reader").await;
    let app = init_app!(harness);

    let req = test::TestRequest::get()
        .uri("/profile/ghost/follow/")
        .insert_header(bearer(&reader))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn anonymous_actor_is_sent_to_login() {
    let harness = Harness::new();
    harness.user("author").await;
    let app = init_app!(harness);

    for (path, next) in [
        ("/follow/", "/follow/"),
        ("/profile/author/follow/", "/profile/author/follow/"),
        ("/profile/author/unfollow/", "/profile/author/unfollow/"),
    ] {
        let req = test::TestRequest::get().uri(path).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), format!("/auth/login/?next={}", next));
    }
    assert_eq!(harness.store.follow_count().await, 0);
}

#[actix_web::test]
async fn new_post_reaches_followers_only() {
    let harness = Harness::new();
    let follower = harness.user("follower").await;
    let stranger = harness.user("stranger").await;
    let author = harness.user("author").await;
    harness.posts(&author, None, 2).await;
    let app = init_app!(harness);

    let req = test::TestRequest::get()
        .uri("/profile/author/follow/")
        .insert_header(bearer(&follower))
        .to_request();
    test::call_service(&app, req).await;

    let feed = |actor: &Identity| {
        test::TestRequest::get()
            .uri("/follow/")
            .insert_header(bearer(actor))
            .to_request()
    };

    let before_follower: Value = test::call_and_read_body_json(&app, feed(&follower)).await;
    let before_stranger: Value = test::call_and_read_body_json(&app, feed(&stranger)).await;
    assert_eq!(before_follower["template"], "posts/follow.html");
    assert_eq!(object_count(&before_follower), 2);
    assert_eq!(object_count(&before_stranger), 0);

    let req = test::TestRequest::post()
        .uri("/create/")
        .insert_header(bearer(&author))
        .set_form([("text", "Новый пост")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let after_follower: Value = test::call_and_read_body_json(&app, feed(&follower)).await;
    let after_stranger: Value = test::call_and_read_body_json(&app, feed(&stranger)).await;
    assert_eq!(object_count(&after_follower), object_count(&before_follower) + 1);
    assert_eq!(after_follower["context"]["page_obj"]["object_list"][0]["text"], "Новый пост");
    assert_eq!(object_count(&after_stranger), object_count(&before_stranger));
}
