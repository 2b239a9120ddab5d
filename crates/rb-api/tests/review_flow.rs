//! The client engine driving the real handlers over HTTP.

use actix_web::{web, App, HttpServer};
use rb_api::{configure_routes, AppState};
use rb_auth_simple::SimpleAuthProvider;
use rb_core::{
    Credentials, DraftEdit, NewPost, PostSynchronizer, SubmitError, TracingSink,
};
use rb_db_sqlite::SqliteReviewRepo;
use rb_http_client::HttpClient;
use std::sync::Arc;
use std::time::Duration;

async fn spawn_server() -> String {
    let repo = SqliteReviewRepo::new("sqlite::memory:").await.unwrap();
    let state = web::Data::new(AppState {
        repo: Box::new(repo),
        auth: Box::new(SimpleAuthProvider::new("e2e-secret", 1)),
        cookie_secure: false,
    });

    let server = HttpServer::new(move || {
        App::new().app_data(state.clone()).configure(configure_routes)
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    format!("http://{}", addr)
}

fn engine(client: &Arc<HttpClient>) -> PostSynchronizer {
    PostSynchronizer::new(client.clone(), client.clone(), Arc::new(TracingSink))
}

fn credentials(name: &str) -> Credentials {
    Credentials { username: name.into(), password: "hunter2".into() }
}

#[actix_web::test]
async fn create_then_update_over_http() {
    let base = spawn_server().await;
    let client = Arc::new(HttpClient::new(&base, Duration::from_secs(5)).unwrap());
    let registered = client.register(&credentials("mia")).await.unwrap();
    let created = client
        .create_post(&NewPost {
            title: "Dunes".into(),
            description: "Sand all the way".into(),
            location: "Coast".into(),
        })
        .await
        .unwrap();
    let post_id = created.post_id;

    let sync = engine(&client);
    let snapshot = sync.refresh().await.unwrap();
    assert_eq!(snapshot.current_user.as_ref().map(|u| u.as_str()), Some(registered.user_id.as_str()));
    assert_eq!(snapshot.posts.len(), 1);
    assert!(!sync.has_reviewed(post_id));

    sync.update_draft(post_id, DraftEdit::Rating(Some(5)));
    sync.update_draft(post_id, DraftEdit::Content("  lovely  ".into()));
    let first = sync.submit(post_id).await.unwrap();
    assert_eq!(first.count, 1);
    assert!(sync.has_reviewed(post_id));
    assert_eq!(sync.draft(post_id).unwrap().content, "lovely");

    sync.update_draft(post_id, DraftEdit::Rating(Some(3)));
    let second = sync.submit(post_id).await.unwrap();
    assert_eq!(second.count, 1);
    assert_eq!(second.ratings[0].id, first.ratings[0].id);
    assert_eq!(second.average, Some(3.0));

    // A fresh fetch agrees with what the write returned.
    let refreshed = sync.refresh().await.unwrap();
    assert_eq!(refreshed.posts[0].reviews, second);
    assert_eq!(sync.aggregate_label(post_id).as_deref(), Some("3.0 (1 review)"));
}

#[actix_web::test]
async fn two_users_each_get_one_review() {
    let base = spawn_server().await;
    let mia = Arc::new(HttpClient::new(&base, Duration::from_secs(5)).unwrap());
    let ted = Arc::new(HttpClient::new(&base, Duration::from_secs(5)).unwrap());
    mia.register(&credentials("mia")).await.unwrap();
    ted.register(&credentials("ted")).await.unwrap();
    let post_id = mia
        .create_post(&NewPost {
            title: "Harbour".into(),
            description: "Boats".into(),
            location: String::new(),
        })
        .await
        .unwrap()
        .post_id;

    let mia_sync = engine(&mia);
    let ted_sync = engine(&ted);
    mia_sync.refresh().await.unwrap();
    ted_sync.refresh().await.unwrap();

    mia_sync.update_draft(post_id, DraftEdit::Rating(Some(4)));
    mia_sync.submit(post_id).await.unwrap();
    ted_sync.update_draft(post_id, DraftEdit::Rating(Some(2)));
    let agg = ted_sync.submit(post_id).await.unwrap();

    assert_eq!(agg.count, 2);
    assert_eq!(agg.average, Some(3.0));
    assert!(agg.is_consistent());
}

#[actix_web::test]
async fn logged_out_client_cannot_submit() {
    let base = spawn_server().await;
    let client = Arc::new(HttpClient::new(&base, Duration::from_secs(5)).unwrap());
    client.register(&credentials("mia")).await.unwrap();
    let post_id = client
        .create_post(&NewPost {
            title: "Dunes".into(),
            description: "Sand".into(),
            location: String::new(),
        })
        .await
        .unwrap()
        .post_id;
    client.logout().await.unwrap();

    let sync = engine(&client);
    let snapshot = sync.refresh().await.unwrap();
    assert_eq!(snapshot.current_user, None);
    assert!(matches!(sync.submit(post_id).await, Err(SubmitError::NotAuthenticated)));
}
