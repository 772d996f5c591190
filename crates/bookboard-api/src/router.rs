use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;
use crate::{auth, chat, notices};

/// All application routes. The caller adds the session and trace layers.
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(notices::index))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/dashboard", get(notices::dashboard))
        .route("/post_notice", post(notices::post_notice))
        .route("/delete_notice/{notice_id}", get(notices::delete_notice))
        .route("/chat/{notice_id}", get(chat::chat_view))
        .route("/send_dm/{notice_id}", post(chat::send_dm))
        .route("/conversations/{notice_id}", get(chat::conversations))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, SessionManagerLayer};

    use bookboard_db::Database;
    use bookboard_types::models::Sender;

    use super::*;
    use crate::passwords::{Passwords, cheap_argon2};
    use crate::state::AppStateInner;

    struct TestApp {
        app: Router,
        state: AppState,
    }

    impl TestApp {
        fn new() -> Self {
            let state: AppState = Arc::new(AppStateInner {
                db: Database::open_in_memory().unwrap(),
                passwords: Passwords::new(cheap_argon2()).unwrap(),
            });
            let session_layer = SessionManagerLayer::new(MemoryStore::default()).with_secure(false);
            let app = routes(state.clone()).layer(session_layer);
            Self { app, state }
        }

        /// A fresh browser with an empty cookie jar.
        fn browser(&self) -> Browser {
            Browser {
                app: self.app.clone(),
                cookie: None,
            }
        }

        async fn logged_in(&self, username: &str, password: &str) -> Browser {
            let mut browser = self.browser();
            let form = format!("username={}&password={}", username, password);
            let reply = browser.post("/register", &form).await;
            assert_eq!(reply.location.as_deref(), Some("/login"));
            let reply = browser.post("/login", &form).await;
            assert_eq!(reply.location.as_deref(), Some("/dashboard"));
            browser
        }

        fn notice_id(&self, owner: &str, book_name: &str) -> String {
            self.state
                .db
                .list_notices_by_owner(owner)
                .unwrap()
                .into_iter()
                .find(|n| n.book_name == book_name)
                .map(|n| n.id)
                .unwrap()
        }
    }

    struct Reply {
        status: StatusCode,
        location: Option<String>,
        body: String,
    }

    struct Browser {
        app: Router,
        cookie: Option<String>,
    }

    impl Browser {
        async fn get(&mut self, uri: &str) -> Reply {
            self.send(Request::get(uri).body(Body::empty()).unwrap()).await
        }

        async fn post(&mut self, uri: &str, form: &str) -> Reply {
            let req = Request::post(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form.to_string()))
                .unwrap();
            self.send(req).await
        }

        async fn follow(&mut self, reply: Reply) -> Reply {
            assert_eq!(reply.status, StatusCode::SEE_OTHER);
            let location = reply.location.unwrap();
            self.get(&location).await
        }

        async fn send(&mut self, mut req: Request<Body>) -> Reply {
            if let Some(cookie) = &self.cookie {
                req.headers_mut().insert(header::COOKIE, cookie.parse().unwrap());
            }

            let resp = self.app.clone().oneshot(req).await.unwrap();

            if let Some(set_cookie) = resp.headers().get(header::SET_COOKIE) {
                let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
                self.cookie = Some(pair.to_string());
            }

            let status = resp.status();
            let location = resp
                .headers()
                .get(header::LOCATION)
                .map(|v| v.to_str().unwrap().to_string());
            let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();

            Reply {
                status,
                location,
                body: String::from_utf8(bytes.to_vec()).unwrap(),
            }
        }
    }

    /// Value of the first `name="..."` attribute in `body`.
    fn attr(body: &str, name: &str) -> String {
        let marker = format!("{}=\"", name);
        let start = body.find(&marker).unwrap() + marker.len();
        let len = body[start..].find('"').unwrap();
        body[start..start + len].to_string()
    }

    #[tokio::test]
    async fn test_register_twice_keeps_first_password() {
        let app = TestApp::new();
        let mut browser = app.browser();

        let reply = browser.post("/register", "username=alice&password=pw1").await;
        assert_eq!(reply.location.as_deref(), Some("/login"));
        let page = browser.follow(reply).await;
        assert!(page.body.contains("Registration successful! Please login."));

        let reply = browser.post("/register", "username=alice&password=other").await;
        assert_eq!(reply.location.as_deref(), Some("/register"));
        let page = browser.follow(reply).await;
        assert!(page.body.contains("Username already exists"));

        let reply = browser.post("/login", "username=alice&password=pw1").await;
        assert_eq!(reply.location.as_deref(), Some("/dashboard"));

        let mut other = app.browser();
        let reply = other.post("/login", "username=alice&password=other").await;
        assert_eq!(reply.location.as_deref(), Some("/login"));
    }

    #[tokio::test]
    async fn test_register_trims_username_and_stores_hash() {
        let app = TestApp::new();
        let mut browser = app.browser();

        browser.post("/register", "username=++alice++&password=pw1").await;
        let user = app.state.db.get_user("alice").unwrap().unwrap();
        assert!(Passwords::is_hash(&user.password_hash));

        let reply = browser.post("/register", "username=+++&password=pw1").await;
        assert_eq!(reply.location.as_deref(), Some("/register"));
        let page = browser.follow(reply).await;
        assert!(page.body.contains("Username and password are required"));
    }

    #[tokio::test]
    async fn test_login_failures_are_generic() {
        let app = TestApp::new();
        app.logged_in("alice", "pw1").await;

        let mut wrong_password = app.browser();
        let reply = wrong_password.post("/login", "username=alice&password=nope").await;
        assert_eq!(reply.location.as_deref(), Some("/login"));
        let wrong_password_page = wrong_password.follow(reply).await;

        let mut unknown_user = app.browser();
        let reply = unknown_user.post("/login", "username=mallory&password=pw1").await;
        assert_eq!(reply.location.as_deref(), Some("/login"));
        let unknown_user_page = unknown_user.follow(reply).await;

        assert!(wrong_password_page.body.contains("Invalid credentials"));
        assert_eq!(wrong_password_page.body, unknown_user_page.body);

        let reply = wrong_password.get("/dashboard").await;
        assert_eq!(reply.location.as_deref(), Some("/login"));
    }

    #[tokio::test]
    async fn test_protected_routes_redirect_to_login() {
        let app = TestApp::new();
        let mut browser = app.browser();

        for uri in ["/dashboard", "/delete_notice/0000000000000001", "/conversations/0000000000000001"] {
            let reply = browser.get(uri).await;
            assert_eq!(reply.location.as_deref(), Some("/login"), "{}", uri);
        }

        let reply = browser.post("/post_notice", "book_name=Dune").await;
        assert_eq!(reply.location.as_deref(), Some("/login"));
        assert!(app.state.db.list_notices().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_book_name_is_rejected() {
        let app = TestApp::new();
        let mut alice = app.logged_in("alice", "pw1").await;

        for form in ["book_name=&description=x", "book_name=+++&description=x"] {
            let reply = alice.post("/post_notice", form).await;
            assert_eq!(reply.location.as_deref(), Some("/dashboard"));
            let page = alice.follow(reply).await;
            assert!(page.body.contains("Book name is required"));
        }

        assert!(app.state.db.list_notices().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_anonymous_threads_are_separate() {
        let app = TestApp::new();
        let mut alice = app.logged_in("alice", "pw1").await;
        alice.post("/post_notice", "book_name=Dune").await;
        let id = app.notice_id("alice", "Dune");

        let mut first = app.browser();
        let mut second = app.browser();
        first.post(&format!("/send_dm/{}", id), "message=from+first").await;
        second.post(&format!("/send_dm/{}", id), "message=from+second").await;

        let first_page = first.get(&format!("/chat/{}", id)).await;
        let second_page = second.get(&format!("/chat/{}", id)).await;

        assert!(first_page.body.contains("from first"));
        assert!(!first_page.body.contains("from second"));
        assert!(second_page.body.contains("from second"));
        assert!(!second_page.body.contains("from first"));

        let first_anon = attr(&first_page.body, "data-anon-id");
        let second_anon = attr(&second_page.body, "data-anon-id");
        assert_ne!(first_anon, second_anon);

        let threads = app.state.db.get_threads(&id).unwrap();
        assert_eq!(threads.len(), 2);
        assert_eq!(threads[&first_anon][0].text, "from first");
        assert_eq!(threads[&second_anon][0].sender, Sender::Anonymous);
    }

    #[tokio::test]
    async fn test_anon_id_is_stable_across_requests() {
        let app = TestApp::new();
        let mut alice = app.logged_in("alice", "pw1").await;
        alice.post("/post_notice", "book_name=Dune").await;
        let id = app.notice_id("alice", "Dune");

        let mut visitor = app.browser();
        let before = attr(&visitor.get(&format!("/chat/{}", id)).await.body, "data-anon-id");
        visitor.post(&format!("/send_dm/{}", id), "message=hello").await;
        let after = attr(&visitor.get(&format!("/chat/{}", id)).await.body, "data-anon-id");

        assert_eq!(before, after);
        assert_eq!(app.state.db.get_thread(&id, &before).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() {
        let app = TestApp::new();
        let mut alice = app.logged_in("alice", "pw1").await;
        alice.post("/post_notice", "book_name=Dune").await;
        let id = app.notice_id("alice", "Dune");

        let mut visitor = app.browser();
        let reply = visitor.post(&format!("/send_dm/{}", id), "message=++").await;
        assert_eq!(reply.location, Some(format!("/chat/{}", id)));
        let page = visitor.follow(reply).await;
        assert!(page.body.contains("Message cannot be empty"));
        assert!(app.state.db.get_threads(&id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_notice() {
        let app = TestApp::new();
        let mut visitor = app.browser();

        let reply = visitor.get("/chat/ffffffffffffffff").await;
        assert_eq!(reply.location.as_deref(), Some("/"));
        let page = visitor.follow(reply).await;
        assert!(page.body.contains("Notice not found"));

        let reply = visitor.post("/send_dm/ffffffffffffffff", "message=hi").await;
        assert_eq!(reply.location.as_deref(), Some("/"));
        visitor.follow(reply).await;

        let reply = visitor.post("/send_dm/ffffffffffffffff", "message=").await;
        assert_eq!(reply.location.as_deref(), Some("/"));
        let page = visitor.follow(reply).await;
        let empty_at = page.body.find("Message cannot be empty").unwrap();
        let missing_at = page.body.find("Notice not found").unwrap();
        assert!(empty_at < missing_at);
    }

    #[tokio::test]
    async fn test_dashboard_shows_only_own_notices() {
        let app = TestApp::new();
        let mut alice = app.logged_in("alice", "pw1").await;
        let mut bob = app.logged_in("bob", "pw2").await;
        alice.post("/post_notice", "book_name=Dune").await;
        bob.post("/post_notice", "book_name=Emma").await;
        let dune = app.notice_id("alice", "Dune");
        let emma = app.notice_id("bob", "Emma");

        let mut visitor = app.browser();
        visitor.post(&format!("/send_dm/{}", dune), "message=hi").await;
        let mut other = app.browser();
        other.post(&format!("/send_dm/{}", dune), "message=hello").await;

        let page = bob.get("/dashboard").await;
        assert!(page.body.contains(&format!("data-notice-id=\"{}\"", emma)));
        assert!(!page.body.contains(&dune));
        assert!(page.body.contains("0 conversation(s)"));

        let page = alice.get("/dashboard").await;
        assert!(page.body.contains(&format!("data-notice-id=\"{}\"", dune)));
        assert!(!page.body.contains(&emma));
        assert!(page.body.contains("2 conversation(s)"));
    }

    #[tokio::test]
    async fn test_delete_notice() {
        let app = TestApp::new();
        let mut alice = app.logged_in("alice", "pw1").await;
        let mut bob = app.logged_in("bob", "pw2").await;
        alice.post("/post_notice", "book_name=Dune").await;
        let id = app.notice_id("alice", "Dune");

        let mut visitor = app.browser();
        visitor.post(&format!("/send_dm/{}", id), "message=still+there%3F").await;

        let reply = bob.get(&format!("/delete_notice/{}", id)).await;
        assert_eq!(reply.location.as_deref(), Some("/dashboard"));
        let page = bob.follow(reply).await;
        assert!(page.body.contains("Access denied"));
        assert!(app.state.db.get_notice(&id).unwrap().is_some());
        assert_eq!(app.state.db.get_threads(&id).unwrap().len(), 1);

        let reply = alice.get(&format!("/delete_notice/{}", id)).await;
        let page = alice.follow(reply).await;
        assert!(page.body.contains("Notice deleted successfully!"));

        let listing = visitor.get("/").await;
        assert!(!listing.body.contains(&id));
        assert!(app.state.db.get_threads(&id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_conversations_are_owner_only() {
        let app = TestApp::new();
        let mut alice = app.logged_in("alice", "pw1").await;
        let mut bob = app.logged_in("bob", "pw2").await;
        alice.post("/post_notice", "book_name=Dune").await;
        let id = app.notice_id("alice", "Dune");

        let reply = bob.get(&format!("/conversations/{}", id)).await;
        assert_eq!(reply.location.as_deref(), Some("/dashboard"));
        let page = bob.follow(reply).await;
        assert!(page.body.contains("Access denied"));

        let reply = alice.get("/conversations/ffffffffffffffff").await;
        assert_eq!(reply.location.as_deref(), Some("/dashboard"));
    }

    #[tokio::test]
    async fn test_owner_message_goes_to_owner_thread() {
        let app = TestApp::new();
        let mut alice = app.logged_in("alice", "pw1").await;
        alice.post("/post_notice", "book_name=Dune").await;
        let id = app.notice_id("alice", "Dune");

        let mut visitor = app.browser();
        visitor.post(&format!("/send_dm/{}", id), "message=hello").await;
        alice.post(&format!("/send_dm/{}", id), "message=reply").await;

        let page = alice.get(&format!("/chat/{}", id)).await;
        let owner_anon = attr(&page.body, "data-anon-id");

        let threads = app.state.db.get_threads(&id).unwrap();
        assert_eq!(threads.len(), 2);
        assert_eq!(threads[&owner_anon].len(), 1);
        assert_eq!(threads[&owner_anon][0].sender, Sender::Owner);
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let app = TestApp::new();
        let mut alice = app.logged_in("alice", "pw1").await;
        assert_eq!(alice.get("/dashboard").await.status, StatusCode::OK);

        let reply = alice.get("/logout").await;
        assert_eq!(reply.location.as_deref(), Some("/"));
        let reply = alice.get("/dashboard").await;
        assert_eq!(reply.location.as_deref(), Some("/login"));
    }

    #[tokio::test]
    async fn test_end_to_end() {
        let app = TestApp::new();
        let mut alice = app.logged_in("alice", "pw1").await;

        alice.post("/post_notice", "book_name=Emma&description=older").await;
        let reply = alice.post("/post_notice", "book_name=Dune").await;
        let dashboard = alice.follow(reply).await;
        assert!(dashboard.body.contains("Notice posted successfully!"));
        let id = app.notice_id("alice", "Dune");

        let mut visitor = app.browser();
        let listing = visitor.get("/").await;
        assert_eq!(listing.status, StatusCode::OK);
        let dune = listing.body.find("Dune").unwrap();
        let emma = listing.body.find("Emma").unwrap();
        assert!(dune < emma);

        let reply = visitor
            .post(&format!("/send_dm/{}", id), "message=Is+this+available%3F")
            .await;
        let chat = visitor.follow(reply).await;
        assert!(chat.body.contains("Is this available?"));
        let anon_id = attr(&chat.body, "data-anon-id");

        let conversations = alice.get(&format!("/conversations/{}", id)).await;
        assert_eq!(conversations.status, StatusCode::OK);
        assert_eq!(attr(&conversations.body, "data-anon-id"), anon_id);
        assert!(conversations.body.contains("Is this available?"));
    }
}
