//! Crate-level tests: versioned writes and role-gated post routes

#[cfg(test)]
mod updater_tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use kernel::id::{PostId, UserId};

    use crate::application::OptimisticPostUpdater;
    use crate::domain::entities::{Post, PostFields};
    use crate::domain::repository::PostRepository;
    use crate::error::{FeedError, FeedResult};
    use crate::infra::memory::InMemoryPostRepository;

    fn fields(title: &str, content: &str) -> PostFields {
        PostFields::new(title.into(), content.into(), vec![]).unwrap()
    }

    async fn seeded(store: &InMemoryPostRepository) -> Post {
        let post = Post::new(UserId::new(), fields("first", "draft"));
        store.create(&post).await.unwrap();
        post
    }

    #[derive(Clone, Copy)]
    enum Rival {
        Edit,
        Delete,
    }

    /// Lets another writer act between the updater's read and its write
    struct RacingRepository {
        inner: InMemoryPostRepository,
        rival: Rival,
        races_left: AtomicU32,
    }

    impl RacingRepository {
        fn new(inner: InMemoryPostRepository, rival: Rival, races: u32) -> Self {
            Self {
                inner,
                rival,
                races_left: AtomicU32::new(races),
            }
        }
    }

    impl PostRepository for RacingRepository {
        async fn create(&self, post: &Post) -> FeedResult<()> {
            self.inner.create(post).await
        }

        async fn find_by_id(&self, post_id: &PostId) -> FeedResult<Option<Post>> {
            self.inner.find_by_id(post_id).await
        }

        async fn update_if_version(
            &self,
            post_id: &PostId,
            expected_version: i32,
            fields: &PostFields,
        ) -> FeedResult<Option<Post>> {
            let raced = self
                .races_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if raced {
                match self.rival {
                    Rival::Edit => {
                        let rival = PostFields::new("rival".into(), "rival".into(), vec![])?;
                        self.inner
                            .update_if_version(post_id, expected_version, &rival)
                            .await?;
                    }
                    Rival::Delete => {
                        self.inner.delete(post_id).await?;
                    }
                }
            }
            self.inner
                .update_if_version(post_id, expected_version, fields)
                .await
        }

        async fn delete(&self, post_id: &PostId) -> FeedResult<bool> {
            self.inner.delete(post_id).await
        }
    }

    fn append_bang(post: &Post) -> FeedResult<PostFields> {
        Ok(post.fields().patched(None, Some(format!("{}!", post.content)), None)?)
    }

    #[tokio::test]
    async fn test_stale_write_conflicts_and_leaves_post_unchanged() {
        let store = InMemoryPostRepository::new();
        let post = seeded(&store).await;
        let updater = OptimisticPostUpdater::new(Arc::new(store.clone()));

        // Bring the post to version 3
        updater.update(&post.post_id, 1, &fields("a", "v2")).await.unwrap();
        let at_three = updater.update(&post.post_id, 2, &fields("a", "v3")).await.unwrap();
        assert_eq!(at_three.version, 3);

        let first = updater
            .update(&post.post_id, 3, &fields("winner", "v4"))
            .await
            .unwrap();
        assert_eq!(first.version, 4);

        let second = updater
            .update(&post.post_id, 3, &fields("loser", "stale"))
            .await;
        assert!(matches!(second, Err(FeedError::VersionConflict)));

        let stored = store.find_by_id(&post.post_id).await.unwrap().unwrap();
        assert_eq!(stored.version, 4);
        assert_eq!(stored.title, "winner");
        assert_eq!(stored.created_at, post.created_at);
    }

    #[tokio::test]
    async fn test_missing_post_is_a_conflict_for_single_writes() {
        let updater = OptimisticPostUpdater::new(Arc::new(InMemoryPostRepository::new()));
        let result = updater.update(&PostId::new(), 1, &fields("t", "c")).await;
        assert!(matches!(result, Err(FeedError::VersionConflict)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_on_one_version_have_one_winner() {
        let store = InMemoryPostRepository::new();
        let post = seeded(&store).await;
        let updater = Arc::new(OptimisticPostUpdater::new(Arc::new(store.clone())));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let updater = Arc::clone(&updater);
                let post_id = post.post_id;
                tokio::spawn(async move {
                    updater
                        .update(&post_id, 1, &fields("t", &format!("writer {i}")))
                        .await
                })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => winners += 1,
                Err(FeedError::VersionConflict) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(winners, 1);
        let stored = store.find_by_id(&post.post_id).await.unwrap().unwrap();
        assert_eq!(stored.version, 2);
    }

    #[tokio::test]
    async fn test_retry_reapplies_change_on_fresh_version() {
        let store = InMemoryPostRepository::new();
        let post = seeded(&store).await;
        let racing = RacingRepository::new(store.clone(), Rival::Edit, 1);
        let updater = OptimisticPostUpdater::new(Arc::new(racing));

        let updated = updater
            .update_with_retry(&post.post_id, 3, append_bang)
            .await
            .unwrap();

        // The rival took version 2; the retry built on top of it
        assert_eq!(updated.version, 3);
        assert_eq!(updated.content, "rival!");
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let store = InMemoryPostRepository::new();
        let post = seeded(&store).await;
        let racing = RacingRepository::new(store.clone(), Rival::Edit, 10);
        let updater = OptimisticPostUpdater::new(Arc::new(racing));

        let result = updater.update_with_retry(&post.post_id, 3, append_bang).await;
        assert!(matches!(result, Err(FeedError::VersionConflict)));

        // Only the rival's three writes landed
        let stored = store.find_by_id(&post.post_id).await.unwrap().unwrap();
        assert_eq!(stored.version, 4);
        assert_eq!(stored.content, "rival");
    }

    #[tokio::test]
    async fn test_retry_reports_not_found_when_post_vanishes() {
        let store = InMemoryPostRepository::new();
        let post = seeded(&store).await;
        let racing = RacingRepository::new(store.clone(), Rival::Delete, 1);
        let updater = OptimisticPostUpdater::new(Arc::new(racing));

        let result = updater.update_with_retry(&post.post_id, 3, append_bang).await;
        assert!(matches!(result, Err(FeedError::NotFound)));
    }

    #[tokio::test]
    async fn test_retry_stops_on_invalid_change() {
        let store = InMemoryPostRepository::new();
        let post = seeded(&store).await;
        let updater = OptimisticPostUpdater::new(Arc::new(store.clone()));

        let result = updater
            .update_with_retry(&post.post_id, 3, |p| {
                Ok(p.fields().patched(Some(String::new()), None, None)?)
            })
            .await;
        assert!(matches!(result, Err(FeedError::Validation(_))));
    }
}

#[cfg(test)]
mod route_tests {
    use std::sync::Arc;

    use auth::application::{
        AuthConfig, AuthorizationChain, JwtAuthenticator, TokenAuthenticator, UserLookup,
    };
    use auth::domain::entity::role::RoleId;
    use auth::domain::value_object::{Email, UserName};
    use auth::domain::User;
    use auth::{AuthGuard, InMemoryUserRepository, MemoryUserCache};
    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use kernel::id::{PostId, UserId};
    use platform::password::HashedPassword;
    use platform::rate_limit::RateLimitConfig;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::application::FeedConfig;
    use crate::domain::entities::{Post, PostFields};
    use crate::domain::repository::PostRepository;
    use crate::infra::memory::InMemoryPostRepository;
    use crate::presentation::{FeedAppState, feed_router};

    const FIXTURE_HASH: &str =
        "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQ$RdescudvJCsgt3ub+b+dWRWJTmaaJObG";

    struct Harness {
        app: Router,
        posts: InMemoryPostRepository,
        users: InMemoryUserRepository,
        tokens: Arc<dyn TokenAuthenticator>,
        cookie_name: String,
    }

    impl Harness {
        fn new() -> Self {
            let config = AuthConfig::development();
            let users = InMemoryUserRepository::new();
            let posts = InMemoryPostRepository::new();
            let tokens: Arc<dyn TokenAuthenticator> =
                Arc::new(JwtAuthenticator::from_config(&config));

            let repo = Arc::new(users.clone());
            let lookup = UserLookup::new(
                Arc::clone(&repo),
                Arc::new(MemoryUserCache::new()),
                config.user_cache_ttl,
            );
            let chain = Arc::new(AuthorizationChain::new(
                RateLimitConfig::disabled().build(),
                Arc::clone(&tokens),
                lookup,
                repo,
                config.basic_auth.clone(),
            ));
            let guard = AuthGuard::new(chain, config.cookie.name.as_str());
            let state = FeedAppState::new(Arc::new(posts.clone()), guard, FeedConfig::default());

            Self {
                app: feed_router(state),
                posts,
                users,
                tokens,
                cookie_name: config.cookie.name.clone(),
            }
        }

        /// Active account with the given role; returns its session cookie
        fn member(&self, name: &str, role_id: RoleId) -> (UserId, String) {
            let mut user = User::new(
                UserName::new(name).unwrap(),
                Email::new(format!("{name}@example.com")).unwrap(),
                HashedPassword::from_phc_string(FIXTURE_HASH).unwrap(),
            );
            user.is_active = true;
            user.role_id = role_id;
            let id = user.user_id;
            self.users.insert(user).unwrap();

            let token = self.tokens.issue_for(&id).unwrap();
            (id, format!("{}={}", self.cookie_name, token))
        }

        async fn post_by(&self, owner: UserId) -> Post {
            let fields = PostFields::new("hello".into(), "world".into(), vec![]).unwrap();
            let post = Post::new(owner, fields);
            self.posts.create(&post).await.unwrap();
            post
        }

        async fn send(&self, req: Request<Body>) -> Response {
            self.app.clone().oneshot(req).await.unwrap()
        }
    }

    fn with_body(method: &str, uri: &str, cookie: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::COOKIE, cookie)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn without_body(method: &str, uri: &str, cookie: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(res: Response) -> Value {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_routes_require_a_session() {
        let h = Harness::new();
        let res = h
            .send(Request::get(format!("/{}", PostId::new())).body(Body::empty()).unwrap())
            .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_starts_at_version_one() {
        let h = Harness::new();
        let (owner, cookie) = h.member("writer", RoleId::USER);

        let res = h
            .send(with_body(
                "POST",
                "/",
                &cookie,
                json!({ "title": "hi", "content": "first post", "tags": ["intro"] }),
            ))
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let body = json_body(res).await;
        assert_eq!(body["version"], 1);
        assert_eq!(body["ownerId"], owner.to_string());

        let res = h
            .send(without_body("GET", &format!("/{}", body["id"].as_str().unwrap()), &cookie))
            .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_patch_is_gated_by_owner_or_moderator() {
        let h = Harness::new();
        let (owner, owner_cookie) = h.member("owner", RoleId::USER);
        let (_, stranger_cookie) = h.member("stranger", RoleId::USER);
        let (_, moderator_cookie) = h.member("moderator", RoleId::MODERATOR);
        let post = h.post_by(owner).await;
        let uri = format!("/{}", post.post_id);

        let res = h
            .send(with_body("PATCH", &uri, &stranger_cookie, json!({ "content": "mine now" })))
            .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = h
            .send(with_body("PATCH", &uri, &moderator_cookie, json!({ "content": "moderated" })))
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await["version"], 2);

        let res = h
            .send(with_body(
                "PATCH",
                &uri,
                &owner_cookie,
                json!({ "title": "edited", "version": 2 }),
            ))
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body["version"], 3);
        assert_eq!(body["title"], "edited");
        assert_eq!(body["content"], "moderated");
    }

    #[tokio::test]
    async fn test_patch_with_stale_version_is_an_edit_conflict() {
        let h = Harness::new();
        let (owner, cookie) = h.member("owner", RoleId::USER);
        let post = h.post_by(owner).await;
        let uri = format!("/{}", post.post_id);

        let res = h
            .send(with_body("PATCH", &uri, &cookie, json!({ "content": "one", "version": 1 })))
            .await;
        assert_eq!(res.status(), StatusCode::OK);

        let res = h
            .send(with_body("PATCH", &uri, &cookie, json!({ "content": "two", "version": 1 })))
            .await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
        let body = json_body(res).await;
        assert!(body["detail"].as_str().unwrap().starts_with("edit conflict"));
        assert_eq!(body["retryable"], false);

        let stored = h.posts.find_by_id(&post.post_id).await.unwrap().unwrap();
        assert_eq!(stored.version, 2);
        assert_eq!(stored.content, "one");
    }

    #[tokio::test]
    async fn test_delete_needs_owner_or_admin() {
        let h = Harness::new();
        let (owner, _) = h.member("owner", RoleId::USER);
        let (_, moderator_cookie) = h.member("moderator", RoleId::MODERATOR);
        let (_, admin_cookie) = h.member("admin", RoleId::ADMIN);
        let post = h.post_by(owner).await;
        let uri = format!("/{}", post.post_id);

        let res = h.send(without_body("DELETE", &uri, &moderator_cookie)).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = h.send(without_body("DELETE", &uri, &admin_cookie)).await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);

        let res = h.send(without_body("DELETE", &uri, &admin_cookie)).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_owner_can_delete_own_post() {
        let h = Harness::new();
        let (owner, cookie) = h.member("owner", RoleId::USER);
        let post = h.post_by(owner).await;

        let res = h
            .send(without_body("DELETE", &format!("/{}", post.post_id), &cookie))
            .await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        assert!(h.posts.find_by_id(&post.post_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_fields_are_rejected() {
        let h = Harness::new();
        let (_, cookie) = h.member("writer", RoleId::USER);

        let res = h
            .send(with_body("POST", "/", &cookie, json!({ "title": "", "content": "body" })))
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
