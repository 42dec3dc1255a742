use std::sync::Arc;

use domain::RequestContext;
use quill_auth::{
    AuthError, AuthService, AuthSettings, AuthStores, JwtManager, ManualClock, TokenPayload,
    VerifyOptions,
};
use quill_storage::{
    CredentialStore, InMemoryAdminStore, InMemoryBlacklistStore, InMemoryCredentialStore,
    InMemoryUserStore, NewRefreshToken, RefreshTokenRecord, StorageError,
};

fn setup() -> (AuthService, Arc<ManualClock>, Arc<InMemoryCredentialStore>) {
    let clock = Arc::new(ManualClock::starting_now());
    let credentials = Arc::new(InMemoryCredentialStore::new());
    let stores = AuthStores {
        credentials: credentials.clone(),
        admins: Arc::new(InMemoryAdminStore::new()),
        users: Arc::new(InMemoryUserStore::new()),
        blacklist: Arc::new(InMemoryBlacklistStore::new()),
    };
    let jwt = JwtManager::new("secret", clock.clone());
    let service = AuthService::new(stores, jwt, AuthSettings::default());
    (service, clock, credentials)
}

#[tokio::test]
async fn refresh_rotates_nonce_and_invalidates_previous_token() {
    let (service, _, credentials) = setup();
    let ctx = RequestContext::from_ip("127.0.0.1");
    let session = service
        .create(&ctx, TokenPayload::user("u1"))
        .await
        .expect("create");
    let token_a = session.access_token.clone();

    let refreshed = service.refresh(Some(&token_a)).await.expect("refresh");
    let token_b = refreshed.access_token.clone();
    assert_ne!(token_a, token_b);

    // 同一条记录，nonce 已轮换
    assert_eq!(refreshed.refresh_token.id, session.refresh_token.id);
    assert_ne!(refreshed.refresh_token.token_id, session.refresh_token.token_id);
    let stored = credentials
        .get_raw(&session.refresh_token.id)
        .expect("record");
    assert_eq!(stored.token_id, refreshed.refresh_token.token_id);
    assert_eq!(credentials.len(), 1);

    let stale = service.verify(Some(&token_a), VerifyOptions::default()).await;
    assert!(matches!(stale, Err(AuthError::NotAuthorized)));

    let verified = service
        .verify(Some(&token_b), VerifyOptions::default())
        .await
        .expect("verify new token");
    assert_eq!(verified.access_token.id(), "u1");
}

#[tokio::test]
async fn superseded_token_cannot_refresh_again() {
    let (service, _, _) = setup();
    let ctx = RequestContext::default();
    let session = service
        .create(&ctx, TokenPayload::user("u1"))
        .await
        .expect("create");

    service
        .refresh(Some(&session.access_token))
        .await
        .expect("first refresh");
    let replay = service.refresh(Some(&session.access_token)).await;
    assert!(matches!(replay, Err(AuthError::NotAuthorized)));
}

#[tokio::test]
async fn expired_access_token_refreshes_with_later_expiry() {
    let (service, clock, _) = setup();
    let ctx = RequestContext::default();
    let session = service
        .create(&ctx, TokenPayload::user("u1"))
        .await
        .expect("create");

    clock.advance(AuthSettings::default().access_ttl_seconds + 1);
    let expired = service
        .verify(Some(&session.access_token), VerifyOptions::default())
        .await;
    assert!(matches!(expired, Err(AuthError::AccessTokenExpired)));

    let refreshed = service
        .refresh(Some(&session.access_token))
        .await
        .expect("refresh");
    assert!(refreshed.expires_at > session.expires_at);
    assert_ne!(refreshed.refresh_token.token_id, session.refresh_token.token_id);

    let claims = service
        .verify(Some(&refreshed.access_token), VerifyOptions::default())
        .await
        .expect("verify refreshed");
    assert_eq!(claims.access_token.exp, refreshed.expires_at);
}

#[tokio::test]
async fn refresh_keeps_session_expiry_and_role() {
    let (service, clock, _) = setup();
    let ctx = RequestContext::default();
    let session = service
        .create(&ctx, TokenPayload::admin("admin1"))
        .await
        .expect("create");

    clock.advance(120);
    let refreshed = service
        .refresh(Some(&session.access_token))
        .await
        .expect("refresh");
    assert_eq!(
        refreshed.refresh_token.expires_at,
        session.refresh_token.expires_at
    );
    assert!(refreshed.refresh_token.updated_at > session.refresh_token.updated_at);

    let verified = service
        .verify(Some(&refreshed.access_token), VerifyOptions::default())
        .await
        .expect("verify");
    assert!(verified.access_token.role().is_admin());
}

#[tokio::test]
async fn refresh_fails_once_session_expires() {
    let (service, clock, _) = setup();
    let ctx = RequestContext::default();
    let session = service
        .create(&ctx, TokenPayload::user("u1"))
        .await
        .expect("create");

    clock.advance(AuthSettings::default().refresh_ttl_seconds);
    let result = service.refresh(Some(&session.access_token)).await;
    assert!(matches!(result, Err(AuthError::RefreshTokenExpired)));
}

/// 在 save 前删除记录，模拟 refresh 与登出交错。
struct LogoutDuringSave {
    inner: InMemoryCredentialStore,
}

#[async_trait::async_trait]
impl CredentialStore for LogoutDuringSave {
    async fn create(&self, record: NewRefreshToken) -> Result<RefreshTokenRecord, StorageError> {
        self.inner.create(record).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<RefreshTokenRecord>, StorageError> {
        self.inner.find_by_id(id).await
    }

    async fn save(&self, record: &RefreshTokenRecord) -> Result<bool, StorageError> {
        self.inner.remove(&record.id);
        self.inner.save(record).await
    }

    async fn delete_by_token_id(&self, token_id: &str) -> Result<bool, StorageError> {
        self.inner.delete_by_token_id(token_id).await
    }

    async fn purge_expired(&self, now: u64) -> Result<u64, StorageError> {
        self.inner.purge_expired(now).await
    }
}

#[tokio::test]
async fn refresh_racing_logout_reports_expired_session() {
    let clock = Arc::new(ManualClock::starting_now());
    let stores = AuthStores {
        credentials: Arc::new(LogoutDuringSave {
            inner: InMemoryCredentialStore::new(),
        }),
        admins: Arc::new(InMemoryAdminStore::new()),
        users: Arc::new(InMemoryUserStore::new()),
        blacklist: Arc::new(InMemoryBlacklistStore::new()),
    };
    let service = AuthService::new(stores, JwtManager::new("secret", clock), AuthSettings::default());
    let session = service
        .create(&RequestContext::default(), TokenPayload::user("u1"))
        .await
        .expect("create");

    let result = service.refresh(Some(&session.access_token)).await;
    assert!(matches!(result, Err(AuthError::RefreshTokenExpired)));

    // 记录未被复活
    let after = service
        .verify(Some(&session.access_token), VerifyOptions::default())
        .await;
    assert!(matches!(after, Err(AuthError::RefreshTokenExpired)));
}
