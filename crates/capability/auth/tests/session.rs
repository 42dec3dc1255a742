use std::sync::Arc;

use domain::{AuthCheck, RequestContext};
use quill_auth::{
    AuthError, AuthService, AuthSettings, AuthStores, Identity, JwtManager, ManualClock,
    TokenPayload, VerifyOptions,
};
use quill_storage::{
    AdminRecord, InMemoryAdminStore, InMemoryBlacklistStore, InMemoryCredentialStore,
    InMemoryUserStore, UserRecord,
};

struct Harness {
    service: AuthService,
    clock: Arc<ManualClock>,
    credentials: Arc<InMemoryCredentialStore>,
    admins: Arc<InMemoryAdminStore>,
    users: Arc<InMemoryUserStore>,
}

fn harness() -> Harness {
    let clock = Arc::new(ManualClock::starting_now());
    let credentials = Arc::new(InMemoryCredentialStore::new());
    let admins = Arc::new(InMemoryAdminStore::new());
    let users = Arc::new(InMemoryUserStore::new());
    let stores = AuthStores {
        credentials: credentials.clone(),
        admins: admins.clone(),
        users: users.clone(),
        blacklist: Arc::new(InMemoryBlacklistStore::new()),
    };
    let service = AuthService::new(
        stores,
        JwtManager::new("secret", clock.clone()),
        AuthSettings::default(),
    );
    Harness {
        service,
        clock,
        credentials,
        admins,
        users,
    }
}

fn user(id: &str) -> UserRecord {
    UserRecord {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        password_hash: "unused".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        suspended: false,
        created_at: 0,
    }
}

fn admin(id: &str) -> AdminRecord {
    AdminRecord {
        id: id.to_string(),
        username: "root".to_string(),
        password_hash: "unused".to_string(),
        role: "prime-admin".to_string(),
    }
}

#[tokio::test]
async fn created_session_verifies_immediately() {
    let h = harness();
    h.users.insert(user("u1"));
    let ctx = RequestContext::from_ip("10.0.0.7");

    let session = h
        .service
        .create(&ctx, TokenPayload::user("u1"))
        .await
        .expect("create");
    assert_eq!(session.refresh_token.user, "u1");
    assert_eq!(session.refresh_token.created_by_ip.as_deref(), Some("10.0.0.7"));
    assert_eq!(
        session.refresh_token.expires_at,
        h.clock_now() + AuthSettings::default().refresh_ttl_seconds
    );

    let verified = h
        .service
        .verify(Some(&session.access_token), VerifyOptions::default())
        .await
        .expect("verify");
    assert_eq!(verified.access_token.id(), "u1");
    assert_eq!(verified.refresh_token.id, session.refresh_token.id);
    assert!(verified.identity.is_none());

    let checked = h
        .service
        .verify(
            Some(&session.access_token),
            VerifyOptions::checked(AuthCheck::any()),
        )
        .await
        .expect("checked verify");
    match checked.identity {
        Some(Identity::User(record)) => assert_eq!(record.id, "u1"),
        other => panic!("unexpected identity: {other:?}"),
    }
}

impl Harness {
    fn clock_now(&self) -> u64 {
        self.service.jwt().now()
    }
}

#[tokio::test]
async fn missing_or_garbage_header_is_rejected() {
    let h = harness();
    let missing = h.service.verify(None, VerifyOptions::default()).await;
    assert!(matches!(missing, Err(AuthError::AuthorizationRequired)));

    let blank = h.service.verify(Some("  "), VerifyOptions::default()).await;
    assert!(matches!(blank, Err(AuthError::AuthorizationRequired)));

    let garbage = h
        .service
        .verify(Some("abc.def.ghi"), VerifyOptions::default())
        .await;
    assert!(matches!(garbage, Err(AuthError::TokenInvalid)));
}

#[tokio::test]
async fn expired_access_token_only_passes_refresh_verification() {
    let h = harness();
    let session = h
        .service
        .create(&RequestContext::default(), TokenPayload::user("u1"))
        .await
        .expect("create");

    h.clock.advance(AuthSettings::default().access_ttl_seconds + 1);
    let plain = h
        .service
        .verify(Some(&session.access_token), VerifyOptions::default())
        .await;
    assert!(matches!(plain, Err(AuthError::AccessTokenExpired)));

    let for_refresh = h
        .service
        .verify(Some(&session.access_token), VerifyOptions::refresh())
        .await
        .expect("refresh verification");
    assert_eq!(for_refresh.access_token.id(), "u1");
}

#[tokio::test]
async fn deleted_refresh_record_wins_over_expiry() {
    let h = harness();
    let session = h
        .service
        .create(&RequestContext::default(), TokenPayload::user("u1"))
        .await
        .expect("create");
    assert!(h.credentials.remove(&session.refresh_token.id));

    let fresh = h
        .service
        .verify(Some(&session.access_token), VerifyOptions::default())
        .await;
    assert!(matches!(fresh, Err(AuthError::RefreshTokenExpired)));

    h.clock.advance(AuthSettings::default().access_ttl_seconds + 1);
    let expired = h
        .service
        .verify(Some(&session.access_token), VerifyOptions::default())
        .await;
    assert!(matches!(expired, Err(AuthError::RefreshTokenExpired)));
}

#[tokio::test]
async fn lingering_expired_record_is_rejected() {
    let h = harness();
    let session = h
        .service
        .create(&RequestContext::default(), TokenPayload::user("u1"))
        .await
        .expect("create");

    // 存储尚未清理，但记录已超过 expires_at
    h.clock.advance(AuthSettings::default().refresh_ttl_seconds);
    assert!(h.credentials.get_raw(&session.refresh_token.id).is_some());
    let result = h
        .service
        .verify(Some(&session.access_token), VerifyOptions::refresh())
        .await;
    assert!(matches!(result, Err(AuthError::RefreshTokenExpired)));

    let purged = h.service.purge_expired_sessions().await.expect("purge");
    assert_eq!(purged, 1);
    assert!(h.credentials.is_empty());
}

#[tokio::test]
async fn admin_only_check_rejects_user_token() {
    let h = harness();
    h.users.insert(user("u1"));
    let session = h
        .service
        .create(&RequestContext::default(), TokenPayload::user("u1"))
        .await
        .expect("create");

    let result = h
        .service
        .verify(
            Some(&session.access_token),
            VerifyOptions::checked(AuthCheck::admin()),
        )
        .await;
    assert!(matches!(result, Err(AuthError::NotAuthorized)));
}

#[tokio::test]
async fn admin_token_satisfies_user_and_admin_checks() {
    let h = harness();
    h.admins.insert(admin("admin1"));
    let session = h
        .service
        .create(&RequestContext::default(), TokenPayload::admin("admin1"))
        .await
        .expect("create");

    for check in [AuthCheck::admin(), AuthCheck::user(), AuthCheck::any()] {
        let verified = h
            .service
            .verify(Some(&session.access_token), VerifyOptions::checked(check))
            .await
            .expect("verify");
        assert!(matches!(verified.identity, Some(Identity::Admin(_))));
    }
}

#[tokio::test]
async fn admin_token_without_admin_record_is_account_not_found() {
    let h = harness();
    let session = h
        .service
        .create(&RequestContext::default(), TokenPayload::admin("admin1"))
        .await
        .expect("create");

    for check in [AuthCheck::user(), AuthCheck::admin()] {
        let result = h
            .service
            .verify(Some(&session.access_token), VerifyOptions::checked(check))
            .await;
        assert!(matches!(result, Err(AuthError::AccountNotFound)));
    }
}

#[tokio::test]
async fn deleted_identity_is_account_not_found() {
    let h = harness();
    h.users.insert(user("u1"));
    let session = h
        .service
        .create(&RequestContext::default(), TokenPayload::user("u1"))
        .await
        .expect("create");
    assert!(h.users.remove("u1"));

    let verified = h
        .service
        .verify(Some(&session.access_token), VerifyOptions::default())
        .await
        .expect("unchecked verify");
    let current = h
        .service
        .get_current_user(Some(&verified.access_token))
        .await;
    assert!(matches!(current, Err(AuthError::AccountNotFound)));

    let checked = h
        .service
        .verify(
            Some(&session.access_token),
            VerifyOptions::checked(AuthCheck::any()),
        )
        .await;
    assert!(matches!(checked, Err(AuthError::AccountNotFound)));
}

#[tokio::test]
async fn current_user_requires_token() {
    let h = harness();
    let result = h.service.get_current_user(None).await;
    assert!(matches!(result, Err(AuthError::TokenMissingFromReq)));
}

#[tokio::test]
async fn logout_removes_session() {
    let h = harness();
    let session = h
        .service
        .create(&RequestContext::default(), TokenPayload::user("u1"))
        .await
        .expect("create");
    let verified = h
        .service
        .verify(Some(&session.access_token), VerifyOptions::default())
        .await
        .expect("verify");

    assert!(h.service.logout(&verified.access_token).await.expect("logout"));
    assert!(!h.service.logout(&verified.access_token).await.expect("repeat logout"));

    let result = h
        .service
        .verify(Some(&session.access_token), VerifyOptions::default())
        .await;
    assert!(matches!(result, Err(AuthError::RefreshTokenExpired)));
}

#[test]
fn default_settings_use_config_ttls() {
    let settings = AuthSettings::default();
    assert_eq!(
        settings.access_ttl_seconds,
        quill_config::DEFAULT_ACCESS_TOKEN_TTL_SECONDS
    );
    assert_eq!(
        settings.refresh_ttl_seconds,
        quill_config::DEFAULT_REFRESH_TOKEN_TTL_SECONDS
    );
}

#[test]
fn error_status_and_tags() {
    assert_eq!(AuthError::AuthorizationRequired.status(), 400);
    assert_eq!(AuthError::TokenInvalid.status(), 400);
    assert_eq!(AuthError::RefreshTokenExpired.status(), 401);
    assert_eq!(AuthError::AccessTokenExpired.status(), 401);
    assert_eq!(AuthError::NotAuthorized.status(), 401);
    assert_eq!(AuthError::AccountNotFound.status(), 404);
    assert_eq!(AuthError::TokenMissingFromReq.status(), 400);
    assert_eq!(AuthError::NotAuthorized.error_type(), "NotAuthorized");
    assert_eq!(AuthError::ResourceNotFound.status(), 404);
    assert_eq!(AuthError::NotSuspendedAccount.status(), 400);
    assert_eq!(AuthError::UserBanned.status(), 400);
    assert_eq!(AuthError::UserBanned.error_type(), "UserBanned");
}
