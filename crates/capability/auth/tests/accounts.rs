use std::sync::Arc;

use domain::RequestContext;
use quill_auth::{
    AuthError, AuthService, AuthSettings, AuthStores, Identity, JwtManager, ManualClock,
    UserRegistration, VerifyOptions, verify_password,
};
use quill_storage::{
    InMemoryAdminStore, InMemoryBlacklistStore, InMemoryCredentialStore, InMemoryUserStore,
};

fn service() -> AuthService {
    let clock = Arc::new(ManualClock::starting_now());
    let stores = AuthStores {
        credentials: Arc::new(InMemoryCredentialStore::new()),
        admins: Arc::new(InMemoryAdminStore::new()),
        users: Arc::new(InMemoryUserStore::new()),
        blacklist: Arc::new(InMemoryBlacklistStore::new()),
    };
    AuthService::new(
        stores,
        JwtManager::new("secret", clock),
        AuthSettings::default(),
    )
}

fn registration(email: &str) -> UserRegistration {
    UserRegistration {
        email: email.to_string(),
        password: "pass1234".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
    }
}

#[tokio::test]
async fn register_then_login_user() {
    let service = service();
    let ctx = RequestContext::from_ip("127.0.0.1");

    let (user, tokens) = service
        .register_user(&ctx, registration("ada@example.com"))
        .await
        .expect("register");
    let verified = service
        .verify(Some(&tokens.access_token), VerifyOptions::default())
        .await
        .expect("verify");
    assert_eq!(verified.access_token.id(), user.id);
    assert!(!verified.access_token.role().is_admin());

    let duplicate = service
        .register_user(&ctx, registration("ada@example.com"))
        .await;
    assert!(matches!(duplicate, Err(AuthError::EmailInUse)));

    let (logged_in, _) = service
        .login_user(&ctx, "ada@example.com", "pass1234")
        .await
        .expect("login");
    assert_eq!(logged_in.id, user.id);

    let wrong = service.login_user(&ctx, "ada@example.com", "nope").await;
    assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
    let unknown = service.login_user(&ctx, "bob@example.com", "pass1234").await;
    assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn only_one_admin_can_register() {
    let service = service();
    let ctx = RequestContext::default();

    let (admin, tokens) = service
        .register_admin(&ctx, "root", "correct-horse")
        .await
        .expect("register admin");
    assert_eq!(admin.role, "prime-admin");
    let verified = service
        .verify(Some(&tokens.access_token), VerifyOptions::default())
        .await
        .expect("verify");
    assert!(verified.access_token.role().is_admin());

    let second = service.register_admin(&ctx, "other", "correct-horse").await;
    assert!(matches!(second, Err(AuthError::AdminExists)));

    let (logged_in, _) = service
        .login_admin(&ctx, "root", "correct-horse")
        .await
        .expect("login");
    assert_eq!(logged_in.id, admin.id);
    let wrong = service.login_admin(&ctx, "root", "battery-staple").await;
    assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn change_password_requires_current_password() {
    let service = service();
    let ctx = RequestContext::default();
    let (user, _) = service
        .register_user(&ctx, registration("ada@example.com"))
        .await
        .expect("register");
    let identity = Identity::User(user);

    let wrong = service.change_password(&identity, "nope", "newpass").await;
    assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));

    let updated = service
        .change_password(&identity, "pass1234", "newpass")
        .await
        .expect("change");
    assert!(verify_password(&updated.password_hash, "newpass").expect("verify"));

    service
        .login_user(&ctx, "ada@example.com", "newpass")
        .await
        .expect("login with new password");
}

#[tokio::test]
async fn change_password_is_user_only() {
    let service = service();
    let (admin, _) = service
        .register_admin(&RequestContext::default(), "root", "correct-horse")
        .await
        .expect("register admin");
    let result = service
        .change_password(&Identity::Admin(admin), "correct-horse", "another-one")
        .await;
    assert!(matches!(result, Err(AuthError::AccountNotFound)));
}

#[tokio::test]
async fn concurrent_admin_registration_admits_one() {
    let service = Arc::new(service());
    let tasks: Vec<_> = (0..4)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .register_admin(&RequestContext::default(), &format!("root-{i}"), "correct-horse")
                    .await
            })
        })
        .collect();

    let mut admitted = 0;
    let mut rejected = 0;
    for task in tasks {
        match task.await.expect("join") {
            Ok(_) => admitted += 1,
            Err(AuthError::AdminExists) => rejected += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(admitted, 1);
    assert_eq!(rejected, 3);
}
