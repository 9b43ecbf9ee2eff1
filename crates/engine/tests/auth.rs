mod common;

use chrono::{Duration, Utc};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, Statement, Value};

use engine::{
    AuthError, AuthPolicy, EngineError, Limits, OAuthIdentity, OAuthOutcome, Role, SessionEvent,
};

use common::{engine_with, engine_with_db};

const PASSWORD: &str = "hunter22a";

fn auth_err(err: EngineError) -> AuthError {
    match err {
        EngineError::Auth(auth) => auth,
        other => panic!("expected an auth error, got {other:?}"),
    }
}

/// Moves every timestamp written by `sql` one minute into the past.
async fn backdate(db: &DatabaseConnection, sql: &str) {
    let past = Utc::now() - Duration::minutes(1);
    db.execute(Statement::from_sql_and_values(
        DbBackend::Sqlite,
        sql,
        [Value::from(past)],
    ))
    .await
    .unwrap();
}

fn google(subject: &str, email: &str) -> OAuthOutcome {
    OAuthOutcome::Completed(OAuthIdentity {
        provider: "google".to_string(),
        subject: subject.to_string(),
        email: email.to_string(),
        display_name: None,
    })
}

#[tokio::test]
async fn sign_up_then_sign_in() {
    let (engine, _db) = engine_with_db().await;

    let signed_up = engine
        .sign_up(" Ivan@Example.com ", PASSWORD, "Ivan")
        .await
        .unwrap();
    assert_eq!(signed_up.user.email, "ivan@example.com");
    assert_eq!(signed_up.user.role, Role::User);
    assert_eq!(signed_up.user.provider, "password");

    let signed_in = engine.sign_in("ivan@example.com", PASSWORD).await.unwrap();
    assert_eq!(signed_in.user.id, signed_up.user.id);
    assert_ne!(signed_in.token, signed_up.token);

    let me = engine.session_user(&signed_in.token).await.unwrap();
    assert_eq!(me.id, signed_up.user.id);
}

#[tokio::test]
async fn sign_up_rejections() {
    let (engine, _db) = engine_with_db().await;
    engine
        .sign_up("judy@example.com", PASSWORD, "Judy")
        .await
        .unwrap();

    let cases = [
        ("judy@example.com", PASSWORD, AuthError::EmailInUse),
        ("JUDY@example.com", PASSWORD, AuthError::EmailInUse),
        ("not-an-email", PASSWORD, AuthError::InvalidEmail),
        ("kim@example.com", "short1", AuthError::WeakPassword),
        ("kim@example.com", "lettersonly", AuthError::WeakPassword),
    ];
    for (email, password, expected) in cases {
        let err = engine.sign_up(email, password, "Kim").await.unwrap_err();
        assert_eq!(auth_err(err), expected, "{email}");
    }
}

#[tokio::test]
async fn sign_in_rejections() {
    let (engine, _db) = engine_with_db().await;
    engine
        .sign_up("leo@example.com", PASSWORD, "Leo")
        .await
        .unwrap();

    let err = engine
        .sign_in("nobody@example.com", PASSWORD)
        .await
        .unwrap_err();
    assert_eq!(auth_err(err), AuthError::UserNotFound);

    let err = engine
        .sign_in("leo@example.com", "wrong-pass1")
        .await
        .unwrap_err();
    assert_eq!(auth_err(err), AuthError::InvalidCredential);

    let err = engine.sign_in("leo", PASSWORD).await.unwrap_err();
    assert_eq!(auth_err(err), AuthError::InvalidEmail);
}

#[tokio::test]
async fn repeated_failures_lock_the_account_until_reset() {
    let policy = AuthPolicy {
        max_failed_attempts: 3,
        ..AuthPolicy::default()
    };
    let (engine, _db) = engine_with(Limits::default(), policy).await;
    engine
        .sign_up("mia@example.com", PASSWORD, "Mia")
        .await
        .unwrap();

    for _ in 0..3 {
        let err = engine
            .sign_in("mia@example.com", "wrong-pass1")
            .await
            .unwrap_err();
        assert_eq!(auth_err(err), AuthError::InvalidCredential);
    }
    // Even the right password is refused while locked.
    let err = engine
        .sign_in("mia@example.com", PASSWORD)
        .await
        .unwrap_err();
    assert_eq!(auth_err(err), AuthError::TooManyRequests);

    let ticket = engine
        .request_password_reset("mia@example.com")
        .await
        .unwrap();
    engine
        .confirm_password_reset(&ticket.token, "fresh-pass9")
        .await
        .unwrap();
    engine
        .sign_in("mia@example.com", "fresh-pass9")
        .await
        .unwrap();
}

#[tokio::test]
async fn success_resets_the_failure_counter() {
    let policy = AuthPolicy {
        max_failed_attempts: 2,
        ..AuthPolicy::default()
    };
    let (engine, _db) = engine_with(Limits::default(), policy).await;
    engine
        .sign_up("nia@example.com", PASSWORD, "Nia")
        .await
        .unwrap();

    for _ in 0..3 {
        engine
            .sign_in("nia@example.com", "wrong-pass1")
            .await
            .unwrap_err();
        engine.sign_in("nia@example.com", PASSWORD).await.unwrap();
    }
}

#[tokio::test]
async fn password_reset_revokes_sessions() {
    let (engine, _db) = engine_with_db().await;
    let session = engine
        .sign_up("omar@example.com", PASSWORD, "Omar")
        .await
        .unwrap();

    let err = engine
        .request_password_reset("ghost@example.com")
        .await
        .unwrap_err();
    assert_eq!(auth_err(err), AuthError::UserNotFound);

    let ticket = engine
        .request_password_reset("omar@example.com")
        .await
        .unwrap();
    assert_eq!(ticket.user_id, session.user.id);

    let err = engine
        .confirm_password_reset(&ticket.token, "weak")
        .await
        .unwrap_err();
    assert_eq!(auth_err(err), AuthError::WeakPassword);
    let err = engine
        .confirm_password_reset("bogus-token", "fresh-pass9")
        .await
        .unwrap_err();
    assert_eq!(auth_err(err), AuthError::InvalidCredential);

    engine
        .confirm_password_reset(&ticket.token, "fresh-pass9")
        .await
        .unwrap();
    let err = engine.session_user(&session.token).await.unwrap_err();
    assert_eq!(auth_err(err), AuthError::SessionExpired);

    // Tokens are single use.
    let err = engine
        .confirm_password_reset(&ticket.token, "other-pass9")
        .await
        .unwrap_err();
    assert_eq!(auth_err(err), AuthError::InvalidCredential);

    let err = engine.sign_in("omar@example.com", PASSWORD).await.unwrap_err();
    assert_eq!(auth_err(err), AuthError::InvalidCredential);
    engine
        .sign_in("omar@example.com", "fresh-pass9")
        .await
        .unwrap();
}

#[tokio::test]
async fn sign_out_ends_the_session() {
    let (engine, _db) = engine_with_db().await;
    let session = engine
        .sign_up("pia@example.com", PASSWORD, "Pia")
        .await
        .unwrap();

    engine.sign_out(&session.token).await.unwrap();
    let err = engine.session_user(&session.token).await.unwrap_err();
    assert_eq!(auth_err(err), AuthError::SessionExpired);

    // Signing out twice is harmless.
    engine.sign_out(&session.token).await.unwrap();
}

#[tokio::test]
async fn session_events_are_broadcast() {
    let (engine, _db) = engine_with_db().await;
    let mut events = engine.subscribe_sessions();

    let session = engine
        .sign_up("quinn@example.com", PASSWORD, "Quinn")
        .await
        .unwrap();
    engine.sign_out(&session.token).await.unwrap();

    let user_id = session.user.id;
    assert_eq!(
        events.recv().await.unwrap(),
        SessionEvent::SignedIn { user_id }
    );
    assert_eq!(
        events.recv().await.unwrap(),
        SessionEvent::SignedOut { user_id }
    );
}

#[tokio::test]
async fn oauth_popup_outcomes() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .sign_in_with_oauth(OAuthOutcome::Cancelled)
        .await
        .unwrap_err();
    assert_eq!(auth_err(err), AuthError::PopupClosed);
    let err = engine
        .sign_in_with_oauth(OAuthOutcome::Blocked)
        .await
        .unwrap_err();
    assert_eq!(auth_err(err), AuthError::PopupBlocked);

    let first = engine
        .sign_in_with_oauth(google("g-1", "rae@example.com"))
        .await
        .unwrap();
    assert_eq!(first.user.provider, "google");
    assert_eq!(first.user.display_name, "Anonymous");

    // Same subject, even with a changed email, is the same account.
    let again = engine
        .sign_in_with_oauth(google("g-1", "rae.new@example.com"))
        .await
        .unwrap();
    assert_eq!(again.user.id, first.user.id);

    let err = engine
        .sign_in("rae@example.com", PASSWORD)
        .await
        .unwrap_err();
    assert_eq!(auth_err(err), AuthError::AccountExistsWithDifferentCredential);
}

#[tokio::test]
async fn oauth_does_not_take_over_password_accounts() {
    let (engine, _db) = engine_with_db().await;
    engine
        .sign_up("sam@example.com", PASSWORD, "Sam")
        .await
        .unwrap();

    let err = engine
        .sign_in_with_oauth(google("g-sam", "sam@example.com"))
        .await
        .unwrap_err();
    assert_eq!(auth_err(err), AuthError::AccountExistsWithDifferentCredential);
}

#[tokio::test]
async fn change_password_checks_the_current_one() {
    let (engine, _db) = engine_with_db().await;
    let session = engine
        .sign_up("tess@example.com", PASSWORD, "Tess")
        .await
        .unwrap();
    let id = session.user.id;

    let err = engine
        .change_password(id, "wrong-pass1", "newer-pass2")
        .await
        .unwrap_err();
    assert_eq!(auth_err(err), AuthError::InvalidCredential);

    engine
        .change_password(id, PASSWORD, "newer-pass2")
        .await
        .unwrap();
    engine
        .sign_in("tess@example.com", "newer-pass2")
        .await
        .unwrap();
}

#[tokio::test]
async fn expired_sessions_are_refused() {
    let (engine, db) = engine_with_db().await;
    let session = engine
        .sign_up("quinn@example.com", PASSWORD, "Quinn")
        .await
        .unwrap();
    engine.session_user(&session.token).await.unwrap();

    backdate(&db, "UPDATE sessions SET expires_at = ?").await;
    let err = engine.session_user(&session.token).await.unwrap_err();
    assert_eq!(auth_err(err), AuthError::SessionExpired);
    // The stale row is gone, so the next lookup fails the same way.
    let err = engine.session_user(&session.token).await.unwrap_err();
    assert_eq!(auth_err(err), AuthError::SessionExpired);
}

#[tokio::test]
async fn expired_reset_tokens_are_refused() {
    let (engine, db) = engine_with_db().await;
    engine
        .sign_up("rae@example.com", PASSWORD, "Rae")
        .await
        .unwrap();
    let ticket = engine
        .request_password_reset("rae@example.com")
        .await
        .unwrap();

    backdate(&db, "UPDATE password_resets SET expires_at = ?").await;
    let err = engine
        .confirm_password_reset(&ticket.token, "fresh-pass9")
        .await
        .unwrap_err();
    assert_eq!(auth_err(err), AuthError::InvalidCredential);
    engine.sign_in("rae@example.com", PASSWORD).await.unwrap();
}

#[tokio::test]
async fn lockout_ends_when_it_expires() {
    let policy = AuthPolicy {
        max_failed_attempts: 2,
        ..AuthPolicy::default()
    };
    let (engine, db) = engine_with(Limits::default(), policy).await;
    engine
        .sign_up("sol@example.com", PASSWORD, "Sol")
        .await
        .unwrap();
    for _ in 0..2 {
        engine
            .sign_in("sol@example.com", "wrong-pass1")
            .await
            .unwrap_err();
    }
    let err = engine.sign_in("sol@example.com", PASSWORD).await.unwrap_err();
    assert_eq!(auth_err(err), AuthError::TooManyRequests);

    backdate(
        &db,
        "UPDATE users SET locked_until = ? WHERE locked_until IS NOT NULL",
    )
    .await;
    engine.sign_in("sol@example.com", PASSWORD).await.unwrap();
}
