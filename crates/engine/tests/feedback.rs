mod common;

use uuid::Uuid;

use engine::{
    EngineError, FeedbackCategory, FeedbackFilter, FeedbackStatus, FeedbackStatusFilter,
    NewFeedback,
};

use common::{admin, engine_with_db, user};

fn idea(title: &str) -> NewFeedback {
    NewFeedback::new(title, "It would help a lot.", FeedbackCategory::Feature)
}

#[tokio::test]
async fn vote_toggles_membership() {
    let (engine, _db) = engine_with_db().await;
    let author = user(&engine, "Author").await;
    let voter = user(&engine, "Voter").await;
    let item = engine
        .create_feedback(author.id, idea("Dark mode"))
        .await
        .unwrap();
    assert_eq!(item.votes, 0);
    assert!(item.voters.is_empty());
    assert_eq!(item.user_display_name, "Author");

    let first = engine.vote_feedback(voter.id, item.id).await.unwrap();
    assert!(first.voted);
    assert_eq!(first.votes, 1);
    let stored = engine.feedback(item.id).await.unwrap();
    assert_eq!(stored.voters, [voter.id]);
    assert!(stored.has_voted(voter.id));

    let second = engine.vote_feedback(voter.id, item.id).await.unwrap();
    assert!(!second.voted);
    assert_eq!(second.votes, 0);
    let stored = engine.feedback(item.id).await.unwrap();
    assert!(stored.voters.is_empty());
    assert_eq!(stored.votes, 0);
}

#[tokio::test]
async fn votes_match_voters_after_any_sequence() {
    let (engine, _db) = engine_with_db().await;
    let author = user(&engine, "Author").await;
    let mut voters = Vec::new();
    for name in ["A", "B", "C"] {
        voters.push(user(&engine, name).await);
    }
    let item = engine
        .create_feedback(author.id, idea("Export"))
        .await
        .unwrap();

    let sequence = [0, 1, 0, 2, 1, 1, 2, 0, 0];
    for index in sequence {
        engine
            .vote_feedback(voters[index].id, item.id)
            .await
            .unwrap();
        let stored = engine.feedback(item.id).await.unwrap();
        assert_eq!(stored.votes, stored.voters.len() as i64);
    }
    let stored = engine.feedback(item.id).await.unwrap();
    // A toggled 4 times, B 3 times, C twice.
    assert_eq!(stored.voters, [voters[1].id]);
}

#[tokio::test]
async fn feedback_limit_allows_exactly_the_maximum() {
    let (engine, _db) = engine_with_db().await;
    let author = user(&engine, "Author").await;
    let max = engine.limits().max_feedback_per_user;

    for n in 0..max {
        engine
            .create_feedback(author.id, idea(&format!("Idea {n}")))
            .await
            .unwrap();
    }
    let err = engine
        .create_feedback(author.id, idea("One too many"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::LimitReached(_)));
}

#[tokio::test]
async fn feedback_validation() {
    let (engine, _db) = engine_with_db().await;
    let author = user(&engine, "Author").await;

    let cases = [
        NewFeedback::new("", "body", FeedbackCategory::Bug),
        NewFeedback::new("Title", "  ", FeedbackCategory::Bug),
        NewFeedback::new("Two\nlines", "body", FeedbackCategory::Bug),
        NewFeedback::new("Title", "x".repeat(2001), FeedbackCategory::Bug),
    ];
    for cmd in cases {
        let err = engine.create_feedback(author.id, cmd).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    let multi_line = engine
        .create_feedback(
            author.id,
            NewFeedback::new("Crash", "Steps:\n1. open\n2. tap", FeedbackCategory::Bug),
        )
        .await
        .unwrap();
    assert!(multi_line.description.contains('\n'));
}

#[tokio::test]
async fn list_orders_by_votes_then_newest() {
    let (engine, _db) = engine_with_db().await;
    let author = user(&engine, "Author").await;
    let fan = user(&engine, "Fan").await;

    let older = engine.create_feedback(author.id, idea("Older")).await.unwrap();
    let newer = engine.create_feedback(author.id, idea("Newer")).await.unwrap();
    let popular = engine
        .create_feedback(
            author.id,
            NewFeedback::new("Popular", "fix it", FeedbackCategory::Bug),
        )
        .await
        .unwrap();
    engine.vote_feedback(fan.id, popular.id).await.unwrap();

    let all = engine
        .list_feedback(FeedbackFilter::default())
        .await
        .unwrap();
    let ids: Vec<_> = all.iter().map(|f| f.id).collect();
    assert_eq!(ids, [popular.id, newer.id, older.id]);
    assert_eq!(all[0].voters, [fan.id]);

    let bugs = engine
        .list_feedback(FeedbackFilter {
            category: Some(FeedbackCategory::Bug),
            status: None,
        })
        .await
        .unwrap();
    assert_eq!(bugs.len(), 1);
    assert_eq!(bugs[0].id, popular.id);
}

#[tokio::test]
async fn status_transitions_are_admin_only() {
    let (engine, _db) = engine_with_db().await;
    let author = user(&engine, "Author").await;
    let admin = admin(&engine).await;
    let item = engine.create_feedback(author.id, idea("Sync")).await.unwrap();

    let err = engine
        .set_feedback_status(author.id, item.id, Some(FeedbackStatus::Scheduled))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let scheduled = engine
        .set_feedback_status(admin.id, item.id, Some(FeedbackStatus::Scheduled))
        .await
        .unwrap();
    assert_eq!(scheduled.status, Some(FeedbackStatus::Scheduled));
    assert!(scheduled.completed_at.is_none());

    let completed = engine
        .set_feedback_status(admin.id, item.id, Some(FeedbackStatus::Completed))
        .await
        .unwrap();
    assert!(completed.completed_at.is_some());
    assert_eq!(completed.completed_by, Some(admin.id));

    let open = engine
        .list_feedback(FeedbackFilter {
            category: None,
            status: Some(FeedbackStatusFilter::Open),
        })
        .await
        .unwrap();
    assert!(open.is_empty());

    let reopened = engine
        .set_feedback_status(admin.id, item.id, None)
        .await
        .unwrap();
    assert_eq!(reopened.status, None);
    assert!(reopened.completed_at.is_none());
    assert!(reopened.completed_by.is_none());
}

#[tokio::test]
async fn only_author_or_admin_can_delete() {
    let (engine, _db) = engine_with_db().await;
    let author = user(&engine, "Author").await;
    let other = user(&engine, "Other").await;
    let admin = admin(&engine).await;
    let first = engine.create_feedback(author.id, idea("One")).await.unwrap();
    let second = engine.create_feedback(author.id, idea("Two")).await.unwrap();
    engine.vote_feedback(other.id, first.id).await.unwrap();

    assert!(matches!(
        engine.delete_feedback(other.id, first.id).await,
        Err(EngineError::Forbidden(_))
    ));
    engine.delete_feedback(author.id, first.id).await.unwrap();
    engine.delete_feedback(admin.id, second.id).await.unwrap();
    assert!(matches!(
        engine.feedback(first.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine.vote_feedback(other.id, Uuid::new_v4()).await,
        Err(EngineError::KeyNotFound(_))
    ));
}
