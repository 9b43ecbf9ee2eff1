mod common;

use chrono::{Duration, Utc};
use sea_orm::{ConnectionTrait, Statement};
use uuid::Uuid;

use engine::{
    EngineError, GoalListQuery, GoalSort, GoalStatusFilter, GoalUpdate, Limits, NewGoal,
    NewSaving, SortOrder,
};

use common::{engine_with, engine_with_db, user};

#[tokio::test]
async fn goals_get_increasing_order_and_list_in_order() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "Alice").await;

    let first = engine
        .create_goal(alice.id, NewGoal::new("Trip", 100_000).deadline("2030-01-01"))
        .await
        .unwrap();
    let second = engine
        .create_goal(alice.id, NewGoal::new("Laptop", 200_000))
        .await
        .unwrap();

    assert_eq!(first.order, 0);
    assert_eq!(second.order, 1);
    assert!(!first.is_achieved());

    let goals = engine.goals(alice.id).await.unwrap();
    let titles: Vec<_> = goals.iter().map(|g| g.title.as_str()).collect();
    assert_eq!(titles, ["Trip", "Laptop"]);
}

#[tokio::test]
async fn create_goal_validates_input() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "Alice").await;

    let err = engine
        .create_goal(alice.id, NewGoal::new("   ", 1000))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let err = engine
        .create_goal(alice.id, NewGoal::new("Trip", 0))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let err = engine
        .create_goal(alice.id, NewGoal::new("Trip", 1000).deadline("next week"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let err = engine
        .create_goal(alice.id, NewGoal::new("x".repeat(101), 1000))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
}

#[tokio::test]
async fn initial_amount_meeting_target_is_achieved() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "Alice").await;

    let goal = engine
        .create_goal(alice.id, NewGoal::new("Done", 500).current_amount(500))
        .await
        .unwrap();
    assert!(goal.achieved_at.is_some());
}

#[tokio::test]
async fn goal_limit_is_enforced() {
    let limits = Limits {
        max_goals_per_user: 2,
        ..Limits::default()
    };
    let (engine, _db) = engine_with(limits, Default::default()).await;
    let alice = user(&engine, "Alice").await;

    for title in ["One", "Two"] {
        engine
            .create_goal(alice.id, NewGoal::new(title, 1000))
            .await
            .unwrap();
    }
    let err = engine
        .create_goal(alice.id, NewGoal::new("Three", 1000))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::LimitReached(_)));
}

#[tokio::test]
async fn update_moves_achievement_both_ways() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "Alice").await;
    let goal = engine
        .create_goal(alice.id, NewGoal::new("Trip", 1000).current_amount(900))
        .await
        .unwrap();

    let lowered = engine
        .update_goal(
            alice.id,
            goal.id,
            GoalUpdate {
                target_amount: Some(800),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(lowered.achieved_at.is_some());
    let achieved_at = lowered.achieved_at;

    let renamed = engine
        .update_goal(
            alice.id,
            goal.id,
            GoalUpdate {
                title: Some("Big trip".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.title, "Big trip");
    assert_eq!(renamed.achieved_at, achieved_at);

    let raised = engine
        .update_goal(
            alice.id,
            goal.id,
            GoalUpdate {
                target_amount: Some(2000),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(raised.achieved_at.is_none());
}

#[tokio::test]
async fn other_users_goals_are_not_found() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "Alice").await;
    let bob = user(&engine, "Bob").await;
    let goal = engine
        .create_goal(alice.id, NewGoal::new("Trip", 1000))
        .await
        .unwrap();

    assert!(matches!(
        engine.goal(bob.id, goal.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine.delete_goal(bob.id, goal.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine.goal(alice.id, Uuid::new_v4()).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn reorder_assigns_contiguous_positions() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "Alice").await;
    let mut ids = Vec::new();
    for title in ["A", "B", "C", "D"] {
        let goal = engine
            .create_goal(alice.id, NewGoal::new(title, 1000))
            .await
            .unwrap();
        ids.push(goal.id);
    }
    engine.delete_goal(alice.id, ids.remove(1)).await.unwrap();

    // Remaining orders are 0, 2, 3; the new order closes the gap.
    let wanted = vec![ids[2], ids[0], ids[1]];
    let reordered = engine.reorder_goals(alice.id, &wanted).await.unwrap();
    let orders: Vec<_> = reordered.iter().map(|g| g.order).collect();
    assert_eq!(orders, [0, 1, 2]);

    let listed: Vec<_> = engine
        .goals(alice.id)
        .await
        .unwrap()
        .iter()
        .map(|g| g.id)
        .collect();
    assert_eq!(listed, wanted);
}

#[tokio::test]
async fn reorder_rejects_partial_or_foreign_sequences() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "Alice").await;
    let a = engine
        .create_goal(alice.id, NewGoal::new("A", 1000))
        .await
        .unwrap();
    let b = engine
        .create_goal(alice.id, NewGoal::new("B", 1000))
        .await
        .unwrap();

    for bad in [vec![a.id], vec![a.id, a.id], vec![a.id, Uuid::new_v4()]] {
        let err = engine.reorder_goals(alice.id, &bad).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }
    let unchanged: Vec<_> = engine
        .goals(alice.id)
        .await
        .unwrap()
        .iter()
        .map(|g| g.id)
        .collect();
    assert_eq!(unchanged, [a.id, b.id]);
}

#[tokio::test]
async fn delete_goal_cascades_savings() {
    let (engine, db) = engine_with_db().await;
    let alice = user(&engine, "Alice").await;
    let goal = engine
        .create_goal(alice.id, NewGoal::new("Trip", 10_000))
        .await
        .unwrap();
    let other = engine
        .create_goal(alice.id, NewGoal::new("Other", 10_000))
        .await
        .unwrap();
    for amount in [100, 200, 300] {
        engine
            .create_saving(alice.id, NewSaving::new(goal.id, "Coffee", amount))
            .await
            .unwrap();
    }
    let kept = engine
        .create_saving(alice.id, NewSaving::new(other.id, "Lunch", 800))
        .await
        .unwrap();

    engine.delete_goal(alice.id, goal.id).await.unwrap();

    let row = db
        .query_one(Statement::from_sql_and_values(
            db.get_database_backend(),
            "SELECT COUNT(*) AS n FROM savings WHERE goal_id = ?",
            vec![goal.id.to_string().into()],
        ))
        .await
        .unwrap()
        .unwrap();
    let remaining: i64 = row.try_get("", "n").unwrap();
    assert_eq!(remaining, 0);
    assert_eq!(
        engine.saving(alice.id, kept.entry.id).await.unwrap().amount,
        800
    );
}

#[tokio::test]
async fn list_view_filters_and_sorts() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "Alice").await;
    let now = Utc::now();
    let soon = (now + Duration::days(3)).format("%Y-%m-%d").to_string();
    let later = (now + Duration::days(30)).format("%Y-%m-%d").to_string();

    engine
        .create_goal(
            alice.id,
            NewGoal::new("Later", 1000).current_amount(100).deadline(later),
        )
        .await
        .unwrap();
    engine
        .create_goal(
            alice.id,
            NewGoal::new("Soon", 5000).current_amount(2500).deadline(soon),
        )
        .await
        .unwrap();
    engine
        .create_goal(alice.id, NewGoal::new("Done", 300).current_amount(300))
        .await
        .unwrap();

    let by_deadline = engine
        .list_goal_views(
            alice.id,
            GoalListQuery {
                status: GoalStatusFilter::Incomplete,
                sort: Some(GoalSort::Deadline),
                order: SortOrder::Asc,
            },
            now,
        )
        .await
        .unwrap();
    let titles: Vec<_> = by_deadline.iter().map(|v| v.goal.title.as_str()).collect();
    assert_eq!(titles, ["Soon", "Later"]);
    assert_eq!(by_deadline[0].progress_percent, 50.0);

    let by_progress = engine
        .list_goal_views(
            alice.id,
            GoalListQuery {
                status: GoalStatusFilter::All,
                sort: Some(GoalSort::Progress),
                order: SortOrder::Desc,
            },
            now,
        )
        .await
        .unwrap();
    let titles: Vec<_> = by_progress.iter().map(|v| v.goal.title.as_str()).collect();
    assert_eq!(titles, ["Done", "Soon", "Later"]);

    let completed = engine
        .list_goal_views(
            alice.id,
            GoalListQuery {
                status: GoalStatusFilter::Completed,
                ..Default::default()
            },
            now,
        )
        .await
        .unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].progress_percent, 100.0);
}
