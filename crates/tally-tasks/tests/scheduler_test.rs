use chrono::NaiveDate;
use std::sync::Arc;
use tally_store::{ChoreStore, MemoryStore};
use tally_tasks::{Recurrence, Scheduler, TaskCatalog, TaskSpec};
use tally_types::{Actor, NewUser, Role, TallyError, TaskFrequency, TaskId, TaskType, UserId};

struct Fixture {
    store: Arc<MemoryStore>,
    scheduler: Scheduler,
    admin: Actor,
    task: TaskId,
    users: Vec<UserId>,
}

async fn setup(user_count: usize) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let admin = store
        .insert_user(NewUser::new("admin", Role::Admin))
        .await
        .unwrap();
    let admin = Actor::admin(admin.id);

    let mut users = Vec::new();
    for i in 0..user_count {
        let user = store
            .insert_user(NewUser::new(format!("kid-{}", i), Role::Member))
            .await
            .unwrap();
        users.push(user.id);
    }

    let catalog = TaskCatalog::new(store.clone());
    let task = catalog
        .create(
            &admin,
            TaskSpec {
                title: "water the plants".to_string(),
                description: String::new(),
                task_type: TaskType::Bonus,
                frequency: TaskFrequency::Daily,
                base_value: 10,
            },
        )
        .await
        .unwrap();

    Fixture {
        scheduler: Scheduler::new(store.clone()),
        store,
        admin,
        task: task.id,
        users,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_daily_single_monday_in_week() {
    let f = setup(2).await;
    // 2025-01-06 is the only Monday in Jan 1..=7.
    let created = f
        .scheduler
        .expand(
            &f.admin,
            f.task,
            &f.users,
            date(2025, 1, 1),
            date(2025, 1, 7),
            &Recurrence::Daily {
                weekdays: vec![0],
                times_per_day: 1,
            },
        )
        .await
        .unwrap();

    assert_eq!(created.len(), 2); // one per user
    for (user, day) in &created {
        assert!(f.users.contains(user));
        assert_eq!(*day, date(2025, 1, 6));
    }
}

#[tokio::test]
async fn test_daily_times_per_day_allows_duplicates() {
    let f = setup(1).await;
    let created = f
        .scheduler
        .expand(
            &f.admin,
            f.task,
            &f.users,
            date(2025, 1, 6),
            date(2025, 1, 6),
            &Recurrence::Daily {
                weekdays: vec![0],
                times_per_day: 3,
            },
        )
        .await
        .unwrap();

    assert_eq!(created.len(), 3);
    let rows = f
        .store
        .assignments_for_user_in_range(f.users[0], date(2025, 1, 6), date(2025, 1, 6))
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
}

#[tokio::test]
async fn test_daily_default_covers_every_day() {
    let f = setup(1).await;
    let created = f
        .scheduler
        .expand(
            &f.admin,
            f.task,
            &f.users,
            date(2025, 1, 1),
            date(2025, 1, 7),
            &Recurrence::daily(),
        )
        .await
        .unwrap();
    assert_eq!(created.len(), 7);
}

#[tokio::test]
async fn test_weekly_week_of_month_filter() {
    let f = setup(1).await;
    // Mondays in Jan 2025: 6th (week 1), 13th (week 2), 20th (week 3),
    // 27th (week 4).
    let created = f
        .scheduler
        .expand(
            &f.admin,
            f.task,
            &f.users,
            date(2025, 1, 1),
            date(2025, 1, 31),
            &Recurrence::Weekly {
                weekday: 0,
                weeks: vec![2, 4],
            },
        )
        .await
        .unwrap();

    let dates: Vec<_> = created.iter().map(|(_, d)| *d).collect();
    assert_eq!(dates, vec![date(2025, 1, 13), date(2025, 1, 27)]);
}

#[tokio::test]
async fn test_weekly_skips_existing_rows() {
    let f = setup(1).await;
    let rule = Recurrence::Weekly {
        weekday: 0,
        weeks: vec![1, 2, 3, 4],
    };

    let first = f
        .scheduler
        .expand(&f.admin, f.task, &f.users, date(2025, 1, 1), date(2025, 1, 31), &rule)
        .await
        .unwrap();
    assert_eq!(first.len(), 4);

    // Re-running the same expansion creates nothing new.
    let second = f
        .scheduler
        .expand(&f.admin, f.task, &f.users, date(2025, 1, 1), date(2025, 1, 31), &rule)
        .await
        .unwrap();
    assert!(second.is_empty());
}

#[tokio::test]
async fn test_monthly_month_and_day_filter() {
    let f = setup(1).await;
    let created = f
        .scheduler
        .expand(
            &f.admin,
            f.task,
            &f.users,
            date(2025, 1, 1),
            date(2025, 6, 30),
            &Recurrence::Monthly {
                months: vec![1, 3, 5],
                day_of_month: 15,
            },
        )
        .await
        .unwrap();

    let dates: Vec<_> = created.iter().map(|(_, d)| *d).collect();
    assert_eq!(
        dates,
        vec![date(2025, 1, 15), date(2025, 3, 15), date(2025, 5, 15)]
    );
}

#[tokio::test]
async fn test_invalid_range_rejected() {
    let f = setup(1).await;
    assert!(matches!(
        f.scheduler
            .expand(
                &f.admin,
                f.task,
                &f.users,
                date(2025, 2, 1),
                date(2025, 1, 1),
                &Recurrence::daily(),
            )
            .await,
        Err(TallyError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_invalid_rule_parameters_rejected() {
    let f = setup(1).await;
    let cases = [
        Recurrence::Daily {
            weekdays: vec![0, 7],
            times_per_day: 1,
        },
        Recurrence::Weekly {
            weekday: 9,
            weeks: vec![1],
        },
        Recurrence::Weekly {
            weekday: 0,
            weeks: vec![0],
        },
        Recurrence::Monthly {
            months: vec![13],
            day_of_month: 1,
        },
        Recurrence::Monthly {
            months: vec![1],
            day_of_month: 32,
        },
    ];
    for rule in cases {
        assert!(matches!(
            f.scheduler
                .expand(&f.admin, f.task, &f.users, date(2025, 1, 1), date(2025, 1, 31), &rule)
                .await,
            Err(TallyError::InvalidInput(_))
        ));
    }
}

#[tokio::test]
async fn test_unknown_user_rejected_up_front() {
    let f = setup(1).await;
    let mut users = f.users.clone();
    users.push(UserId::new(999));

    assert!(matches!(
        f.scheduler
            .expand(&f.admin, f.task, &users, date(2025, 1, 1), date(2025, 1, 7), &Recurrence::daily())
            .await,
        Err(TallyError::NotFound { .. })
    ));
    // Checked before expansion: no partial rows for the valid user.
    let rows = f
        .store
        .assignments_for_user_in_range(f.users[0], date(2025, 1, 1), date(2025, 1, 7))
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_member_cannot_bulk_assign() {
    let f = setup(1).await;
    let member = Actor::member(f.users[0]);
    assert!(matches!(
        f.scheduler
            .expand(&member, f.task, &f.users, date(2025, 1, 1), date(2025, 1, 7), &Recurrence::daily())
            .await,
        Err(TallyError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_rule_wire_format() {
    let rule: Recurrence = serde_json::from_str(r#"{"mode": "daily"}"#).unwrap();
    match rule {
        Recurrence::Daily {
            weekdays,
            times_per_day,
        } => {
            assert_eq!(weekdays, (0..7).collect::<Vec<_>>());
            assert_eq!(times_per_day, 1);
        }
        _ => panic!("expected daily rule"),
    }

    let rule: Recurrence =
        serde_json::from_str(r#"{"mode": "weekly", "weekday": 2}"#).unwrap();
    match rule {
        Recurrence::Weekly { weekday, weeks } => {
            assert_eq!(weekday, 2);
            assert_eq!(weeks, vec![1, 2, 3, 4]);
        }
        _ => panic!("expected weekly rule"),
    }
}
