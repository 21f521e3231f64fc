//! Walks one week of a two-kid household through the full chore economy:
//! bulk assignment, completion, validation, a cancelled mandatory task,
//! and a reward redemption.
//!
//! Run with: cargo run --example household_demo

use anyhow::Result;
use chrono::NaiveDate;
use tally_engine::{ChoreEngine, EngineConfig};
use tally_store::ChoreStore;
use tally_tasks::{Recurrence, TaskSpec};
use tally_economics::RewardSpec;
use tally_types::{Actor, NewUser, Role, TaskFrequency, TaskType};

#[tokio::main]
async fn main() -> Result<()> {
    let config = EngineConfig::load(None)?;
    tally_engine::logging::init_logging(&config.logging)?;

    let engine = ChoreEngine::in_memory();

    // Seed the household.
    let parent = engine
        .store
        .insert_user(NewUser::new("parent", Role::Admin))
        .await?;
    let ana = engine
        .store
        .insert_user(NewUser::new("ana", Role::Member))
        .await?;
    let ben = engine
        .store
        .insert_user(NewUser::new("ben", Role::Member))
        .await?;
    let admin = Actor::admin(parent.id);

    // A mandatory daily chore and a bonus weekend task.
    let dishes = engine
        .tasks
        .create(
            &admin,
            TaskSpec {
                title: "do the dishes".to_string(),
                description: "after dinner".to_string(),
                task_type: TaskType::Mandatory,
                frequency: TaskFrequency::Daily,
                base_value: 40,
            },
        )
        .await?;
    let garden = engine
        .tasks
        .create(
            &admin,
            TaskSpec {
                title: "weed the garden".to_string(),
                description: String::new(),
                task_type: TaskType::Bonus,
                frequency: TaskFrequency::Weekly,
                base_value: 100,
            },
        )
        .await?;

    // Schedule the dishes for the whole week.
    let week_start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
    let week_end = NaiveDate::from_ymd_opt(2025, 1, 12).unwrap();
    let created = engine
        .scheduler
        .expand(
            &admin,
            dishes.id,
            &[ana.id, ben.id],
            week_start,
            week_end,
            &Recurrence::daily(),
        )
        .await?;
    println!("scheduled {} dish assignments", created.len());

    // Ana does Monday's dishes and the garden; Ben skips his dishes.
    let ana_actor = Actor::member(ana.id);
    let ben_actor = Actor::member(ben.id);

    let ana_monday = engine
        .store
        .find_assignment(dishes.id, ana.id, week_start)
        .await?
        .expect("scheduled above");
    let completion = engine
        .assignments
        .complete(&ana_actor, ana_monday.id, Some("all sparkling".to_string()))
        .await?;
    engine
        .assignments
        .validate(&admin, completion.id, 3, None)
        .await?;

    let garden_assignment = engine
        .assignments
        .assign(&admin, garden.id, ana.id, week_start)
        .await?;
    let garden_done = engine
        .assignments
        .complete(&ana_actor, garden_assignment.id, None)
        .await?;
    engine
        .assignments
        .validate(&admin, garden_done.id, 2, Some("missed a corner".to_string()))
        .await?;

    let ben_monday = engine
        .store
        .find_assignment(dishes.id, ben.id, week_start)
        .await?
        .expect("scheduled above");
    let (_, penalty) = engine.assignments.cancel(&ben_actor, ben_monday.id).await?;
    println!("ben skipped the dishes, penalty {}", penalty);

    // Ana cashes in.
    let cinema = engine
        .rewards
        .create_reward(
            &admin,
            RewardSpec {
                name: "cinema night".to_string(),
                description: String::new(),
                credit_cost: 50,
                stock: Some(4),
            },
        )
        .await?;
    let redemption = engine.rewards.redeem(&ana_actor, cinema.id, None).await?;
    engine.rewards.approve(&admin, redemption.id).await?;

    for user in [&ana, &ben] {
        println!(
            "{}: balance {}",
            user.name,
            engine.ledger.balance(user.id).await?
        );
    }

    Ok(())
}
