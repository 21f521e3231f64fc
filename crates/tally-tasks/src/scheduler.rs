use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tally_store::ChoreStore;
use tally_types::{Actor, NewAssignment, Result, TallyError, TaskId, UserId};
use tracing::info;

fn all_weekdays() -> Vec<u8> {
    (0..7).collect()
}

fn one() -> u32 {
    1
}

fn all_weeks() -> Vec<u8> {
    vec![1, 2, 3, 4]
}

fn all_months() -> Vec<u8> {
    (1..=12).collect()
}

/// Recurrence rule for bulk assignment. Weekday indices are 0 = Monday
/// through 6 = Sunday; weeks-of-month are 1-based.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Recurrence {
    /// Every day whose weekday is in the set, `times_per_day` rows per
    /// user per day. Duplicate rows for one day are intentional here.
    Daily {
        #[serde(default = "all_weekdays")]
        weekdays: Vec<u8>,
        #[serde(default = "one")]
        times_per_day: u32,
    },
    /// The given weekday, in the given weeks of each month.
    Weekly {
        weekday: u8,
        #[serde(default = "all_weeks")]
        weeks: Vec<u8>,
    },
    /// A fixed day of the month, in the given months.
    Monthly {
        #[serde(default = "all_months")]
        months: Vec<u8>,
        day_of_month: u8,
    },
}

impl Recurrence {
    pub fn daily() -> Self {
        Recurrence::Daily {
            weekdays: all_weekdays(),
            times_per_day: 1,
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Recurrence::Daily { weekdays, .. } => {
                if let Some(bad) = weekdays.iter().find(|w| **w > 6) {
                    return Err(TallyError::invalid(format!(
                        "weekday index out of range: {}",
                        bad
                    )));
                }
            }
            Recurrence::Weekly { weekday, weeks } => {
                if *weekday > 6 {
                    return Err(TallyError::invalid(format!(
                        "weekday index out of range: {}",
                        weekday
                    )));
                }
                if let Some(bad) = weeks.iter().find(|w| **w == 0 || **w > 5) {
                    return Err(TallyError::invalid(format!(
                        "week of month out of range: {}",
                        bad
                    )));
                }
            }
            Recurrence::Monthly {
                months,
                day_of_month,
            } => {
                if let Some(bad) = months.iter().find(|m| **m == 0 || **m > 12) {
                    return Err(TallyError::invalid(format!(
                        "month out of range: {}",
                        bad
                    )));
                }
                if *day_of_month == 0 || *day_of_month > 31 {
                    return Err(TallyError::invalid(format!(
                        "day of month out of range: {}",
                        day_of_month
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Expands a recurrence rule over a date range into concrete assignment
/// rows, one per (user, date) occurrence.
pub struct Scheduler {
    store: Arc<dyn ChoreStore>,
}

impl Scheduler {
    pub fn new(store: Arc<dyn ChoreStore>) -> Self {
        Self { store }
    }

    /// Walks every day in `[start, end]` and creates the matching rows for
    /// each target user. Weekly and monthly modes skip dates that already
    /// have an assignment for (task, user, date); daily mode allows
    /// duplicates. Rows are created independently: a failure aborts the
    /// expansion but leaves earlier rows in place.
    pub async fn expand(
        &self,
        actor: &Actor,
        task_id: TaskId,
        user_ids: &[UserId],
        start: NaiveDate,
        end: NaiveDate,
        recurrence: &Recurrence,
    ) -> Result<Vec<(UserId, NaiveDate)>> {
        actor.ensure_admin()?;
        if start > end {
            return Err(TallyError::invalid("start date is after end date"));
        }
        recurrence.validate()?;

        self.store
            .get_task(task_id)
            .await?
            .ok_or_else(|| TallyError::not_found("task", task_id))?;
        for user in user_ids {
            self.store
                .get_user(*user)
                .await?
                .ok_or_else(|| TallyError::not_found("user", *user))?;
        }

        let mut created = Vec::new();
        let mut day = start;
        loop {
            match recurrence {
                Recurrence::Daily {
                    weekdays,
                    times_per_day,
                } => {
                    let weekday = day.weekday().num_days_from_monday() as u8;
                    if weekdays.contains(&weekday) {
                        for user in user_ids {
                            for _ in 0..*times_per_day {
                                self.create_row(task_id, *user, day, actor).await?;
                                created.push((*user, day));
                            }
                        }
                    }
                }
                Recurrence::Weekly { weekday, weeks } => {
                    let week_of_month = ((day.day() - 1) / 7 + 1) as u8;
                    if day.weekday().num_days_from_monday() as u8 == *weekday
                        && weeks.contains(&week_of_month)
                    {
                        for user in user_ids {
                            if self.create_row_deduped(task_id, *user, day, actor).await? {
                                created.push((*user, day));
                            }
                        }
                    }
                }
                Recurrence::Monthly {
                    months,
                    day_of_month,
                } => {
                    if months.contains(&(day.month() as u8)) && day.day() == *day_of_month as u32 {
                        for user in user_ids {
                            if self.create_row_deduped(task_id, *user, day, actor).await? {
                                created.push((*user, day));
                            }
                        }
                    }
                }
            }

            if day >= end {
                break;
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }

        info!(
            task = %task_id,
            users = user_ids.len(),
            rows = created.len(),
            "📅 Bulk assignments created"
        );
        Ok(created)
    }

    async fn create_row(
        &self,
        task_id: TaskId,
        user_id: UserId,
        date: NaiveDate,
        actor: &Actor,
    ) -> Result<()> {
        self.store
            .insert_assignment(NewAssignment {
                task_id,
                user_id,
                assigned_date: date,
                assigned_by: actor.user_id,
            })
            .await?;
        Ok(())
    }

    async fn create_row_deduped(
        &self,
        task_id: TaskId,
        user_id: UserId,
        date: NaiveDate,
        actor: &Actor,
    ) -> Result<bool> {
        if self
            .store
            .find_assignment(task_id, user_id, date)
            .await?
            .is_some()
        {
            return Ok(false);
        }
        self.create_row(task_id, user_id, date, actor).await?;
        Ok(true)
    }
}
