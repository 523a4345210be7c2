use crate::models::{SchedulePolicy, TaskDefinition};

pub fn is_due_today(task: &TaskDefinition, weekday: u8) -> bool {
    match &task.schedule {
        None | Some(SchedulePolicy::Daily) => true,
        Some(SchedulePolicy::Weekly) => task.days.contains(&weekday),
        Some(SchedulePolicy::Other(_)) => true,
    }
}

pub fn due_tasks(tasks: Vec<TaskDefinition>, weekday: u8) -> Vec<TaskDefinition> {
    tasks
        .into_iter()
        .filter(|task| is_due_today(task, weekday))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskId;
    use rstest::rstest;
    use std::collections::BTreeSet;

    fn task(schedule: Option<SchedulePolicy>, days: &[u8]) -> TaskDefinition {
        TaskDefinition {
            id: TaskId::new("custom-bath"),
            icon: "🛁".into(),
            name: "Bath".into(),
            hint: String::new(),
            schedule,
            days: days.iter().copied().collect::<BTreeSet<_>>(),
            requires_approval: false,
            custom: true,
        }
    }

    #[rstest]
    #[case::wednesday(3, true)]
    #[case::tuesday(2, false)]
    #[case::monday(1, true)]
    #[case::friday(5, true)]
    #[case::sunday(0, false)]
    fn weekly_mon_wed_fri(#[case] weekday: u8, #[case] due: bool) {
        let bath = task(Some(SchedulePolicy::Weekly), &[1, 3, 5]);
        assert_eq!(is_due_today(&bath, weekday), due);
    }

    #[rstest]
    #[case(None)]
    #[case(Some(SchedulePolicy::Daily))]
    #[case(Some(SchedulePolicy::Other("fortnightly".into())))]
    fn non_weekly_policies_are_always_due(#[case] policy: Option<SchedulePolicy>) {
        let t = task(policy, &[]);
        assert!((0..7).all(|day| is_due_today(&t, day)));
    }

    #[test]
    fn weekly_without_days_never_comes_due() {
        let t = task(Some(SchedulePolicy::Weekly), &[]);
        assert!((0..7).all(|day| !is_due_today(&t, day)));
    }

    #[test]
    fn due_tasks_filters_by_weekday() {
        let tasks = vec![
            task(None, &[]),
            task(Some(SchedulePolicy::Weekly), &[6]),
        ];
        assert_eq!(due_tasks(tasks.clone(), 6).len(), 2);
        assert_eq!(due_tasks(tasks, 2).len(), 1);
    }
}
