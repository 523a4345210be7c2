use crate::models::{CustomTask, Pet, SchedulePolicy, TaskDefinition, TaskId};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CatalogTask {
    pub id: &'static str,
    pub icon: &'static str,
    pub name: &'static str,
    pub hint: &'static str,
}

pub const BUILTIN_TASKS: &[CatalogTask] = &[
    CatalogTask { id: "feed-morning", icon: "🥣", name: "Morning Food", hint: "Start the day right!" },
    CatalogTask { id: "feed-evening", icon: "🥣", name: "Evening Food", hint: "Dinner time!" },
    CatalogTask { id: "water", icon: "💧", name: "Fresh Water", hint: "Keep it clean!" },
    CatalogTask { id: "walk", icon: "🚶", name: "Walk", hint: "Get some exercise!" },
    CatalogTask { id: "play", icon: "🎾", name: "Playtime", hint: "10 minutes of fun!" },
    CatalogTask { id: "brush", icon: "🪥", name: "Brush Fur", hint: "Keep them fluffy!" },
    CatalogTask { id: "clean", icon: "🧹", name: "Clean Cage/Litter", hint: "Nice and tidy!" },
    CatalogTask { id: "check", icon: "👀", name: "Health Check", hint: "Eyes, ears, nose" },
];

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PetType {
    pub id: &'static str,
    pub emoji: &'static str,
    pub color: &'static str,
    pub name: &'static str,
}

pub const PET_TYPES: &[PetType] = &[
    PetType { id: "dog", emoji: "🐶", color: "#FFE5A0", name: "Dog" },
    PetType { id: "cat", emoji: "🐱", color: "#F8B4C4", name: "Cat" },
    PetType { id: "hamster", emoji: "🐹", color: "#FFD4A0", name: "Hamster" },
    PetType { id: "bird", emoji: "🐦", color: "#B8D4F1", name: "Bird" },
    PetType { id: "fish", emoji: "🐟", color: "#95D5B2", name: "Fish" },
    PetType { id: "rabbit", emoji: "🐰", color: "#E8D4F1", name: "Rabbit" },
];

pub fn pet_type(id: &str) -> Option<&'static PetType> {
    let id = id.trim();
    PET_TYPES.iter().find(|kind| kind.id.eq_ignore_ascii_case(id))
}

pub const DEFAULT_PET_TASKS: &[&str] = &["feed-morning", "feed-evening", "water"];

pub fn lookup(id: &str) -> Option<&'static CatalogTask> {
    BUILTIN_TASKS.iter().find(|task| task.id == id)
}

pub fn default_tasks() -> Vec<TaskId> {
    DEFAULT_PET_TASKS.iter().map(|id| TaskId::new(*id)).collect()
}

impl CatalogTask {
    pub fn definition(&self) -> TaskDefinition {
        TaskDefinition {
            id: TaskId::new(self.id),
            icon: self.icon.to_owned(),
            name: self.name.to_owned(),
            hint: self.hint.to_owned(),
            schedule: Some(SchedulePolicy::Daily),
            days: BTreeSet::new(),
            requires_approval: false,
            custom: false,
        }
    }
}

impl CustomTask {
    pub fn definition(&self) -> Option<TaskDefinition> {
        Some(TaskDefinition {
            id: self.id.clone()?,
            icon: self.icon.clone(),
            name: self.name.clone(),
            hint: self.detail.clone(),
            schedule: self.schedule.clone(),
            days: self.days.clone(),
            requires_approval: self.requires_approval,
            custom: true,
        })
    }
}

pub fn pet_tasks(pet: &Pet) -> Vec<TaskDefinition> {
    pet.tasks
        .iter()
        .filter_map(|id| lookup(id.as_str()))
        .map(CatalogTask::definition)
        .chain(pet.custom_tasks.iter().filter_map(CustomTask::definition))
        .collect()
}

pub fn find_task(pet: &Pet, task_id: &TaskId) -> Option<TaskDefinition> {
    pet_tasks(pet).into_iter().find(|task| &task.id == task_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PetId;
    use chrono::Utc;
    use rstest::rstest;

    fn pet_with(tasks: &[&str], custom: Vec<CustomTask>) -> Pet {
        Pet {
            id: PetId::new("pet"),
            name: "Biscuit".into(),
            kind: "dog".into(),
            breed: String::new(),
            tasks: tasks.iter().map(|id| TaskId::new(*id)).collect(),
            custom_tasks: custom,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn resolves_catalog_then_custom_tasks() {
        let custom = CustomTask {
            id: Some(TaskId::new("custom-nails")),
            icon: "💅".into(),
            name: "Trim nails".into(),
            detail: "Carefully!".into(),
            schedule: Some(SchedulePolicy::Weekly),
            days: BTreeSet::from([6]),
            requires_approval: true,
        };
        let pet = pet_with(&["water", "no-such-task", "walk"], vec![custom]);

        let ids: Vec<_> = pet_tasks(&pet).into_iter().map(|t| t.id.to_string()).collect();
        assert_eq!(ids, ["water", "walk", "custom-nails"]);

        let nails = find_task(&pet, &TaskId::new("custom-nails")).unwrap();
        assert!(nails.custom);
        assert!(nails.requires_approval);
        assert_eq!(nails.hint, "Carefully!");
    }

    #[test]
    fn default_tasks_exist_in_catalog() {
        for id in default_tasks() {
            assert!(lookup(id.as_str()).is_some(), "{id} missing from catalog");
        }
    }

    #[rstest]
    #[case("dog", "🐶")]
    #[case(" Cat ", "🐱")]
    #[case("RABBIT", "🐰")]
    fn pet_types_resolve_loosely(#[case] input: &str, #[case] emoji: &str) {
        assert_eq!(pet_type(input).map(|kind| kind.emoji), Some(emoji));
    }

    #[test]
    fn unknown_pet_type_is_absent() {
        assert!(pet_type("dragon").is_none());
        assert!(pet_type("").is_none());
    }
}
