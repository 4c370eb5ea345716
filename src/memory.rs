//! In-process store used when no `DATABASE_URL` is configured, and by tests.

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::foods::{
    query::{ListingQuery, Page},
    repo::FoodStore,
    repo_types::{Food, FoodFilter, FoodPatch, NewFood, UpdateOutcome},
    workflow::Transition,
};
use crate::users::{
    repo::UserStore,
    repo_types::{NewUser, User},
};

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    foods: RwLock<HashMap<Uuid, Food>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        tracing::info!("Creating new in-memory store");
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn insert_if_absent(&self, new: NewUser) -> anyhow::Result<Option<User>> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == new.email) {
            return Ok(None);
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new.email,
            display_name: new.display_name,
            photo_url: new.photo_url,
            password_hash: new.password_hash,
            role: new.role,
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(user.id, user.clone());
        Ok(Some(user))
    }

    async fn list(&self) -> anyhow::Result<Vec<User>> {
        let mut all: Vec<User> = self.users.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }
}

#[async_trait]
impl FoodStore for MemoryStore {
    async fn list(&self, query: &ListingQuery) -> anyhow::Result<Page<Food>> {
        let foods = self.foods.read().await;
        let mut matched: Vec<&Food> = foods.values().filter(|f| query.matches(f)).collect();
        matched.sort_by(|a, b| query.sort.compare(a, b));

        let total = matched.len() as i64;
        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);
        let items = matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok(Page { items, total })
    }

    async fn list_where(&self, filter: &FoodFilter) -> anyhow::Result<Vec<Food>> {
        let foods = self.foods.read().await;
        let mut out: Vec<Food> = foods.values().filter(|f| filter.matches(f)).cloned().collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Food>> {
        Ok(self.foods.read().await.get(&id).cloned())
    }

    async fn insert(&self, new: NewFood) -> anyhow::Result<Food> {
        let food = new.into_food();
        self.foods.write().await.insert(food.id, food.clone());
        Ok(food)
    }

    async fn transition(&self, id: Uuid, transition: &Transition) -> anyhow::Result<UpdateOutcome> {
        let mut foods = self.foods.write().await;
        Ok(match foods.get_mut(&id) {
            None => UpdateOutcome::not_found(),
            Some(food) => {
                if transition.apply(food) {
                    UpdateOutcome::changed()
                } else {
                    UpdateOutcome::unchanged()
                }
            }
        })
    }

    async fn update(&self, id: Uuid, patch: &FoodPatch) -> anyhow::Result<UpdateOutcome> {
        let mut foods = self.foods.write().await;
        Ok(match foods.get_mut(&id) {
            None => UpdateOutcome::not_found(),
            Some(food) => {
                if patch.apply(food) {
                    UpdateOutcome::changed()
                } else {
                    UpdateOutcome::unchanged()
                }
            }
        })
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<u64> {
        Ok(self.foods.write().await.remove(&id).map_or(0, |_| 1))
    }
}
