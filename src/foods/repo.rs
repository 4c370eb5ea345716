use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::query::{like_pattern, ListingQuery, Page};
use super::repo_types::{Food, FoodFilter, FoodPatch, FoodStatus, NewFood, UpdateOutcome};
use super::workflow::Transition;

const FOOD_COLUMNS: &str = "id, food_name, food_image, food_quantity, pickup_location, expire_date, \
     additional_notes, donator_email, donator_name, donator_image, food_status, \
     requested_by_email, created_at";

#[async_trait]
pub trait FoodStore: Send + Sync {
    async fn list(&self, query: &ListingQuery) -> anyhow::Result<Page<Food>>;
    async fn list_where(&self, filter: &FoodFilter) -> anyhow::Result<Vec<Food>>;
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Food>>;
    async fn insert(&self, new: NewFood) -> anyhow::Result<Food>;
    /// Atomic single-record status change. `matched == 0` means no such id.
    async fn transition(&self, id: Uuid, transition: &Transition) -> anyhow::Result<UpdateOutcome>;
    async fn update(&self, id: Uuid, patch: &FoodPatch) -> anyhow::Result<UpdateOutcome>;
    /// Number of removed records (0 or 1).
    async fn delete(&self, id: Uuid) -> anyhow::Result<u64>;
}

#[derive(Clone)]
pub struct PgFoodStore {
    db: PgPool,
}

impl PgFoodStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn exists(&self, id: Uuid) -> anyhow::Result<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM foods WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.db)
            .await
            .context("check food exists")
    }

    /// Turns "zero rows written" into either not-found or unchanged.
    async fn outcome(&self, id: Uuid, rows_affected: u64) -> anyhow::Result<UpdateOutcome> {
        if rows_affected > 0 {
            return Ok(UpdateOutcome::changed());
        }
        if self.exists(id).await? {
            Ok(UpdateOutcome::unchanged())
        } else {
            Ok(UpdateOutcome::not_found())
        }
    }
}

fn push_listing_filters(qb: &mut QueryBuilder<'static, Postgres>, query: &ListingQuery) {
    qb.push(" WHERE TRUE");
    if let Some(status) = query.status {
        qb.push(" AND food_status = ").push_bind(status);
    }
    if let Some(search) = &query.search {
        qb.push(" AND food_name ILIKE ")
            .push_bind(like_pattern(search))
            .push(r" ESCAPE '\'");
    }
}

pub(crate) fn page_query(query: &ListingQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {FOOD_COLUMNS} FROM foods"));
    push_listing_filters(&mut qb, query);
    qb.push(" ORDER BY ").push(query.sort.order_by());
    qb.push(" LIMIT ").push_bind(query.limit);
    qb.push(" OFFSET ").push_bind(query.offset());
    qb
}

pub(crate) fn count_query(query: &ListingQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM foods");
    push_listing_filters(&mut qb, query);
    qb
}

pub(crate) fn filter_query(filter: &FoodFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {FOOD_COLUMNS} FROM foods WHERE "));
    match filter {
        FoodFilter::Donor(email) => qb.push("donator_email = ").push_bind(email.clone()),
        FoodFilter::Requester(email) => qb.push("requested_by_email = ").push_bind(email.clone()),
        FoodFilter::Status(status) => qb.push("food_status = ").push_bind(*status),
    };
    qb.push(" ORDER BY created_at DESC, id ASC");
    qb
}

/// `UPDATE ... SET` for the supplied fields, skipped when nothing would change.
/// Returns `None` for an empty patch.
pub(crate) fn update_query(id: Uuid, patch: &FoodPatch) -> Option<QueryBuilder<'static, Postgres>> {
    if patch.is_empty() {
        return None;
    }

    let mut text: Vec<(&'static str, String)> = Vec::new();
    let fields = [
        ("food_name", &patch.food_name),
        ("food_image", &patch.food_image),
        ("pickup_location", &patch.pickup_location),
        ("additional_notes", &patch.additional_notes),
        ("donator_email", &patch.donator_email),
        ("donator_name", &patch.donator_name),
        ("donator_image", &patch.donator_image),
    ];
    for (column, value) in fields {
        if let Some(v) = value {
            text.push((column, v.clone()));
        }
    }

    let mut qb = QueryBuilder::new("UPDATE foods SET ");
    {
        let mut set = qb.separated(", ");
        for (column, value) in &text {
            set.push(format!("{column} = ")).push_bind_unseparated(value.clone());
        }
        if let Some(q) = patch.food_quantity {
            set.push("food_quantity = ").push_bind_unseparated(q);
        }
        if let Some(d) = patch.expire_date {
            set.push("expire_date = ").push_bind_unseparated(d);
        }
    }

    qb.push(" WHERE id = ").push_bind(id).push(" AND (");
    {
        let mut changed = qb.separated(" OR ");
        for (column, value) in text {
            changed
                .push(format!("{column} IS DISTINCT FROM "))
                .push_bind_unseparated(value);
        }
        if let Some(q) = patch.food_quantity {
            changed
                .push("food_quantity IS DISTINCT FROM ")
                .push_bind_unseparated(q);
        }
        if let Some(d) = patch.expire_date {
            changed
                .push("expire_date IS DISTINCT FROM ")
                .push_bind_unseparated(d);
        }
    }
    qb.push(")");
    Some(qb)
}

#[async_trait]
impl FoodStore for PgFoodStore {
    async fn list(&self, query: &ListingQuery) -> anyhow::Result<Page<Food>> {
        let items = page_query(query)
            .build_query_as::<Food>()
            .fetch_all(&self.db)
            .await
            .context("list foods")?;
        let total = count_query(query)
            .build_query_scalar::<i64>()
            .fetch_one(&self.db)
            .await
            .context("count foods")?;
        Ok(Page { items, total })
    }

    async fn list_where(&self, filter: &FoodFilter) -> anyhow::Result<Vec<Food>> {
        filter_query(filter)
            .build_query_as::<Food>()
            .fetch_all(&self.db)
            .await
            .context("list foods by filter")
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Food>> {
        let sql = format!("SELECT {FOOD_COLUMNS} FROM foods WHERE id = $1");
        sqlx::query_as::<_, Food>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("get food")
    }

    async fn insert(&self, new: NewFood) -> anyhow::Result<Food> {
        let food = new.into_food();
        let sql = format!(
            r#"
            INSERT INTO foods ({FOOD_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {FOOD_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Food>(&sql)
            .bind(food.id)
            .bind(&food.food_name)
            .bind(&food.food_image)
            .bind(food.food_quantity)
            .bind(&food.pickup_location)
            .bind(food.expire_date)
            .bind(&food.additional_notes)
            .bind(&food.donator_email)
            .bind(&food.donator_name)
            .bind(&food.donator_image)
            .bind(food.food_status)
            .bind(&food.requested_by_email)
            .bind(food.created_at)
            .fetch_one(&self.db)
            .await
            .context("insert food")
    }

    async fn transition(&self, id: Uuid, transition: &Transition) -> anyhow::Result<UpdateOutcome> {
        let result = match transition {
            Transition::Request { requester } => sqlx::query(
                r#"
                UPDATE foods
                   SET requested_by_email = $2, food_status = $3
                 WHERE id = $1 AND requested_by_email IS DISTINCT FROM $2
                "#,
            )
            .bind(id)
            .bind(requester)
            .bind(FoodStatus::Requested),
            Transition::Approve => sqlx::query(
                r#"
                UPDATE foods
                   SET food_status = $2
                 WHERE id = $1 AND food_status <> $2
                "#,
            )
            .bind(id)
            .bind(FoodStatus::Approved),
            Transition::Reject => sqlx::query(
                r#"
                UPDATE foods
                   SET food_status = $2, requested_by_email = NULL
                 WHERE id = $1 AND (food_status <> $2 OR requested_by_email IS NOT NULL)
                "#,
            )
            .bind(id)
            .bind(FoodStatus::Available),
        }
        .execute(&self.db)
        .await
        .with_context(|| format!("apply {:?} to food {}", transition.target(), id))?;

        self.outcome(id, result.rows_affected()).await
    }

    async fn update(&self, id: Uuid, patch: &FoodPatch) -> anyhow::Result<UpdateOutcome> {
        let Some(mut qb) = update_query(id, patch) else {
            return self.outcome(id, 0).await;
        };
        let result = qb
            .build()
            .execute(&self.db)
            .await
            .context("update food")?;
        self.outcome(id, result.rows_affected()).await
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM foods WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete food")?;
        Ok(result.rows_affected())
    }
}
