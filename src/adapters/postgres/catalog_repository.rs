//! PostgreSQL implementation of CatalogRepository.

use crate::domain::catalog::{CatalogItem, ItemState, RewardKind};
use crate::domain::foundation::{CatalogItemId, DomainError, ErrorCode, Timestamp};
use crate::ports::{CatalogRepository, VersionedItem};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of the CatalogRepository port.
pub struct PostgresCatalogRepository {
    pool: PgPool,
}

impl PostgresCatalogRepository {
    /// Creates a new PostgresCatalogRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a catalog item.
#[derive(Debug, sqlx::FromRow)]
struct CatalogItemRow {
    id: Uuid,
    name: String,
    points_cost: i64,
    kind: String,
    value: f64,
    applicable_categories: Vec<String>,
    inventory_cap: Option<i32>,
    inventory_consumed: i32,
    expires_at: Option<DateTime<Utc>>,
    state: String,
    version: i64,
}

impl TryFrom<CatalogItemRow> for VersionedItem {
    type Error = DomainError;

    fn try_from(row: CatalogItemRow) -> Result<Self, Self::Error> {
        let kind = parse_reward_kind(&row.kind)?;
        let state = parse_item_state(&row.state)?;

        let item = CatalogItem {
            id: CatalogItemId::from_uuid(row.id),
            name: row.name,
            points_cost: row.points_cost,
            kind,
            value: row.value,
            applicable_categories: row.applicable_categories,
            inventory_cap: row.inventory_cap.map(|cap| cap as u32),
            inventory_consumed: row.inventory_consumed as u32,
            expires_at: row.expires_at.map(Timestamp::from_datetime),
            state,
        };
        Ok(VersionedItem {
            item,
            version: row.version as u64,
        })
    }
}

fn parse_reward_kind(s: &str) -> Result<RewardKind, DomainError> {
    match s {
        "discount" => Ok(RewardKind::Discount),
        "free_item" => Ok(RewardKind::FreeItem),
        "free_shipping" => Ok(RewardKind::FreeShipping),
        "points_bonus" => Ok(RewardKind::PointsBonus),
        "premium_access" => Ok(RewardKind::PremiumAccess),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid reward kind value: {}", s),
        )),
    }
}

fn parse_item_state(s: &str) -> Result<ItemState, DomainError> {
    match s {
        "active" => Ok(ItemState::Active),
        "inactive" => Ok(ItemState::Inactive),
        "exhausted" => Ok(ItemState::Exhausted),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid item state value: {}", s),
        )),
    }
}

pub(super) fn item_state_to_string(state: &ItemState) -> &'static str {
    match state {
        ItemState::Active => "active",
        ItemState::Inactive => "inactive",
        ItemState::Exhausted => "exhausted",
    }
}

const ITEM_COLUMNS: &str = "id, name, points_cost, kind, value, applicable_categories, \
     inventory_cap, inventory_consumed, expires_at, state, version";

#[async_trait]
impl CatalogRepository for PostgresCatalogRepository {
    async fn find_item(&self, id: &CatalogItemId) -> Result<Option<VersionedItem>, DomainError> {
        let row: Option<CatalogItemRow> = sqlx::query_as(&format!(
            "SELECT {} FROM catalog_items WHERE id = $1",
            ITEM_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to find catalog item: {}", e),
            )
        })?;

        row.map(VersionedItem::try_from).transpose()
    }

    async fn list_available(&self, now: Timestamp) -> Result<Vec<CatalogItem>, DomainError> {
        let rows: Vec<CatalogItemRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM catalog_items
            WHERE state = 'active'
              AND (expires_at IS NULL OR expires_at >= $1)
              AND (inventory_cap IS NULL OR inventory_consumed < inventory_cap)
            ORDER BY points_cost ASC
            "#,
            ITEM_COLUMNS
        ))
        .bind(now.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to list catalog items: {}", e),
            )
        })?;

        rows.into_iter()
            .map(|row| VersionedItem::try_from(row).map(|versioned| versioned.item))
            .collect()
    }

    async fn insert_item(&self, item: &CatalogItem) -> Result<u64, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO catalog_items (
                id, name, points_cost, kind, value, applicable_categories,
                inventory_cap, inventory_consumed, expires_at, state, version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 1)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(&item.name)
        .bind(item.points_cost)
        .bind(item.kind.as_str())
        .bind(item.value)
        .bind(&item.applicable_categories)
        .bind(item.inventory_cap.map(|cap| cap as i32))
        .bind(item.inventory_consumed as i32)
        .bind(item.expires_at.map(|ts| *ts.as_datetime()))
        .bind(item_state_to_string(&item.state))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to insert catalog item: {}", e),
            )
        })?;

        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reward_kind_works_for_all_values() {
        assert_eq!(parse_reward_kind("discount").unwrap(), RewardKind::Discount);
        assert_eq!(parse_reward_kind("free_item").unwrap(), RewardKind::FreeItem);
        assert_eq!(
            parse_reward_kind("free_shipping").unwrap(),
            RewardKind::FreeShipping
        );
        assert_eq!(
            parse_reward_kind("points_bonus").unwrap(),
            RewardKind::PointsBonus
        );
        assert_eq!(
            parse_reward_kind("premium_access").unwrap(),
            RewardKind::PremiumAccess
        );
    }

    #[test]
    fn parse_reward_kind_rejects_invalid_values() {
        assert!(parse_reward_kind("cashback").is_err());
        assert!(parse_reward_kind("").is_err());
    }

    #[test]
    fn item_state_round_trips() {
        for state in [ItemState::Active, ItemState::Inactive, ItemState::Exhausted] {
            let s = item_state_to_string(&state);
            assert_eq!(parse_item_state(s).unwrap(), state);
        }
    }

    #[test]
    fn reward_kind_string_forms_match_domain() {
        for kind in [
            RewardKind::Discount,
            RewardKind::FreeItem,
            RewardKind::FreeShipping,
            RewardKind::PointsBonus,
            RewardKind::PremiumAccess,
        ] {
            assert_eq!(parse_reward_kind(kind.as_str()).unwrap(), kind);
        }
    }
}
