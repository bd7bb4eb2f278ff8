//! PostgreSQL implementation of LedgerStore.
//!
//! Accounts and events live in `loyalty_accounts` and `ledger_events`.
//! Commits run inside a transaction with version-guarded UPDATEs, so the
//! balance change and its audit event always land together. The partial
//! unique index `ux_ledger_events_accrual_ref` turns a replayed accrual into
//! `DuplicateReference` instead of a second credit.

use crate::domain::catalog::CatalogItem;
use crate::domain::foundation::{DomainError, ErrorCode, EventId, Timestamp, UserId};
use crate::domain::ledger::{
    AccountStatus, Coupon, EventKind, LedgerAccount, LedgerEvent, LoyaltyTier,
};
use crate::ports::{LedgerStore, VersionedAccount};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::catalog_repository::item_state_to_string;

/// PostgreSQL implementation of the LedgerStore port.
pub struct PostgresLedgerStore {
    pool: PgPool,
}

impl PostgresLedgerStore {
    /// Creates a new PostgresLedgerStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn update_account_guarded(
        tx: &mut Transaction<'_, Postgres>,
        account: &LedgerAccount,
        expected_version: u64,
    ) -> Result<(), DomainError> {
        let coupons = serde_json::to_value(&account.active_coupons).map_err(|e| {
            DomainError::new(
                ErrorCode::InternalError,
                format!("Failed to serialize coupons: {}", e),
            )
        })?;

        let result = sqlx::query(
            r#"
            UPDATE loyalty_accounts SET
                current_balance = $2,
                lifetime_accrued = $3,
                lifetime_redeemed = $4,
                tier = $5,
                status = $6,
                active_coupons = $7,
                updated_at = $8,
                version = version + 1
            WHERE user_id = $1 AND version = $9
            "#,
        )
        .bind(account.user_id.as_str())
        .bind(account.current_balance)
        .bind(account.lifetime_accrued)
        .bind(account.lifetime_redeemed)
        .bind(tier_to_string(&account.tier))
        .bind(status_to_string(&account.status))
        .bind(coupons)
        .bind(account.updated_at.as_datetime())
        .bind(expected_version as i64)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to update account: {}", e),
            )
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::VersionConflict,
                format!(
                    "Account {} changed since version {}",
                    account.user_id, expected_version
                ),
            ));
        }
        Ok(())
    }

    async fn insert_event(
        tx: &mut Transaction<'_, Postgres>,
        event: &LedgerEvent,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO ledger_events (
                id, user_id, kind, amount, balance_before, balance_after,
                reference, description, occurred_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(event.id.as_uuid())
        .bind(event.user_id.as_str())
        .bind(event.kind.as_str())
        .bind(event.amount)
        .bind(event.balance_before)
        .bind(event.balance_after)
        .bind(&event.reference)
        .bind(&event.description)
        .bind(event.occurred_at.as_datetime())
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("ux_ledger_events_accrual_ref") {
                    return DomainError::new(
                        ErrorCode::DuplicateReference,
                        format!(
                            "Accrual already recorded for reference '{}'",
                            event.reference
                        ),
                    );
                }
            }
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to insert ledger event: {}", e),
            )
        })?;
        Ok(())
    }
}

/// Database row representation of a ledger account.
#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    user_id: String,
    current_balance: i64,
    lifetime_accrued: i64,
    lifetime_redeemed: i64,
    tier: String,
    status: String,
    active_coupons: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<AccountRow> for VersionedAccount {
    type Error = DomainError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let tier = parse_tier(&row.tier)?;
        let status = parse_status(&row.status)?;
        let active_coupons: Vec<Coupon> =
            serde_json::from_value(row.active_coupons).map_err(|e| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Invalid coupon payload: {}", e),
                )
            })?;

        let account = LedgerAccount {
            user_id: UserId::new(row.user_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid user_id: {}", e))
            })?,
            current_balance: row.current_balance,
            lifetime_accrued: row.lifetime_accrued,
            lifetime_redeemed: row.lifetime_redeemed,
            tier,
            // The benefit snapshot is a pure function of the tier.
            benefits: tier.benefits(),
            status,
            active_coupons,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        };
        Ok(VersionedAccount {
            account,
            version: row.version as u64,
        })
    }
}

/// Database row representation of a ledger event.
#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    user_id: String,
    kind: String,
    amount: i64,
    balance_before: i64,
    balance_after: i64,
    reference: String,
    description: String,
    occurred_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for LedgerEvent {
    type Error = DomainError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        Ok(LedgerEvent {
            id: EventId::from_uuid(row.id),
            user_id: UserId::new(row.user_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid user_id: {}", e))
            })?,
            kind: parse_event_kind(&row.kind)?,
            amount: row.amount,
            balance_before: row.balance_before,
            balance_after: row.balance_after,
            reference: row.reference,
            description: row.description,
            occurred_at: Timestamp::from_datetime(row.occurred_at),
        })
    }
}

fn parse_tier(s: &str) -> Result<LoyaltyTier, DomainError> {
    match s {
        "bronze" => Ok(LoyaltyTier::Bronze),
        "silver" => Ok(LoyaltyTier::Silver),
        "gold" => Ok(LoyaltyTier::Gold),
        "platinum" => Ok(LoyaltyTier::Platinum),
        "diamond" => Ok(LoyaltyTier::Diamond),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid tier value: {}", s),
        )),
    }
}

fn tier_to_string(tier: &LoyaltyTier) -> &'static str {
    match tier {
        LoyaltyTier::Bronze => "bronze",
        LoyaltyTier::Silver => "silver",
        LoyaltyTier::Gold => "gold",
        LoyaltyTier::Platinum => "platinum",
        LoyaltyTier::Diamond => "diamond",
    }
}

fn parse_status(s: &str) -> Result<AccountStatus, DomainError> {
    match s {
        "active" => Ok(AccountStatus::Active),
        "suspended" => Ok(AccountStatus::Suspended),
        "cancelled" => Ok(AccountStatus::Cancelled),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid status value: {}", s),
        )),
    }
}

fn status_to_string(status: &AccountStatus) -> &'static str {
    match status {
        AccountStatus::Active => "active",
        AccountStatus::Suspended => "suspended",
        AccountStatus::Cancelled => "cancelled",
    }
}

fn parse_event_kind(s: &str) -> Result<EventKind, DomainError> {
    match s {
        "purchase" => Ok(EventKind::Purchase),
        "referral" => Ok(EventKind::Referral),
        "review" => Ok(EventKind::Review),
        "redemption" => Ok(EventKind::Redemption),
        "bonus" => Ok(EventKind::Bonus),
        "adjustment" => Ok(EventKind::Adjustment),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid event kind value: {}", s),
        )),
    }
}

const ACCOUNT_COLUMNS: &str = "user_id, current_balance, lifetime_accrued, lifetime_redeemed, \
     tier, status, active_coupons, created_at, updated_at, version";

const EVENT_COLUMNS: &str = "id, user_id, kind, amount, balance_before, balance_after, \
     reference, description, occurred_at";

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    async fn find_account(
        &self,
        user_id: &UserId,
    ) -> Result<Option<VersionedAccount>, DomainError> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {} FROM loyalty_accounts WHERE user_id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to find account: {}", e),
            )
        })?;

        row.map(VersionedAccount::try_from).transpose()
    }

    async fn insert_account(&self, account: &LedgerAccount) -> Result<u64, DomainError> {
        let coupons = serde_json::to_value(&account.active_coupons).map_err(|e| {
            DomainError::new(
                ErrorCode::InternalError,
                format!("Failed to serialize coupons: {}", e),
            )
        })?;

        sqlx::query(
            r#"
            INSERT INTO loyalty_accounts (
                user_id, current_balance, lifetime_accrued, lifetime_redeemed,
                tier, status, active_coupons, created_at, updated_at, version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 1)
            "#,
        )
        .bind(account.user_id.as_str())
        .bind(account.current_balance)
        .bind(account.lifetime_accrued)
        .bind(account.lifetime_redeemed)
        .bind(tier_to_string(&account.tier))
        .bind(status_to_string(&account.status))
        .bind(coupons)
        .bind(account.created_at.as_datetime())
        .bind(account.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("loyalty_accounts_pkey") {
                    return DomainError::new(
                        ErrorCode::AccountAlreadyExists,
                        format!("Account already exists for user {}", account.user_id),
                    );
                }
            }
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to insert account: {}", e),
            )
        })?;

        Ok(1)
    }

    async fn commit_accrual(
        &self,
        account: &LedgerAccount,
        expected_version: u64,
        event: &LedgerEvent,
    ) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to begin transaction: {}", e),
            )
        })?;

        Self::update_account_guarded(&mut tx, account, expected_version).await?;
        Self::insert_event(&mut tx, event).await?;

        tx.commit().await.map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to commit accrual: {}", e),
            )
        })
    }

    async fn commit_redemption(
        &self,
        account: &LedgerAccount,
        expected_version: u64,
        item: &CatalogItem,
        expected_item_version: u64,
        event: &LedgerEvent,
    ) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to begin transaction: {}", e),
            )
        })?;

        Self::update_account_guarded(&mut tx, account, expected_version).await?;

        // Only inventory and lifecycle state change during a redemption.
        let result = sqlx::query(
            r#"
            UPDATE catalog_items SET
                inventory_consumed = $2,
                state = $3,
                version = version + 1
            WHERE id = $1 AND version = $4
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(item.inventory_consumed as i32)
        .bind(item_state_to_string(&item.state))
        .bind(expected_item_version as i64)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to update catalog item: {}", e),
            )
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::VersionConflict,
                format!(
                    "Catalog item {} changed since version {}",
                    item.id, expected_item_version
                ),
            ));
        }

        Self::insert_event(&mut tx, event).await?;

        tx.commit().await.map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to commit redemption: {}", e),
            )
        })
    }

    async fn find_accrual_by_reference(
        &self,
        user_id: &UserId,
        kind: EventKind,
        reference: &str,
    ) -> Result<Option<LedgerEvent>, DomainError> {
        let row: Option<EventRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM ledger_events
            WHERE user_id = $1 AND kind = $2 AND reference = $3
            LIMIT 1
            "#,
            EVENT_COLUMNS
        ))
        .bind(user_id.as_str())
        .bind(kind.as_str())
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to find accrual by reference: {}", e),
            )
        })?;

        row.map(LedgerEvent::try_from).transpose()
    }

    async fn history(
        &self,
        user_id: &UserId,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<LedgerEvent>, DomainError> {
        let rows: Vec<EventRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM ledger_events
            WHERE user_id = $1
            ORDER BY seq DESC
            LIMIT $2 OFFSET $3
            "#,
            EVENT_COLUMNS
        ))
        .bind(user_id.as_str())
        .bind(page_size as i64)
        .bind(page as i64 * page_size as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to load history: {}", e),
            )
        })?;

        rows.into_iter().map(LedgerEvent::try_from).collect()
    }

    async fn events_for_user(&self, user_id: &UserId) -> Result<Vec<LedgerEvent>, DomainError> {
        let rows: Vec<EventRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM ledger_events
            WHERE user_id = $1
            ORDER BY seq ASC
            "#,
            EVENT_COLUMNS
        ))
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to load events: {}", e),
            )
        })?;

        rows.into_iter().map(LedgerEvent::try_from).collect()
    }
}
