//! Audit log recorder.
//!
//! Append happens inside the caller's database transaction so the
//! audit row and the mutation it records commit or roll back together.
//! There is deliberately no update or delete function here.

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use fiscus_core::audit::{action::AuditAction, snapshot::Snapshot};
use fiscus_shared::types::pagination::{PageRequest, PageResponse};

use crate::entities::audit_log;
use crate::repositories::AuditContext;

/// Error types for audit log operations.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<AuditError> for fiscus_shared::AppError {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Appends one immutable audit row on the given connection.
///
/// Callers pass their open transaction so the trail commits with the
/// mutation.
pub(crate) async fn record<C: ConnectionTrait>(
    conn: &C,
    ctx: &AuditContext,
    action: AuditAction,
    entity_type: &str,
    entity_id: Option<Uuid>,
    old: Option<Snapshot>,
    new: Option<Snapshot>,
) -> Result<(), DbErr> {
    let row = audit_log::ActiveModel {
        id: Set(Uuid::new_v4()),
        actor_id: Set(ctx.actor),
        action: Set(action.as_str().to_string()),
        entity_type: Set(entity_type.to_string()),
        entity_id: Set(entity_id),
        old_values: Set(old.map(Snapshot::into_json)),
        new_values: Set(new.map(Snapshot::into_json)),
        ip_address: Set(ctx.ip.clone()),
        created_at: Set(chrono::Utc::now().into()),
    };
    row.insert(conn).await?;
    Ok(())
}

/// Filter options for listing audit entries.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    /// Filter by acting user.
    pub actor_id: Option<Uuid>,
    /// Filter by action name (e.g. `transaction_created`).
    pub action: Option<String>,
    /// Filter by entity type (e.g. `transaction`, `claim`).
    pub entity_type: Option<String>,
    /// Entries on or after this date.
    pub from: Option<NaiveDate>,
    /// Entries on or before this date.
    pub to: Option<NaiveDate>,
}

/// Read-only repository over the audit trail.
#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    db: DatabaseConnection,
}

impl AuditLogRepository {
    /// Creates a new audit log repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists audit entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        filter: AuditFilter,
        page: PageRequest,
    ) -> Result<PageResponse<audit_log::Model>, AuditError> {
        let mut query = audit_log::Entity::find();

        if let Some(actor_id) = filter.actor_id {
            query = query.filter(audit_log::Column::ActorId.eq(actor_id));
        }
        if let Some(action) = &filter.action {
            query = query.filter(audit_log::Column::Action.eq(action));
        }
        if let Some(entity_type) = &filter.entity_type {
            query = query.filter(audit_log::Column::EntityType.eq(entity_type));
        }
        if let Some(from) = filter.from {
            let start = from.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
            query = query.filter(audit_log::Column::CreatedAt.gte(start));
        }
        if let Some(to) = filter.to {
            let end = to
                .and_hms_opt(23, 59, 59)
                .unwrap_or_default()
                .and_utc();
            query = query.filter(audit_log::Column::CreatedAt.lte(end));
        }

        let total = query.clone().count(&self.db).await?;

        let entries = query
            .order_by_desc(audit_log::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(entries, total, page))
    }
}
