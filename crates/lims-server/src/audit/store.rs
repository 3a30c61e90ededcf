//! Append-only audit log store
//!
//! Writes run on the caller's transaction connection so audit rows commit
//! atomically with the business mutations they describe. Reads go straight
//! to the pool. Rows are never updated or deleted.

use sqlx::{PgConnection, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::uow::EntityKind;

use super::models::{
    AuditLogRow, AuditQuery, NewAuditLog, DEFAULT_AUDIT_QUERY_LIMIT, MAX_AUDIT_QUERY_LIMIT,
};

/// Insert a batch of audit rows on an open transaction connection.
pub async fn insert_audit_rows(
    conn: &mut PgConnection,
    rows: &[NewAuditLog],
) -> Result<(), sqlx::Error> {
    for row in rows {
        sqlx::query(
            r#"
            INSERT INTO audit_log (
                entity_kind, entity_id, action, performed_by,
                changed_fields, old_values, new_values
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(row.entity_kind.as_str())
        .bind(row.entity_id)
        .bind(row.action.as_str())
        .bind(row.performed_by)
        .bind(&row.changed_fields)
        .bind(&row.old_values)
        .bind(&row.new_values)
        .execute(&mut *conn)
        .await?;
    }

    debug!(count = rows.len(), "Staged audit rows on transaction");
    Ok(())
}

/// Query audit logs with optional filters, newest first.
pub async fn query_audit_logs(
    pool: &PgPool,
    query: AuditQuery,
) -> Result<Vec<AuditLogRow>, sqlx::Error> {
    // Hostile or malformed paging values are clamped, not forwarded.
    let limit = query.limit.clamp(1, MAX_AUDIT_QUERY_LIMIT);
    let offset = query.offset.max(0);

    let mut sql = String::from(
        r#"
        SELECT id, entity_kind, entity_id, action, performed_by,
               timestamp, changed_fields, old_values, new_values
        FROM audit_log
        WHERE 1=1
        "#,
    );

    let mut bind_count = 0;
    let mut push_condition = |column: &str, op: &str| {
        bind_count += 1;
        sql_condition(column, op, bind_count)
    };

    let mut conditions = Vec::new();
    if query.performed_by.is_some() {
        conditions.push(push_condition("performed_by", "="));
    }
    if query.action.is_some() {
        conditions.push(push_condition("action", "="));
    }
    if query.entity_kind.is_some() {
        conditions.push(push_condition("entity_kind", "="));
    }
    if query.entity_id.is_some() {
        conditions.push(push_condition("entity_id", "="));
    }
    if query.start_time.is_some() {
        conditions.push(push_condition("timestamp", ">="));
    }
    if query.end_time.is_some() {
        conditions.push(push_condition("timestamp", "<="));
    }

    for condition in &conditions {
        sql.push_str(" AND ");
        sql.push_str(condition);
    }
    sql.push_str(&format!(
        " ORDER BY timestamp DESC LIMIT ${} OFFSET ${}",
        bind_count + 1,
        bind_count + 2
    ));

    let mut q = sqlx::query_as::<_, AuditLogRow>(&sql);
    if let Some(performed_by) = query.performed_by {
        q = q.bind(performed_by);
    }
    if let Some(action) = query.action {
        q = q.bind(action.as_str());
    }
    if let Some(entity_kind) = query.entity_kind {
        q = q.bind(entity_kind.as_str());
    }
    if let Some(entity_id) = query.entity_id {
        q = q.bind(entity_id);
    }
    if let Some(start_time) = query.start_time {
        q = q.bind(start_time);
    }
    if let Some(end_time) = query.end_time {
        q = q.bind(end_time);
    }

    let records = q.bind(limit).bind(offset).fetch_all(pool).await?;

    debug!(count = records.len(), "Queried audit logs");
    Ok(records)
}

/// Full audit trail for one entity, newest first.
pub async fn entity_audit_trail(
    pool: &PgPool,
    entity_kind: EntityKind,
    entity_id: Uuid,
    limit: Option<i64>,
) -> Result<Vec<AuditLogRow>, sqlx::Error> {
    let limit = limit
        .unwrap_or(DEFAULT_AUDIT_QUERY_LIMIT)
        .clamp(1, MAX_AUDIT_QUERY_LIMIT);

    let records = sqlx::query_as::<_, AuditLogRow>(
        r#"
        SELECT id, entity_kind, entity_id, action, performed_by,
               timestamp, changed_fields, old_values, new_values
        FROM audit_log
        WHERE entity_kind = $1 AND entity_id = $2
        ORDER BY timestamp DESC
        LIMIT $3
        "#,
    )
    .bind(entity_kind.as_str())
    .bind(entity_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    debug!(
        entity_kind = %entity_kind,
        entity_id = %entity_id,
        count = records.len(),
        "Retrieved entity audit trail"
    );
    Ok(records)
}

fn sql_condition(column: &str, op: &str, bind: usize) -> String {
    format!("{} {} ${}", column, op, bind)
}
