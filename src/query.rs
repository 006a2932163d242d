//! Typed statement builders and the executor operations run on a [`Session`].
//!
//! Column names come from the closed [`Column`] set and the table name from a
//! validated [`TableName`], always emitted as a quoted identifier; every value travels as a bind parameter.

use sqlx::{postgres::PgRow, Connection, FromRow, Postgres, QueryBuilder, Transaction};
use tracing::{debug, error, info, instrument, warn};

use crate::{config::TableName, db::Session, error::StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    UserId,
    Username,
    Email,
    PasswordHash,
    Age,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

impl Column {
    /// Columns carrying a uniqueness constraint.
    pub const UNIQUE: [Column; 2] = [Column::Username, Column::Email];

    pub fn as_str(self) -> &'static str {
        match self {
            Column::UserId => "user_id",
            Column::Username => "username",
            Column::Email => "email",
            Column::PasswordHash => "password_hash",
            Column::Age => "age",
            Column::IsActive => "is_active",
            Column::CreatedAt => "created_at",
            Column::UpdatedAt => "updated_at",
        }
    }

    /// Resolves a violated constraint name (`users_email_key`, `uq_users_email`, `email`)
    /// to the unique column it guards.
    pub fn from_unique_constraint(constraint: &str) -> Option<Column> {
        Column::UNIQUE.into_iter().find(|col| {
            let name = col.as_str();
            constraint == name
                || constraint.ends_with(&format!("_{name}_key"))
                || constraint.ends_with(&format!("_{name}"))
        })
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Int(Option<i32>),
    BigInt(i64),
    Bool(bool),
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Option<i32>> for Value {
    fn from(v: Option<i32>) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

fn push_value(qb: &mut QueryBuilder<'static, Postgres>, value: &Value) {
    match value {
        Value::Text(v) => qb.push_bind(v.clone()),
        Value::Int(v) => qb.push_bind(*v),
        Value::BigInt(v) => qb.push_bind(*v),
        Value::Bool(v) => qb.push_bind(*v),
    };
}

fn push_where(qb: &mut QueryBuilder<'static, Postgres>, filter: &(Column, Value)) {
    qb.push(" WHERE ");
    qb.push(filter.0.as_str());
    qb.push(" = ");
    push_value(qb, &filter.1);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub struct Select {
    columns: Vec<Column>,
    filter: Option<(Column, Value)>,
    order_by: Option<(Column, Order)>,
}

impl Select {
    pub fn columns(columns: &[Column]) -> Self {
        Self {
            columns: columns.to_vec(),
            filter: None,
            order_by: None,
        }
    }

    pub fn filter_eq(mut self, column: Column, value: impl Into<Value>) -> Self {
        self.filter = Some((column, value.into()));
        self
    }

    pub fn order_by(mut self, column: Column, order: Order) -> Self {
        self.order_by = Some((column, order));
        self
    }

    pub fn build(&self, table: &TableName) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
        if self.columns.is_empty() {
            return Err(StoreError::InvalidCommand("select without columns"));
        }
        let mut qb = QueryBuilder::new("SELECT ");
        qb.push(join(&self.columns));
        qb.push(" FROM ");
        qb.push(table.quoted());
        if let Some(filter) = &self.filter {
            push_where(&mut qb, filter);
        }
        if let Some((column, order)) = self.order_by {
            qb.push(" ORDER BY ");
            qb.push(column.as_str());
            qb.push(match order {
                Order::Asc => " ASC",
                Order::Desc => " DESC",
            });
        }
        Ok(qb)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Insert {
    values: Vec<(Column, Value)>,
}

impl Insert {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(mut self, column: Column, value: impl Into<Value>) -> Self {
        self.values.push((column, value.into()));
        self
    }

    /// `INSERT ... RETURNING user_id`.
    pub fn build(&self, table: &TableName) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
        if self.values.is_empty() {
            return Err(StoreError::InvalidCommand("insert without values"));
        }
        let columns: Vec<Column> = self.values.iter().map(|(c, _)| *c).collect();
        let mut qb = QueryBuilder::new("INSERT INTO ");
        qb.push(table.quoted());
        qb.push(" (");
        qb.push(join(&columns));
        qb.push(") VALUES (");
        for (i, (_, value)) in self.values.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            push_value(&mut qb, value);
        }
        qb.push(") RETURNING ");
        qb.push(Column::UserId.as_str());
        Ok(qb)
    }
}

/// Right-hand side of a `SET` assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetExpr {
    Bind(Value),
    /// `column = NOT column`
    Negate,
    /// `column = now()`
    Now,
}

#[derive(Debug, Clone)]
pub struct Update {
    set: Vec<(Column, SetExpr)>,
    filter: (Column, Value),
}

impl Update {
    pub fn filter_eq(column: Column, value: impl Into<Value>) -> Self {
        Self {
            set: Vec::new(),
            filter: (column, value.into()),
        }
    }

    pub fn set(mut self, column: Column, value: impl Into<Value>) -> Self {
        self.set.push((column, SetExpr::Bind(value.into())));
        self
    }

    pub fn negate(mut self, column: Column) -> Self {
        self.set.push((column, SetExpr::Negate));
        self
    }

    pub fn touch(mut self, column: Column) -> Self {
        self.set.push((column, SetExpr::Now));
        self
    }

    pub fn build(&self, table: &TableName) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
        if self.set.is_empty() {
            return Err(StoreError::InvalidCommand("update without assignments"));
        }
        let mut qb = QueryBuilder::new("UPDATE ");
        qb.push(table.quoted());
        qb.push(" SET ");
        for (i, (column, expr)) in self.set.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            let name = column.as_str();
            qb.push(name);
            qb.push(" = ");
            match expr {
                SetExpr::Bind(value) => push_value(&mut qb, value),
                SetExpr::Negate => {
                    qb.push("NOT ");
                    qb.push(name);
                }
                SetExpr::Now => {
                    qb.push("now()");
                }
            }
        }
        push_where(&mut qb, &self.filter);
        Ok(qb)
    }
}

#[derive(Debug, Clone)]
pub struct Delete {
    filter: (Column, Value),
}

impl Delete {
    pub fn filter_eq(column: Column, value: impl Into<Value>) -> Self {
        Self {
            filter: (column, value.into()),
        }
    }

    pub fn build(&self, table: &TableName) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("DELETE FROM ");
        qb.push(table.quoted());
        push_where(&mut qb, &self.filter);
        qb
    }
}

fn join(columns: &[Column]) -> String {
    columns
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

async fn rollback(tx: Transaction<'_, Postgres>, op: &'static str) {
    match tx.rollback().await {
        Ok(()) => debug!(op, "transaction rolled back"),
        Err(e) => error!(error = %e, op, "rollback failed"),
    }
}

impl Session {
    /// Runs a built statement outside a transaction; returns affected rows.
    pub async fn execute_query(
        &mut self,
        mut qb: QueryBuilder<'static, Postgres>,
    ) -> Result<u64, StoreError> {
        debug!(sql = qb.sql(), "execute");
        let done = qb
            .build()
            .execute(self.conn_mut())
            .await
            .map_err(|e| {
                error!(error = %e, "query failed");
                StoreError::from_sqlx(e)
            })?;
        Ok(done.rows_affected())
    }

    #[instrument(skip_all)]
    pub async fn fetch_one<T>(&mut self, select: &Select) -> Result<Option<T>, StoreError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut qb = select.build(self.table())?;
        debug!(table = %self.table(), sql = qb.sql(), "fetch one");
        let row = qb
            .build_query_as::<T>()
            .fetch_optional(self.conn_mut())
            .await
            .map_err(|e| {
                error!(error = %e, "fetch one failed");
                StoreError::from_sqlx(e)
            })?;
        Ok(row)
    }

    #[instrument(skip_all)]
    pub async fn fetch_all<T>(&mut self, select: &Select) -> Result<Vec<T>, StoreError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut qb = select.build(self.table())?;
        debug!(table = %self.table(), sql = qb.sql(), "fetch all");
        let rows = qb
            .build_query_as::<T>()
            .fetch_all(self.conn_mut())
            .await
            .map_err(|e| {
                error!(error = %e, "fetch all failed");
                StoreError::from_sqlx(e)
            })?;
        debug!(count = rows.len(), "rows fetched");
        Ok(rows)
    }

    /// Inserts one row and returns the generated `user_id`.
    #[instrument(skip_all)]
    pub async fn execute_insert(&mut self, insert: &Insert) -> Result<i64, StoreError> {
        let mut qb = insert.build(self.table())?;
        let mut tx = self.conn_mut().begin().await.map_err(StoreError::from_sqlx)?;
        let result = qb.build_query_scalar::<i64>().fetch_one(&mut *tx).await;
        match result {
            Ok(id) => {
                tx.commit().await.map_err(StoreError::from_sqlx)?;
                info!(table = %self.table(), user_id = id, "row inserted");
                Ok(id)
            }
            Err(e) => {
                rollback(tx, "insert").await;
                warn!(error = %e, "insert failed");
                Err(StoreError::from_sqlx(e))
            }
        }
    }

    #[instrument(skip_all)]
    pub async fn execute_update(&mut self, update: &Update) -> Result<u64, StoreError> {
        let mut qb = update.build(self.table())?;
        let mut tx = self.conn_mut().begin().await.map_err(StoreError::from_sqlx)?;
        let result = qb.build().execute(&mut *tx).await;
        match result {
            Ok(done) => {
                tx.commit().await.map_err(StoreError::from_sqlx)?;
                info!(rows = done.rows_affected(), "rows updated");
                Ok(done.rows_affected())
            }
            Err(e) => {
                rollback(tx, "update").await;
                warn!(error = %e, "update failed");
                Err(StoreError::from_sqlx(e))
            }
        }
    }

    #[instrument(skip_all)]
    pub async fn execute_delete(&mut self, delete: &Delete) -> Result<u64, StoreError> {
        let mut qb = delete.build(self.table());
        let mut tx = self.conn_mut().begin().await.map_err(StoreError::from_sqlx)?;
        let result = qb.build().execute(&mut *tx).await;
        match result {
            Ok(done) => {
                tx.commit().await.map_err(StoreError::from_sqlx)?;
                info!(rows = done.rows_affected(), "rows deleted");
                Ok(done.rows_affected())
            }
            Err(e) => {
                rollback(tx, "delete").await;
                warn!(error = %e, "delete failed");
                Err(StoreError::from_sqlx(e))
            }
        }
    }
}
