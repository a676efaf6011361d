/// SQLite implementation of the catalog store using runtime queries
use crate::{
    catalog::{duplicate_name, CatalogStore, FilePatch, FileRecord, FileStatus, NewFileRecord},
    db::is_unique_violation,
    error::{VaultError, VaultResult},
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

const COLUMNS: &str = "id, name, url, size, status, active, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteCatalog {
    db: SqlitePool,
}

impl SqliteCatalog {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    fn from_row(row: &SqliteRow) -> VaultResult<FileRecord> {
        let status: String = row.get("status");

        Ok(FileRecord {
            id: row.get("id"),
            name: row.get("name"),
            url: row.get("url"),
            size: row.get("size"),
            status: FileStatus::parse(&status)?,
            active: row.get("active"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    fn map_write_error(e: sqlx::Error, name: &str) -> VaultError {
        if is_unique_violation(&e) {
            duplicate_name(name)
        } else {
            VaultError::PersistenceFault(e)
        }
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalog {
    async fn find_by_name(&self, name: &str) -> VaultResult<Option<FileRecord>> {
        let row = sqlx::query(&format!("SELECT {} FROM file WHERE name = ?1", COLUMNS))
            .bind(name)
            .fetch_optional(&self.db)
            .await?;

        row.as_ref().map(Self::from_row).transpose()
    }

    async fn find_by_id(&self, id: i64, active_only: bool) -> VaultResult<Option<FileRecord>> {
        let sql = if active_only {
            format!("SELECT {} FROM file WHERE id = ?1 AND active = 1", COLUMNS)
        } else {
            format!("SELECT {} FROM file WHERE id = ?1", COLUMNS)
        };

        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.db).await?;

        row.as_ref().map(Self::from_row).transpose()
    }

    async fn create(&self, fields: NewFileRecord) -> VaultResult<FileRecord> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO file (name, url, size, status, active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&fields.name)
        .bind(&fields.url)
        .bind(fields.size)
        .bind(fields.status.as_str())
        .bind(fields.active)
        .bind(now)
        .bind(now)
        .execute(&self.db)
        .await
        .map_err(|e| Self::map_write_error(e, &fields.name))?;

        Ok(FileRecord {
            id: result.last_insert_rowid(),
            name: fields.name,
            url: fields.url,
            size: fields.size,
            status: fields.status,
            active: fields.active,
            created_at: now,
            updated_at: now,
        })
    }

    async fn save(&self, record: &FileRecord) -> VaultResult<()> {
        let result = sqlx::query(
            "UPDATE file SET name = ?1, status = ?2, active = ?3, updated_at = ?4 WHERE id = ?5",
        )
        .bind(&record.name)
        .bind(record.status.as_str())
        .bind(record.active)
        .bind(Utc::now())
        .bind(record.id)
        .execute(&self.db)
        .await
        .map_err(|e| Self::map_write_error(e, &record.name))?;

        if result.rows_affected() == 0 {
            return Err(VaultError::NotFound(format!("File with ID: {} not found", record.id)));
        }

        Ok(())
    }

    async fn update(&self, id: i64, patch: FilePatch) -> VaultResult<()> {
        let name = patch.name.clone().unwrap_or_default();

        let result = sqlx::query(
            "UPDATE file
             SET name = COALESCE(?1, name),
                 status = COALESCE(?2, status),
                 active = COALESCE(?3, active),
                 updated_at = ?4
             WHERE id = ?5",
        )
        .bind(&patch.name)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.active)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.db)
        .await
        .map_err(|e| Self::map_write_error(e, &name))?;

        if result.rows_affected() == 0 {
            return Err(VaultError::NotFound(format!("File with ID: {} not found", id)));
        }

        Ok(())
    }

    async fn paginate(&self, limit: i64, offset: i64) -> VaultResult<(Vec<FileRecord>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM file WHERE active = 1")
            .fetch_one(&self.db)
            .await?;

        let rows = sqlx::query(&format!(
            "SELECT {} FROM file WHERE active = 1
             ORDER BY created_at DESC, id DESC
             LIMIT ?1 OFFSET ?2",
            COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        let records = rows
            .iter()
            .map(Self::from_row)
            .collect::<VaultResult<Vec<_>>>()?;

        Ok((records, total))
    }
}
