use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::core::error::{handle_db_error, AppError, Result};
use crate::features::file_types::dtos::{
    CleanupReportDto, CreateFileTypeDto, FileTypeQueryParams, MoveDirection, UpdateFileTypeDto,
};
use crate::features::file_types::models::{plan_file_type_merges, FileType};

const FILE_TYPE_COLUMNS: &str = "id, name, label, code, position, groups";

pub struct FileTypeService {
    pool: PgPool,
}

impl FileTypeService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List file types ordered by `(code, order)`. With groups given, only
    /// file types belonging to every one of them.
    pub async fn list(&self, params: &FileTypeQueryParams) -> Result<Vec<FileType>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM file_types WHERE 1=1", FILE_TYPE_COLUMNS));

        if let Some(code) = &params.code {
            qb.push(" AND code = ").push_bind(code.clone());
        }

        let groups = params.groups();
        if !groups.is_empty() {
            qb.push(" AND groups @> ").push_bind(groups);
        }

        qb.push(" ORDER BY code, position, id");

        let file_types = qb
            .build_query_as::<FileType>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list file types: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(file_types)
    }

    pub async fn get(&self, id: i64) -> Result<FileType> {
        let sql = format!("SELECT {} FROM file_types WHERE id = $1", FILE_TYPE_COLUMNS);

        sqlx::query_as::<_, FileType>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("File type with id {} not found", id)))
    }

    /// Append a new file type at the end of the global ordering
    pub async fn create(&self, dto: CreateFileTypeDto) -> Result<FileType> {
        let sql = format!(
            r#"
            INSERT INTO file_types (name, label, code, position, groups)
            VALUES ($1, $2, $3, (SELECT COALESCE(MAX(position) + 1, 0) FROM file_types), $4)
            RETURNING {}
            "#,
            FILE_TYPE_COLUMNS
        );

        let file_type = sqlx::query_as::<_, FileType>(&sql)
            .bind(&dto.name)
            .bind(&dto.label)
            .bind(&dto.code)
            .bind(&dto.group)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                handle_db_error(
                    e,
                    &format!(
                        "File type '{}' already exists for code '{}'",
                        dto.name, dto.code
                    ),
                )
            })?;

        tracing::info!("Created file type {} ({})", file_type.id, file_type.label);
        Ok(file_type)
    }

    pub async fn update(&self, id: i64, dto: UpdateFileTypeDto) -> Result<FileType> {
        let sql = format!(
            r#"
            UPDATE file_types SET
                name = COALESCE($2, name),
                label = COALESCE($3, label),
                code = COALESCE($4, code),
                groups = COALESCE($5, groups)
            WHERE id = $1
            RETURNING {}
            "#,
            FILE_TYPE_COLUMNS
        );

        sqlx::query_as::<_, FileType>(&sql)
            .bind(id)
            .bind(&dto.name)
            .bind(&dto.label)
            .bind(&dto.code)
            .bind(&dto.group)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| handle_db_error(e, "A file type with this name and code already exists"))?
            .ok_or_else(|| AppError::NotFound(format!("File type with id {} not found", id)))
    }

    /// Delete a file type. Attachments tagged with it are deleted too.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM file_types WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "File type with id {} not found",
                id
            )));
        }

        tracing::info!("Deleted file type {}", id);
        Ok(())
    }

    /// First file type with `code`, creating an unnamed one when none exists
    pub async fn get_or_create_by_code(&self, code: &str) -> Result<FileType> {
        let select = format!(
            "SELECT {} FROM file_types WHERE code = $1 ORDER BY position, id LIMIT 1",
            FILE_TYPE_COLUMNS
        );

        if let Some(existing) = sqlx::query_as::<_, FileType>(&select)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?
        {
            return Ok(existing);
        }

        sqlx::query(
            r#"
            INSERT INTO file_types (name, label, code, position)
            VALUES ('', '', $1, (SELECT COALESCE(MAX(position) + 1, 0) FROM file_types))
            ON CONFLICT (name, code) DO NOTHING
            "#,
        )
        .bind(code)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Created file type for code '{}'", code);

        sqlx::query_as::<_, FileType>(&select)
            .bind(code)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)
    }

    /// Swap a file type with its neighbour in the global ordering
    pub async fn move_file_type(&self, id: i64, direction: MoveDirection) -> Result<FileType> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, FileType>(&format!(
            "SELECT {} FROM file_types WHERE id = $1 FOR UPDATE",
            FILE_TYPE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("File type with id {} not found", id)))?;

        let neighbour_sql = match direction {
            MoveDirection::Up => format!(
                "SELECT {} FROM file_types WHERE position < $1 ORDER BY position DESC LIMIT 1 FOR UPDATE",
                FILE_TYPE_COLUMNS
            ),
            MoveDirection::Down => format!(
                "SELECT {} FROM file_types WHERE position > $1 ORDER BY position ASC LIMIT 1 FOR UPDATE",
                FILE_TYPE_COLUMNS
            ),
        };

        let Some(neighbour) = sqlx::query_as::<_, FileType>(&neighbour_sql)
            .bind(current.position)
            .fetch_optional(&mut *tx)
            .await?
        else {
            // already first/last
            tx.commit().await?;
            return Ok(current);
        };

        sqlx::query("UPDATE file_types SET position = $2 WHERE id = $1")
            .bind(current.id)
            .bind(neighbour.position)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE file_types SET position = $2 WHERE id = $1")
            .bind(neighbour.id)
            .bind(current.position)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(FileType {
            position: neighbour.position,
            ..current
        })
    }

    /// Merge file types sharing a label or name into the lowest id
    pub async fn cleanup_duplicates(&self) -> Result<CleanupReportDto> {
        let mut tx = self.pool.begin().await?;

        let file_types = sqlx::query_as::<_, FileType>(&format!(
            "SELECT {} FROM file_types ORDER BY id FOR UPDATE",
            FILE_TYPE_COLUMNS
        ))
        .fetch_all(&mut *tx)
        .await?;

        let plans = plan_file_type_merges(&file_types);
        let mut removed = 0;

        for plan in &plans {
            sqlx::query("UPDATE file_types SET groups = $2 WHERE id = $1")
                .bind(plan.primary_id)
                .bind(&plan.groups)
                .execute(&mut *tx)
                .await?;

            sqlx::query("UPDATE attachments SET file_type_id = $1 WHERE file_type_id = ANY($2)")
                .bind(plan.primary_id)
                .bind(&plan.duplicate_ids)
                .execute(&mut *tx)
                .await?;

            let deleted = sqlx::query("DELETE FROM file_types WHERE id = ANY($1)")
                .bind(&plan.duplicate_ids)
                .execute(&mut *tx)
                .await?;
            removed += deleted.rows_affected() as usize;
        }

        tx.commit().await?;

        tracing::info!(
            "File type cleanup merged {} group(s), removed {} duplicate(s)",
            plans.len(),
            removed
        );

        Ok(CleanupReportDto {
            merged: plans,
            removed,
        })
    }
}
