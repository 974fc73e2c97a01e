//! PostgreSQL repositories over a shared `PgPool`.

use super::{
    AssemblyRepository, ComponentRepository, ImageRepository, PersistenceError,
    PersistenceResult, PlanRepository,
};
use crate::models::{Assembly, AssemblyUpdate, Image, NewStackComponent, Plan, StackComponent};
use crate::state_machine::AssemblyState;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

const SCHEMA_SQL: &str = include_str!("../../migrations/0001_create_deployer_tables.sql");

const ASSEMBLY_COLUMNS: &str =
    "id, uuid, plan_id, name, status, application_uri, image_id, created_at, updated_at";

const COMPONENT_COLUMNS: &str =
    "id, assembly_id, name, component_type, description, resource_uri, stack_id, created_at";

/// Raw assembly row; status is stored as its wire string
#[derive(Debug, FromRow)]
struct AssemblyRow {
    id: i64,
    uuid: Uuid,
    plan_id: i64,
    name: String,
    status: String,
    application_uri: Option<String>,
    image_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AssemblyRow> for Assembly {
    type Error = PersistenceError;

    fn try_from(row: AssemblyRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<AssemblyState>()
            .map_err(|reason| PersistenceError::InvalidRecord { reason })?;

        Ok(Assembly {
            id: row.id,
            uuid: row.uuid,
            plan_id: row.plan_id,
            name: row.name,
            status,
            application_uri: row.application_uri,
            image_id: row.image_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct StackComponentRow {
    id: i64,
    assembly_id: i64,
    name: String,
    component_type: String,
    description: String,
    resource_uri: String,
    stack_id: String,
    created_at: DateTime<Utc>,
}

impl From<StackComponentRow> for StackComponent {
    fn from(row: StackComponentRow) -> Self {
        StackComponent {
            id: row.id,
            assembly_id: row.assembly_id,
            name: row.name,
            component_type: row.component_type,
            description: row.description,
            resource_uri: row.resource_uri,
            stack_id: row.stack_id,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ImageRow {
    id: i64,
    uuid: Uuid,
    name: String,
    docker_image_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ImageRow> for Image {
    fn from(row: ImageRow) -> Self {
        Image {
            id: row.id,
            uuid: row.uuid,
            name: row.name,
            docker_image_name: row.docker_image_name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct PlanRow {
    id: i64,
    uuid: Uuid,
    name: String,
}

/// Repository implementation backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgDeployerStore {
    pool: PgPool,
}

impl PgDeployerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a pool sized from the database settings
    pub async fn connect(url: &str, max_connections: u32) -> PersistenceResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        info!(max_connections, "🗄️ Deployer database pool connected");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the deployer tables when they do not exist yet
    pub async fn ensure_schema(&self) -> PersistenceResult<()> {
        sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await?;
        debug!("Deployer schema ensured");
        Ok(())
    }
}

/// Translate constraint failures into integrity violations
fn map_write_error(err: sqlx::Error) -> PersistenceError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() || db_err.is_foreign_key_violation() {
            return PersistenceError::integrity_violation(db_err.message().to_string());
        }
    }
    PersistenceError::Database(err)
}

#[async_trait]
impl AssemblyRepository for PgDeployerStore {
    async fn get_by_id(&self, id: i64) -> PersistenceResult<Assembly> {
        let sql = format!("SELECT {ASSEMBLY_COLUMNS} FROM deployer_assemblies WHERE id = $1");
        sqlx::query_as::<_, AssemblyRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PersistenceError::not_found("assembly", id))?
            .try_into()
    }

    async fn get_by_uuid(&self, uuid: Uuid) -> PersistenceResult<Assembly> {
        let sql = format!("SELECT {ASSEMBLY_COLUMNS} FROM deployer_assemblies WHERE uuid = $1");
        sqlx::query_as::<_, AssemblyRow>(&sql)
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PersistenceError::InvalidRecord {
                reason: format!("no assembly with uuid {uuid}"),
            })?
            .try_into()
    }

    async fn update_and_save(
        &self,
        id: i64,
        update: &AssemblyUpdate,
    ) -> PersistenceResult<Assembly> {
        let sql = format!(
            r#"
            UPDATE deployer_assemblies
            SET status = COALESCE($2, status),
                application_uri = COALESCE($3, application_uri),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ASSEMBLY_COLUMNS}
            "#
        );
        sqlx::query_as::<_, AssemblyRow>(&sql)
            .bind(id)
            .bind(update.status.map(|s| s.as_str()))
            .bind(update.application_uri.as_deref())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PersistenceError::not_found("assembly", id))?
            .try_into()
    }

    async fn destroy(&self, id: i64) -> PersistenceResult<()> {
        let result = sqlx::query("DELETE FROM deployer_assemblies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("assembly", id));
        }
        Ok(())
    }

    async fn list_by_plan(&self, plan_id: i64) -> PersistenceResult<Vec<Assembly>> {
        let sql = format!(
            "SELECT {ASSEMBLY_COLUMNS} FROM deployer_assemblies \
             WHERE plan_id = $1 ORDER BY created_at, id"
        );
        sqlx::query_as::<_, AssemblyRow>(&sql)
            .bind(plan_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Assembly::try_from)
            .collect()
    }

    async fn get_earlier(
        &self,
        plan_id: i64,
        status: AssemblyState,
        created_before: DateTime<Utc>,
    ) -> PersistenceResult<Vec<Assembly>> {
        let sql = format!(
            "SELECT {ASSEMBLY_COLUMNS} FROM deployer_assemblies \
             WHERE plan_id = $1 AND status = $2 AND created_at < $3 \
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, AssemblyRow>(&sql)
            .bind(plan_id)
            .bind(status.as_str())
            .bind(created_before)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Assembly::try_from)
            .collect()
    }
}

#[async_trait]
impl ComponentRepository for PgDeployerStore {
    async fn find_stack_component(
        &self,
        assembly_id: i64,
    ) -> PersistenceResult<Option<StackComponent>> {
        let sql = format!(
            "SELECT {COMPONENT_COLUMNS} FROM deployer_stack_components WHERE assembly_id = $1"
        );
        let row = sqlx::query_as::<_, StackComponentRow>(&sql)
            .bind(assembly_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(StackComponent::from))
    }

    async fn create_stack_component(
        &self,
        component: NewStackComponent,
    ) -> PersistenceResult<StackComponent> {
        let sql = format!(
            r#"
            INSERT INTO deployer_stack_components
                (assembly_id, name, component_type, description, resource_uri, stack_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            RETURNING {COMPONENT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, StackComponentRow>(&sql)
            .bind(component.assembly_id)
            .bind(&component.name)
            .bind(&component.component_type)
            .bind(&component.description)
            .bind(&component.resource_uri)
            .bind(&component.stack_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(row.into())
    }
}

#[async_trait]
impl ImageRepository for PgDeployerStore {
    async fn get_by_id(&self, id: i64) -> PersistenceResult<Image> {
        let row = sqlx::query_as::<_, ImageRow>(
            "SELECT id, uuid, name, docker_image_name, created_at FROM deployer_images WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| PersistenceError::not_found("image", id))?;
        Ok(row.into())
    }

    async fn destroy(&self, id: i64) -> PersistenceResult<()> {
        let result = sqlx::query("DELETE FROM deployer_images WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("image", id));
        }
        Ok(())
    }
}

#[async_trait]
impl PlanRepository for PgDeployerStore {
    async fn get_by_id(&self, id: i64) -> PersistenceResult<Plan> {
        let row = sqlx::query_as::<_, PlanRow>(
            "SELECT id, uuid, name FROM deployer_plans WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| PersistenceError::not_found("plan", id))?;

        Ok(Plan {
            id: row.id,
            uuid: row.uuid,
            name: row.name,
        })
    }

    async fn destroy(&self, id: i64) -> PersistenceResult<()> {
        let result = sqlx::query("DELETE FROM deployer_plans WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("plan", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str) -> AssemblyRow {
        AssemblyRow {
            id: 7,
            uuid: Uuid::new_v4(),
            plan_id: 1,
            name: "shop".to_string(),
            status: status.to_string(),
            application_uri: None,
            image_id: Some(3),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_status_parsing() {
        let assembly = Assembly::try_from(row("DEPLOYING")).unwrap();
        assert_eq!(assembly.status, AssemblyState::Deploying);
        assert_eq!(assembly.image_id, Some(3));

        let invalid = Assembly::try_from(row("deploying"));
        assert!(matches!(invalid, Err(PersistenceError::InvalidRecord { .. })));
    }

    #[test]
    fn test_schema_declares_every_table() {
        for table in [
            "deployer_plans",
            "deployer_images",
            "deployer_assemblies",
            "deployer_stack_components",
        ] {
            assert!(SCHEMA_SQL.contains(table), "missing {table}");
        }
    }
}
