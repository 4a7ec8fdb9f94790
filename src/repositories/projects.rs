use sqlx::{PgConnection, PgPool};

use crate::models::{
    new_id,
    projects::{NewProject, Project, ProjectStatus},
};

#[derive(Clone)]
pub struct ProjectRepository {
    conn: PgPool,
}

impl ProjectRepository {
    pub fn new(conn: PgPool) -> Self {
        Self { conn }
    }

    pub async fn list_projects(
        &self,
        status: Option<&str>,
    ) -> Result<Vec<Project>, anyhow::Error> {
        let projects = sqlx::query_as::<_, Project>(
            r#"SELECT * FROM projects
            WHERE $1::TEXT IS NULL OR status = $1
            ORDER BY created_at DESC"#,
        )
        .bind(status)
        .fetch_all(&self.conn)
        .await?;

        Ok(projects)
    }

    pub async fn get_project(&self, id: &str) -> Result<Option<Project>, anyhow::Error> {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.conn)
            .await?;

        Ok(project)
    }

    pub async fn insert_project(
        &self,
        new: &NewProject,
        earnings_cap_bps: i64,
    ) -> Result<Project, anyhow::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"INSERT INTO projects
            (id, name, description, goal_amount, min_investment, daily_roi_bps, earnings_cap_bps, compounding, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *"#,
        )
        .bind(new_id())
        .bind(new.name.trim())
        .bind(&new.description)
        .bind(new.goal_amount)
        .bind(new.min_investment)
        .bind(new.daily_roi_bps)
        .bind(earnings_cap_bps)
        .bind(new.compounding)
        .bind(ProjectStatus::Active.as_str())
        .fetch_one(&self.conn)
        .await?;

        Ok(project)
    }

    pub async fn close_project(&self, id: &str) -> Result<Option<Project>, anyhow::Error> {
        let project = sqlx::query_as::<_, Project>(
            "UPDATE projects SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
        )
        .bind(ProjectStatus::Closed.as_str())
        .bind(id)
        .fetch_optional(&self.conn)
        .await?;

        Ok(project)
    }
}

pub async fn fetch_project_for_update(
    conn: &mut PgConnection,
    id: &str,
) -> Result<Option<Project>, anyhow::Error> {
    let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(project)
}

pub async fn update_funding(
    conn: &mut PgConnection,
    id: &str,
    funded_amount: i64,
    status: ProjectStatus,
) -> Result<(), anyhow::Error> {
    sqlx::query(
        "UPDATE projects SET funded_amount = $1, status = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $3",
    )
    .bind(funded_amount)
    .bind(status.as_str())
    .bind(id)
    .execute(conn)
    .await?;

    Ok(())
}
