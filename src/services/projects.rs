use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::oneshot;

use super::{repository_error, RequestHandler, Service, ServiceError};
use crate::{
    models::projects::{NewProject, Project, ProjectStatus},
    repositories::projects::ProjectRepository,
};

pub enum ProjectRequest {
    ListProjects {
        status: Option<String>,
        response: oneshot::Sender<Result<Vec<Project>, ServiceError>>,
    },
    GetProject {
        id: String,
        response: oneshot::Sender<Result<Project, ServiceError>>,
    },
    CreateProject {
        project: NewProject,
        response: oneshot::Sender<Result<Project, ServiceError>>,
    },
    CloseProject {
        id: String,
        response: oneshot::Sender<Result<Project, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct ProjectRequestHandler {
    repository: ProjectRepository,
    default_earnings_cap_bps: i64,
}

impl ProjectRequestHandler {
    pub fn new(sql_conn: PgPool, default_earnings_cap_bps: i64) -> Self {
        ProjectRequestHandler {
            repository: ProjectRepository::new(sql_conn),
            default_earnings_cap_bps,
        }
    }

    async fn list_projects(&self, status: Option<String>) -> Result<Vec<Project>, ServiceError> {
        if let Some(status) = status.as_deref() {
            if ProjectStatus::parse(status).is_none() {
                return Err(ServiceError::Validation(format!(
                    "Unknown project status: {}",
                    status
                )));
            }
        }

        self.repository
            .list_projects(status.as_deref())
            .await
            .map_err(repository_error)
    }

    async fn get_project(&self, id: &str) -> Result<Project, ServiceError> {
        self.repository
            .get_project(id)
            .await
            .map_err(repository_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Project {}", id)))
    }

    async fn create_project(&self, project: NewProject) -> Result<Project, ServiceError> {
        project.validate().map_err(ServiceError::Validation)?;
        let earnings_cap_bps = project
            .earnings_cap_bps
            .unwrap_or(self.default_earnings_cap_bps);

        let project = self
            .repository
            .insert_project(&project, earnings_cap_bps)
            .await
            .map_err(repository_error)?;

        log::info!(
            "Created project {} ({}), goal={} roi={}bps cap={}bps.",
            project.id,
            project.name,
            project.goal_amount,
            project.daily_roi_bps,
            project.earnings_cap_bps
        );
        Ok(project)
    }

    async fn close_project(&self, id: &str) -> Result<Project, ServiceError> {
        let project = self
            .repository
            .close_project(id)
            .await
            .map_err(repository_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Project {}", id)))?;

        log::info!("Closed project {}.", project.id);
        Ok(project)
    }
}

#[async_trait]
impl RequestHandler<ProjectRequest> for ProjectRequestHandler {
    async fn handle_request(&self, request: ProjectRequest) {
        match request {
            ProjectRequest::ListProjects { status, response } => {
                let projects = self.list_projects(status).await;
                let _ = response.send(projects);
            }
            ProjectRequest::GetProject { id, response } => {
                let project = self.get_project(&id).await;
                let _ = response.send(project);
            }
            ProjectRequest::CreateProject { project, response } => {
                let project = self.create_project(project).await;
                let _ = response.send(project);
            }
            ProjectRequest::CloseProject { id, response } => {
                let project = self.close_project(&id).await;
                let _ = response.send(project);
            }
        }
    }
}

pub struct ProjectService;

impl ProjectService {
    pub fn new() -> Self {
        ProjectService {}
    }
}

#[async_trait]
impl Service<ProjectRequest, ProjectRequestHandler> for ProjectService {}
