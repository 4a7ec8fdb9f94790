use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    Json,
};

use super::{request, AppState};
use crate::models::projects::{NewProject, Project, ProjectFilter};
use crate::services::{projects::ProjectRequest, ServiceError};

pub async fn list_projects(
    State(state): State<AppState>,
    query: Result<Query<ProjectFilter>, QueryRejection>,
) -> Result<Json<Vec<Project>>, ServiceError> {
    let Query(filter) = query?;
    let projects = request(&state.channels.projects, "ProjectService", |response| {
        ProjectRequest::ListProjects {
            status: filter.status,
            response,
        }
    })
    .await?;

    Ok(Json(projects))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Project>, ServiceError> {
    let project = request(&state.channels.projects, "ProjectService", |response| {
        ProjectRequest::GetProject { id, response }
    })
    .await?;

    Ok(Json(project))
}

pub async fn create_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<NewProject>, JsonRejection>,
) -> Result<(StatusCode, Json<Project>), ServiceError> {
    state.authorize_admin(&headers)?;
    let Json(project) = payload?;

    let project = request(&state.channels.projects, "ProjectService", |response| {
        ProjectRequest::CreateProject { project, response }
    })
    .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn close_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Project>, ServiceError> {
    state.authorize_admin(&headers)?;

    let project = request(&state.channels.projects, "ProjectService", |response| {
        ProjectRequest::CloseProject { id, response }
    })
    .await?;

    Ok(Json(project))
}
