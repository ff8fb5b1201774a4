use axum::{
    Json,
    extract::{Path as AxumPath, State},
};
use tracing::error;

use crate::{
    lms::{Course, Module, ModuleItem},
    web::{ApiResult, AppState, browse_error},
};

pub async fn list_courses(State(state): State<AppState>) -> ApiResult<Vec<Course>> {
    let courses = state.lms().list_courses().await.map_err(|err| {
        error!(?err, "failed to list courses");
        browse_error(&err)
    })?;
    Ok(Json(courses))
}

pub async fn list_modules(
    State(state): State<AppState>,
    AxumPath(course_id): AxumPath<u64>,
) -> ApiResult<Vec<Module>> {
    let modules = state.lms().list_modules(course_id).await.map_err(|err| {
        error!(?err, course_id, "failed to list modules");
        browse_error(&err)
    })?;
    Ok(Json(modules))
}

pub async fn list_items(
    State(state): State<AppState>,
    AxumPath((course_id, module_id)): AxumPath<(u64, u64)>,
) -> ApiResult<Vec<ModuleItem>> {
    let items = state
        .lms()
        .list_items(course_id, module_id)
        .await
        .map_err(|err| {
            error!(?err, course_id, module_id, "failed to list module items");
            browse_error(&err)
        })?;
    Ok(Json(items))
}
