use crate::config::media::MediaConfig;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::require_role;
use crate::middleware::AuthUser;
use crate::models::user::ROLE_ADMIN;
use crate::models::{CourseModel, Lecture};
use crate::response::ApiResponse;
use crate::services::course::CourseService;
use crate::services::media::MediaStore;
use crate::utils::multipart::MultipartForm;
use axum::{
    extract::{Multipart, Path, Query},
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::user::MediaRefResponse;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCourseRequest {
    /// Course title (max 100 characters)
    #[validate(length(min = 1, max = 100))]
    pub title: Option<String>,
    /// Course description (max 500 characters)
    #[validate(length(min = 1, max = 500))]
    pub description: Option<String>,
    /// Category label
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoveLectureQuery {
    pub course_id: Option<String>,
    pub lecture_id: Option<String>,
}

/// Catalog view of a course: everything but the lecture bodies, which are
/// large and have their own endpoint.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub category: String,
    pub created_by: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<MediaRefResponse>,
    pub number_of_lectures: i32,
    pub created_at: String,
}

impl From<CourseModel> for CourseResponse {
    fn from(c: CourseModel) -> Self {
        let thumbnail = match (c.thumbnail_public_id, c.thumbnail_url) {
            (Some(public_id), Some(url)) => Some(MediaRefResponse { public_id, url }),
            _ => None,
        };
        Self {
            id: c.id,
            title: c.title,
            description: c.description,
            category: c.category,
            created_by: c.created_by,
            thumbnail,
            number_of_lectures: c.number_of_lectures,
            created_at: c.created_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LectureResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub media: MediaRefResponse,
}

impl From<Lecture> for LectureResponse {
    fn from(l: Lecture) -> Self {
        Self {
            id: l.id,
            title: l.title,
            description: l.description,
            media: MediaRefResponse {
                public_id: l.media.public_id,
                url: l.media.url,
            },
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/courses",
    responses(
        (status = 200, description = "All courses, lecture bodies excluded", body = Vec<CourseResponse>),
    ),
    tag = "courses"
)]
pub async fn list_courses(
    Extension(db): Extension<DatabaseConnection>,
) -> AppResult<impl IntoResponse> {
    let service = CourseService::new(db);
    let courses = service.list().await?;
    let response: Vec<CourseResponse> = courses.into_iter().map(CourseResponse::from).collect();
    Ok(ApiResponse::with_message(response, "All courses"))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}",
    security(("session_token" = [])),
    params(("id" = i32, Path, description = "Course id")),
    responses(
        (status = 200, description = "Lectures of the course", body = Vec<LectureResponse>),
        (status = 401, description = "Unauthenticated", body = AppError),
        (status = 404, description = "Course not found", body = AppError),
    ),
    tag = "courses"
)]
pub async fn get_lectures(
    Extension(db): Extension<DatabaseConnection>,
    _auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = CourseService::new(db);
    let course = service.get_by_id(id).await?;

    let lectures: Vec<LectureResponse> = course
        .lectures
        .as_slice()
        .iter()
        .cloned()
        .map(LectureResponse::from)
        .collect();

    Ok(ApiResponse::with_message(
        lectures,
        "Course lectures fetched successfully!",
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses",
    security(("session_token" = [])),
    responses(
        (status = 200, description = "Course created with an empty lecture list", body = CourseResponse),
        (status = 400, description = "Missing fields or bad thumbnail", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "courses"
)]
pub async fn create_course(
    Extension(db): Extension<DatabaseConnection>,
    Extension(media_config): Extension<MediaConfig>,
    auth_user: AuthUser,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    require_role(&auth_user, &[ROLE_ADMIN])?;

    let form = MultipartForm::read(multipart).await?;

    let (title, description, category) = match (
        form.field("title"),
        form.field("description"),
        form.field("category"),
    ) {
        (Some(t), Some(d), Some(c)) => (t, d, c),
        _ => return Err(AppError::Validation("All fields are required".to_string())),
    };

    let thumbnail = match form.file("thumbnail") {
        Some(file) => Some(
            MediaStore::store(&media_config, &file.data, &file.filename, "thumbnails").await?,
        ),
        None => None,
    };

    let service = CourseService::new(db);
    let course = match service
        .create(title, description, category, auth_user.user_id, thumbnail.clone())
        .await
    {
        Ok(course) => course,
        Err(e) => {
            if let Some(asset) = thumbnail {
                if let Err(del) = MediaStore::delete(&media_config, &asset.public_id).await {
                    tracing::warn!("Failed to remove orphaned thumbnail: {del}");
                }
            }
            return Err(e);
        }
    };

    Ok(ApiResponse::with_message(
        CourseResponse::from(course),
        "Course created successfully",
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/courses/{id}",
    security(("session_token" = [])),
    params(("id" = i32, Path, description = "Course id")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Course updated", body = CourseResponse),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Course not found", body = AppError),
    ),
    tag = "courses"
)]
pub async fn update_course(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCourseRequest>,
) -> AppResult<impl IntoResponse> {
    require_role(&auth_user, &[ROLE_ADMIN])?;

    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = CourseService::new(db);
    let course = service
        .update(
            id,
            payload.title.as_deref(),
            payload.description.as_deref(),
            payload.category.as_deref(),
        )
        .await?;

    Ok(ApiResponse::with_message(
        CourseResponse::from(course),
        "Course updated successfully",
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}",
    security(("session_token" = [])),
    params(("id" = i32, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course deleted", body = String),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Course not found", body = AppError),
    ),
    tag = "courses"
)]
pub async fn delete_course(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    require_role(&auth_user, &[ROLE_ADMIN])?;

    let service = CourseService::new(db);
    service.delete(id).await?;

    Ok(ApiResponse::message("Course deleted successfully"))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}",
    security(("session_token" = [])),
    params(("id" = i32, Path, description = "Course id")),
    responses(
        (status = 200, description = "Lecture appended, count updated", body = CourseResponse),
        (status = 400, description = "Missing fields or bad media", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Course not found", body = AppError),
    ),
    tag = "courses"
)]
pub async fn add_lecture(
    Extension(db): Extension<DatabaseConnection>,
    Extension(media_config): Extension<MediaConfig>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    require_role(&auth_user, &[ROLE_ADMIN])?;

    let form = MultipartForm::read(multipart).await?;

    let (title, description) = match (form.field("title"), form.field("description")) {
        (Some(t), Some(d)) => (t, d),
        _ => return Err(AppError::Validation("All fields are required".to_string())),
    };

    let file = form
        .file("lecture")
        .ok_or_else(|| AppError::Validation("Lecture file is required".to_string()))?;

    let media =
        MediaStore::store(&media_config, &file.data, &file.filename, "lectures").await?;

    let service = CourseService::new(db);
    let course = match service.add_lecture(id, title, description, media.clone()).await {
        Ok(course) => course,
        Err(e) => {
            if let Err(del) = MediaStore::delete(&media_config, &media.public_id).await {
                tracing::warn!("Failed to remove orphaned lecture media: {del}");
            }
            return Err(e);
        }
    };

    Ok(ApiResponse::with_message(
        CourseResponse::from(course),
        "Lecture added to course successfully",
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/courses/lectures",
    security(("session_token" = [])),
    params(
        ("courseId" = String, Query, description = "Course id"),
        ("lectureId" = String, Query, description = "Lecture id"),
    ),
    responses(
        (status = 200, description = "Lecture removed, count updated", body = CourseResponse),
        (status = 400, description = "Missing or malformed ids", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Course or lecture not found", body = AppError),
    ),
    tag = "courses"
)]
pub async fn remove_lecture(
    Extension(db): Extension<DatabaseConnection>,
    Extension(media_config): Extension<MediaConfig>,
    auth_user: AuthUser,
    Query(query): Query<RemoveLectureQuery>,
) -> AppResult<impl IntoResponse> {
    require_role(&auth_user, &[ROLE_ADMIN])?;

    let course_id: i32 = query
        .course_id
        .as_deref()
        .ok_or_else(|| AppError::Validation("Course ID is required".to_string()))?
        .parse()
        .map_err(|_| AppError::Validation("Invalid course id".to_string()))?;

    let lecture_id: Uuid = query
        .lecture_id
        .as_deref()
        .ok_or_else(|| AppError::Validation("Lecture ID is required".to_string()))?
        .parse()
        .map_err(|_| AppError::Validation("Invalid lecture id".to_string()))?;

    let service = CourseService::new(db);
    let (course, removed) = service.remove_lecture(course_id, lecture_id).await?;

    if let Err(e) = MediaStore::delete(&media_config, &removed.media.public_id).await {
        tracing::warn!(
            "Failed to delete media for removed lecture '{}': {}",
            removed.media.public_id,
            e
        );
    }

    Ok(ApiResponse::with_message(
        CourseResponse::from(course),
        "Lecture removed successfully",
    ))
}
