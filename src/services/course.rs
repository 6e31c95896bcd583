use crate::{
    error::{AppError, AppResult},
    models::{course, Course, CourseModel, Lecture, MediaRef},
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder};
use uuid::Uuid;

pub struct CourseService {
    db: DatabaseConnection,
}

impl CourseService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Every course, oldest first. Lecture bodies ride along in the model;
    /// the list endpoint's DTO leaves them out to bound response size.
    pub async fn list(&self) -> AppResult<Vec<CourseModel>> {
        let courses = Course::find()
            .order_by_asc(course::Column::Id)
            .all(&self.db)
            .await?;
        Ok(courses)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<CourseModel> {
        Course::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn create(
        &self,
        title: &str,
        description: &str,
        category: &str,
        created_by: i32,
        thumbnail: Option<MediaRef>,
    ) -> AppResult<CourseModel> {
        let now = chrono::Utc::now().naive_utc();
        let (thumb_id, thumb_url) = match thumbnail {
            Some(t) => (Some(t.public_id), Some(t.url)),
            None => (None, None),
        };

        let new_course = course::ActiveModel {
            title: sea_orm::ActiveValue::Set(title.to_string()),
            description: sea_orm::ActiveValue::Set(description.to_string()),
            category: sea_orm::ActiveValue::Set(category.to_string()),
            created_by: sea_orm::ActiveValue::Set(created_by),
            thumbnail_public_id: sea_orm::ActiveValue::Set(thumb_id),
            thumbnail_url: sea_orm::ActiveValue::Set(thumb_url),
            lectures: sea_orm::ActiveValue::Set(course::Lectures::new()),
            number_of_lectures: sea_orm::ActiveValue::Set(0),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let created = new_course.insert(&self.db).await?;
        Ok(created)
    }

    /// Partial update of the catalog fields; absent fields keep their
    /// current value.
    pub async fn update(
        &self,
        id: i32,
        title: Option<&str>,
        description: Option<&str>,
        category: Option<&str>,
    ) -> AppResult<CourseModel> {
        let existing = self.get_by_id(id).await?;
        let now = chrono::Utc::now().naive_utc();

        let mut active: course::ActiveModel = existing.into();
        if let Some(title) = title {
            active.title = sea_orm::ActiveValue::Set(title.to_string());
        }
        if let Some(description) = description {
            active.description = sea_orm::ActiveValue::Set(description.to_string());
        }
        if let Some(category) = category {
            active.category = sea_orm::ActiveValue::Set(category.to_string());
        }
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let existing = self.get_by_id(id).await?;
        Course::delete_by_id(existing.id).exec(&self.db).await?;
        Ok(())
    }

    /// Append a lecture. The new list and the recomputed count go out in
    /// one row UPDATE, which is what keeps `number_of_lectures` equal to
    /// the list length.
    pub async fn add_lecture(
        &self,
        course_id: i32,
        title: &str,
        description: &str,
        media: MediaRef,
    ) -> AppResult<CourseModel> {
        let existing = self.get_by_id(course_id).await?;
        let now = chrono::Utc::now().naive_utc();

        let mut lectures = existing.lectures.clone();
        lectures.push(Lecture::new(
            title.to_string(),
            description.to_string(),
            media,
        ));
        let count = lectures.len() as i32;

        let mut active: course::ActiveModel = existing.into();
        active.lectures = sea_orm::ActiveValue::Set(lectures);
        active.number_of_lectures = sea_orm::ActiveValue::Set(count);
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    /// Remove a lecture by id. Unknown course or lecture ids both answer
    /// not-found; a silent no-op would hide client bugs.
    pub async fn remove_lecture(
        &self,
        course_id: i32,
        lecture_id: Uuid,
    ) -> AppResult<(CourseModel, Lecture)> {
        let existing = self.get_by_id(course_id).await?;
        let now = chrono::Utc::now().naive_utc();

        let mut lectures = existing.lectures.clone();
        let removed = lectures.remove(lecture_id).ok_or(AppError::NotFound)?;
        let count = lectures.len() as i32;

        let mut active: course::ActiveModel = existing.into();
        active.lectures = sea_orm::ActiveValue::Set(lectures);
        active.number_of_lectures = sea_orm::ActiveValue::Set(count);
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await?;
        Ok((updated, removed))
    }
}
