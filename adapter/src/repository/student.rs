use async_trait::async_trait;
use derive_new::new;
use kernel::{
    model::{
        id::StudentId,
        student::{event::CreateStudent, Student},
    },
    repository::student::StudentRepository,
};
use shared::error::{AppError, AppResult};

use crate::database::{model::student::StudentRow, ConnectionPool};

#[derive(new)]
pub struct StudentRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl StudentRepository for StudentRepositoryImpl {
    async fn create(&self, event: CreateStudent) -> AppResult<StudentId> {
        let student_id = StudentId::new();
        sqlx::query(
            "INSERT INTO students (student_id, name, email, phone, department)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(student_id.to_string())
        .bind(&event.name)
        .bind(&event.email)
        .bind(&event.phone)
        .bind(&event.department)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(student_id)
    }

    async fn find_by_id(&self, student_id: StudentId) -> AppResult<Option<Student>> {
        let row: Option<StudentRow> = sqlx::query_as(
            "SELECT student_id, name, email, phone, department
             FROM students
             WHERE student_id = ?",
        )
        .bind(student_id.to_string())
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        row.map(Student::try_from).transpose()
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Student>> {
        let row: Option<StudentRow> = sqlx::query_as(
            "SELECT student_id, name, email, phone, department
             FROM students
             WHERE name = ?
             ORDER BY student_id
             LIMIT 1",
        )
        .bind(name)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        row.map(Student::try_from).transpose()
    }
}
