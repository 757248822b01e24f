use async_trait::async_trait;
use shared::error::AppResult;

use crate::model::{
    id::StudentId,
    student::{event::CreateStudent, Student},
};

#[mockall::automock]
#[async_trait]
pub trait StudentRepository: Send + Sync {
    // Enrollment
    async fn create(&self, event: CreateStudent) -> AppResult<StudentId>;
    async fn find_by_id(&self, student_id: StudentId) -> AppResult<Option<Student>>;
    // Indexed natural-key lookup; resolves a display name to the stored
    // identifier rather than rederiving one from the name
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Student>>;
}
