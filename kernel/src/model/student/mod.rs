use super::id::StudentId;

pub mod event;

#[derive(Debug, Clone)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub department: String,
}
