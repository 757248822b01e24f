use kernel::model::student::Student;
use shared::error::AppError;

#[derive(sqlx::FromRow)]
pub struct StudentRow {
    pub student_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub department: String,
}

impl TryFrom<StudentRow> for Student {
    type Error = AppError;

    fn try_from(row: StudentRow) -> Result<Self, Self::Error> {
        Ok(Student {
            id: row.student_id.parse()?,
            name: row.name,
            email: row.email,
            phone: row.phone,
            department: row.department,
        })
    }
}
