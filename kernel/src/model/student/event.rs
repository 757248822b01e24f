#[derive(Debug)]
pub struct CreateStudent {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub department: String,
}
