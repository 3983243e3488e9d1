pub mod accounts;
pub mod organization_members;
pub mod organizations;
pub mod projects;
pub mod users;
