pub mod account;
pub mod organization;
pub mod organization_member;
pub mod project;
pub mod user;

pub use account::Account;
pub use organization::Organization;
pub use organization_member::OrganizationMember;
pub use project::Project;
pub use user::User;
