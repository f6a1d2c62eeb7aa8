// Models module - Database entity representations

pub mod club;
pub mod credential;
pub mod news;
pub mod pass;
pub mod person;

pub use club::Club;
pub use credential::{Credential, CredentialState};
pub use news::News;
pub use pass::{Pass, PassAuthorization};
pub use person::Person;
