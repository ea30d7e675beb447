pub mod blog;
pub mod comment;
pub mod token;
pub mod user;
