pub mod blog;
pub mod comment;
pub mod shared;
pub mod token;
pub mod user;
