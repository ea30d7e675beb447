mod auth;
mod blog;
