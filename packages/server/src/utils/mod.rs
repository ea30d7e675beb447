pub mod hash;
pub mod jwt;
pub mod revocation;
pub mod upload;
