pub mod auth;
pub mod authz;
pub mod engagement;
pub mod error;
pub mod feed;
pub mod media;
pub mod posts;
