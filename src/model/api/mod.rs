mod id;

pub mod auth;
pub mod poll;
pub mod user;

pub use id::ApiId;
