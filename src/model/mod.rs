//! Data models, split into the API layer and the database layer.

pub mod api;
pub mod db;
pub mod mongodb;
