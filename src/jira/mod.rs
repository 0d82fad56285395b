//! Jira search integration: wire types, record normalization, and the
//! paginating search client.

pub mod client;
pub mod jql;
pub mod models;

pub use client::JiraClient;
pub use models::{FieldMap, LinkField, Record};
