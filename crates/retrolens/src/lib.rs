//! Retrolens - team retrospective feedback with theme identification
//!
//! Feedback items are embedded through an external provider, grouped with
//! k-means, labeled with their shortest member, and saved as named themes.

pub mod cli;
pub mod clustering;
pub mod config;
pub mod embedding;
pub mod export;
pub mod feedback;
pub mod labeler;
pub mod sentiment;
pub mod server;
pub mod store;
pub mod themes;
