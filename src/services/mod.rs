//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the collaborators outside the content store (auth
//! provider, object storage) and the public page assembly, so route
//! handlers stay focused on protocol translation and auth plumbing.

pub mod auth;
pub mod content;
pub mod media;
