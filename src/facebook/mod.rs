//! Graph API access: the HTTP client and the access-token store.

mod client;
mod token_store;

pub use client::{DownloadedImage, GraphClient, image_mime_type};
pub use token_store::{StoredToken, TokenStatus, TokenStore};

#[cfg(test)]
pub(crate) use client::tests::{client_for, spawn_stub};
