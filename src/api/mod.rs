//! HTTP client for the Readwise Reader document API.

mod client;

pub use client::{ApiError, DocumentPage, ReaderClient, DEFAULT_AUTH_URL, DEFAULT_BASE_URL};
