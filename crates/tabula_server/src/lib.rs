//! HTTP surface for Tabula.
//!
//! Routes:
//!
//! | Method | Path | Purpose |
//! |---|---|---|
//! | `GET` | `/health` | Liveness |
//! | `POST` | `/prompts` | Run a prompt (multipart) |
//! | `GET` | `/prompts/history` | Recent runs |
//! | `GET` | `/images` | Uploaded images |
//! | `GET` | `{media_url}*` | Locally stored media |
//!
//! Authentication happens upstream; the authenticated user id arrives in the
//! `X-User-Id` header.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod api;
mod auth;
mod error;
mod services;
mod state;

pub use api::{PromptResponse, create_router};
pub use auth::{CurrentUser, USER_ID_HEADER};
pub use error::{ErrorResponse, status_for};
pub use services::build_state;
pub use state::AppState;
