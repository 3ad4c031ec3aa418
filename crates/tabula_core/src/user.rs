//! User identity as handed over by the external authentication layer.

use serde::{Deserialize, Serialize};

/// Identifier of an authenticated user.
///
/// Authentication happens outside Tabula; this is the only piece of the user
/// the core ever sees.
///
/// ```
/// use tabula_core::UserId;
///
/// let user = UserId::new(42);
/// assert_eq!(user.to_string(), "42");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Wrap a raw user id.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw user id.
    pub fn get(&self) -> i64 {
        self.0
    }
}
