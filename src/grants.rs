//! Caller grants and the grant store boundary.
//!
//! The access core never talks to storage itself. The transport layer asks
//! a [`GrantStore`] for a point-in-time [`CallerGrants`] snapshot and hands
//! it to the evaluator/filter; the core neither caches nor mutates it.

use std::collections::BTreeSet;
use std::future::Future;

/// A caller's permission snapshot: two identity flags plus the raw codename
/// strings granted to them.
///
/// The strings are kept raw on purpose — the permission namespace is shared
/// with grants the codec knows nothing about, and those must survive the
/// snapshot untouched so evaluation can skip them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerGrants {
    pub is_superuser: bool,
    pub is_staff: bool,
    pub codenames: BTreeSet<String>,
}

impl CallerGrants {
    /// A snapshot with no flags and no grants. Evaluates to deny everywhere.
    pub fn none() -> Self {
        Self::default()
    }

    /// A staff snapshot.
    pub fn staff() -> Self {
        Self {
            is_staff: true,
            ..Self::default()
        }
    }

    /// A plain-caller snapshot holding the given codename strings.
    pub fn with_codenames<I, S>(codenames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codenames: codenames.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Staff and superuser both outrank the codename scheme; either flag is
    /// a full override.
    pub fn has_override(&self) -> bool {
        self.is_staff || self.is_superuser
    }

    /// Whether the exact codename string is present in the snapshot.
    pub fn holds(&self, codename: &crate::codename::Codename) -> bool {
        self.codenames.contains(&codename.to_string())
    }
}

/// Boundary to wherever grants live.
///
/// Implementations must return a consistent point-in-time snapshot; a
/// lookup failure propagates as a hard error, which the transport layer
/// maps to a 5xx — never to a silent allow.
pub trait GrantStore {
    /// Fetch the grants snapshot for the caller identified by `caller_id`.
    fn grants_for(
        &self,
        caller_id: u64,
    ) -> impl Future<Output = crate::Result<CallerGrants>> + Send;
}
