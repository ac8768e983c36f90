//! Permission codename codec.
//!
//! A codename is the canonical string identifier binding one action to one
//! resource path, e.g. `can_access_project_4` or
//! `can_update_buildings_project_4`. The grant store hands the core raw
//! strings; this module is the only place that knows the grammar. Every
//! other component works with the typed [`Codename`] value.
//!
//! Decoding is deliberately forgiving: the permission namespace is shared
//! with unrelated grants, so any string outside the grammar decodes to
//! `None` and is skipped by the callers, never surfaced as an error.

use std::fmt;

use crate::resource::{Action, BuildingId, ProjectId, ResourcePath};

/// A well-formed permission codename.
///
/// The six variants are the complete grammar. Management codenames
/// (`BuildingCreate`/`BuildingUpdate`/`BuildingDelete`) are scoped to a
/// project and cover every building under it; `BuildingRead` is scoped to
/// one specific building and also covers that building's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Codename {
    /// `can_access_project_{p}` — read the project and, by hierarchy
    /// fallback, everything beneath it.
    ProjectRead { project: ProjectId },
    /// `can_update_project_{p}`
    ProjectUpdate { project: ProjectId },
    /// `can_create_buildings_project_{p}`
    BuildingCreate { project: ProjectId },
    /// `can_update_buildings_project_{p}`
    BuildingUpdate { project: ProjectId },
    /// `can_delete_buildings_project_{p}`
    BuildingDelete { project: ProjectId },
    /// `can_access_project_{p}_building_{b}` — read one building and its
    /// content.
    BuildingRead {
        project: ProjectId,
        building: BuildingId,
    },
}

impl Codename {
    /// The project this codename is scoped to.
    pub fn project(&self) -> ProjectId {
        match *self {
            Codename::ProjectRead { project }
            | Codename::ProjectUpdate { project }
            | Codename::BuildingCreate { project }
            | Codename::BuildingUpdate { project }
            | Codename::BuildingDelete { project }
            | Codename::BuildingRead { project, .. } => project,
        }
    }

    /// Whether this is one of the project-scoped building-management
    /// codenames (create/update/delete of buildings under the project).
    pub fn is_building_management(&self) -> bool {
        matches!(
            self,
            Codename::BuildingCreate { .. }
                | Codename::BuildingUpdate { .. }
                | Codename::BuildingDelete { .. }
        )
    }
}

impl fmt::Display for Codename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Codename::ProjectRead { project } => {
                write!(f, "can_access_project_{project}")
            }
            Codename::ProjectUpdate { project } => {
                write!(f, "can_update_project_{project}")
            }
            Codename::BuildingCreate { project } => {
                write!(f, "can_create_buildings_project_{project}")
            }
            Codename::BuildingUpdate { project } => {
                write!(f, "can_update_buildings_project_{project}")
            }
            Codename::BuildingDelete { project } => {
                write!(f, "can_delete_buildings_project_{project}")
            }
            Codename::BuildingRead { project, building } => {
                write!(f, "can_access_project_{project}_building_{building}")
            }
        }
    }
}

/// Compute the codename required for `action` at `path`.
///
/// Returns `None` for combinations the grammar has no codename for
/// (e.g. project create/delete); the evaluator treats those as
/// staff-only operations.
///
/// Content mutations map to the project-scoped building-update grant:
/// writing a building's data points or responsible-user list is part of
/// maintaining the building.
pub fn encode(action: Action, path: &ResourcePath) -> Option<Codename> {
    match (action, *path) {
        (Action::Read, ResourcePath::Project { project }) => {
            Some(Codename::ProjectRead { project })
        }
        (Action::Update, ResourcePath::Project { project }) => {
            Some(Codename::ProjectUpdate { project })
        }
        (
            Action::Read,
            ResourcePath::Building { project, building }
            | ResourcePath::Content { project, building },
        ) => Some(Codename::BuildingRead { project, building }),
        (Action::Create, ResourcePath::Building { project, .. }) => {
            Some(Codename::BuildingCreate { project })
        }
        (Action::Update, ResourcePath::Building { project, .. }) => {
            Some(Codename::BuildingUpdate { project })
        }
        (Action::Delete, ResourcePath::Building { project, .. }) => {
            Some(Codename::BuildingDelete { project })
        }
        (
            Action::Create | Action::Update | Action::Delete,
            ResourcePath::Content { project, .. },
        ) => Some(Codename::BuildingUpdate { project }),
        _ => None,
    }
}

/// Parse a raw grant string back into a typed codename.
///
/// Total over well-formed strings; anything else — unrelated grants,
/// malformed id segments, trailing garbage — yields `None`.
pub fn decode(s: &str) -> Option<Codename> {
    if let Some(rest) = s.strip_prefix("can_access_project_") {
        return match rest.split_once("_building_") {
            Some((project, building)) => Some(Codename::BuildingRead {
                project: parse_id(project)?,
                building: parse_id(building)?,
            }),
            None => Some(Codename::ProjectRead {
                project: parse_id(rest)?,
            }),
        };
    }
    if let Some(rest) = s.strip_prefix("can_update_project_") {
        return Some(Codename::ProjectUpdate {
            project: parse_id(rest)?,
        });
    }
    if let Some(rest) = s.strip_prefix("can_create_buildings_project_") {
        return Some(Codename::BuildingCreate {
            project: parse_id(rest)?,
        });
    }
    if let Some(rest) = s.strip_prefix("can_update_buildings_project_") {
        return Some(Codename::BuildingUpdate {
            project: parse_id(rest)?,
        });
    }
    if let Some(rest) = s.strip_prefix("can_delete_buildings_project_") {
        return Some(Codename::BuildingDelete {
            project: parse_id(rest)?,
        });
    }
    None
}

/// Parse one id segment: decimal digits only, non-empty, no leading zeros.
fn parse_id(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if s.len() > 1 && s.starts_with('0') {
        return None;
    }
    s.parse().ok()
}
