//! Resource hierarchy model.
//!
//! Access control operates on a three-level tree: a project owns building
//! objects, and each building object owns its content (data points and the
//! responsible-user list, which share one access scope). A [`ResourcePath`]
//! names a node in that tree; an [`Action`] names what the caller wants to
//! do at that node.

/// Project identifier (decimal, no leading zeros in its codename form).
pub type ProjectId = u64;

/// Building object identifier.
pub type BuildingId = u64;

/// A node in the project → building → content tree.
///
/// A `Building` path always carries its parent project id, and a `Content`
/// path carries both ancestor ids. Ancestry consistency against storage
/// (does building 7 really live under project 1?) is the transport layer's
/// job; the core assumes paths are well formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourcePath {
    /// A project itself.
    Project { project: ProjectId },
    /// A building object under a project.
    Building {
        project: ProjectId,
        building: BuildingId,
    },
    /// The content of a building object: its data points and its
    /// responsible-user list.
    Content {
        project: ProjectId,
        building: BuildingId,
    },
}

impl ResourcePath {
    /// The project id at the root of this path.
    pub fn project(&self) -> ProjectId {
        match *self {
            ResourcePath::Project { project }
            | ResourcePath::Building { project, .. }
            | ResourcePath::Content { project, .. } => project,
        }
    }
}

/// What the caller wants to do at a path.
///
/// `Create` is only meaningful on `Building` and `Content` paths ("create a
/// child under this node"); the codec maps unsupported combinations to no
/// codename at all, which the evaluator treats as deny-for-non-staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

impl Action {
    /// Whether this action mutates the resource.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Action::Read)
    }
}
