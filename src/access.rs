//! Access decision evaluator and collection scoping filter.
//!
//! Both entry points are pure functions over a [`CallerGrants`] snapshot;
//! they hold no state and perform no I/O, so concurrent requests can share
//! them freely.
//!
//! The one non-obvious rule is the hierarchy fallback: a read grant on a
//! project implies read access to every building and every building's
//! content beneath it, while the converse never holds. Mutations on
//! buildings fall back only to the project-scoped building-management
//! codenames, never to the plain project read/update grants.

use std::collections::BTreeSet;

use crate::codename::{self, Codename};
use crate::grants::CallerGrants;
use crate::resource::{Action, BuildingId, ProjectId, ResourcePath};

/// Outcome of one access evaluation. Denial is the normal branch of every
/// evaluation, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Result of scoping a listing to a caller.
///
/// `All` is a sentinel the transport layer resolves against storage with an
/// unfiltered query; `Ids` is the exact set of child ids the caller may
/// see, possibly empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    Ids(BTreeSet<u64>),
}

impl Scope {
    /// An empty id set — the caller sees nothing under this parent.
    pub fn empty() -> Self {
        Scope::Ids(BTreeSet::new())
    }
}

/// Decide whether a caller may perform `action` at `path`.
///
/// Rules, in order: identity override, exact codename, then the hierarchy
/// fallback for reads below project level. Anything the grammar has no
/// codename for is an identity-only operation.
pub fn evaluate(grants: &CallerGrants, action: Action, path: &ResourcePath) -> Decision {
    if grants.has_override() {
        return Decision::Allow;
    }

    let Some(required) = codename::encode(action, path) else {
        // No codename exists for this operation (e.g. project create);
        // only the identity override can reach it.
        return Decision::Deny;
    };

    if grants.holds(&required) {
        return Decision::Allow;
    }

    // Hierarchy fallback: reads below project level are also granted by
    // the project-wide read codename.
    if action == Action::Read
        && let ResourcePath::Building { project, .. } | ResourcePath::Content { project, .. } =
            *path
        && grants.holds(&Codename::ProjectRead { project })
    {
        return Decision::Allow;
    }

    Decision::Deny
}

/// Compute which children of `parent` the caller may list.
///
/// This inverts the codec: instead of encoding the path in hand, it decodes
/// every string in the caller's grant set and keeps the ones naming a
/// readable child directly under `parent`. Linear in the grant set — never
/// in the resource table — because a caller may hold no grants at all on a
/// project with thousands of buildings. Strings outside the grammar are
/// skipped, not reported.
pub fn scoped_children(grants: &CallerGrants, parent: &ResourcePath) -> Scope {
    if grants.has_override() {
        return Scope::All;
    }

    match *parent {
        ResourcePath::Project { project } => scoped_buildings(grants, project),
        // A building's children (data points, responsible users) carry no
        // per-item codenames: content read is all-or-nothing.
        ResourcePath::Building { project, building }
        | ResourcePath::Content { project, building } => {
            let content = ResourcePath::Content { project, building };
            if evaluate(grants, Action::Read, &content).is_allow() {
                Scope::All
            } else {
                Scope::empty()
            }
        }
    }
}

fn scoped_buildings(grants: &CallerGrants, project: ProjectId) -> Scope {
    // Broad grants first: project-wide read, or any project-scoped
    // building-management codename, sees every building.
    if grants.holds(&Codename::ProjectRead { project }) {
        return Scope::All;
    }

    let mut ids: BTreeSet<BuildingId> = BTreeSet::new();
    for raw in &grants.codenames {
        match codename::decode(raw) {
            Some(c) if c.is_building_management() && c.project() == project => {
                return Scope::All;
            }
            Some(Codename::BuildingRead {
                project: p,
                building,
            }) if p == project => {
                ids.insert(building);
            }
            _ => {}
        }
    }
    Scope::Ids(ids)
}

/// Which projects should appear in the caller's top-level listing.
///
/// There is no codename for "list projects", so visibility is derived the
/// same way as [`scoped_children`]: any decodable grant gives the caller a
/// foothold in its project and makes that project visible. Detail access is
/// still gated by [`evaluate`] — seeing a project in the listing does not
/// imply reading it.
pub fn visible_projects(grants: &CallerGrants) -> Scope {
    if grants.has_override() {
        return Scope::All;
    }

    let ids: BTreeSet<ProjectId> = grants
        .codenames
        .iter()
        .filter_map(|raw| codename::decode(raw))
        .map(|c| c.project())
        .collect();
    Scope::Ids(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(project: ProjectId, building: BuildingId) -> ResourcePath {
        ResourcePath::Content { project, building }
    }

    fn building(project: ProjectId, building: BuildingId) -> ResourcePath {
        ResourcePath::Building { project, building }
    }

    #[test]
    fn staff_override_allows_everything() {
        let staff = CallerGrants::staff();
        let paths = [
            ResourcePath::Project { project: 1 },
            building(1, 2),
            content(1, 2),
        ];
        for path in &paths {
            for action in [Action::Read, Action::Create, Action::Update, Action::Delete] {
                assert_eq!(evaluate(&staff, action, path), Decision::Allow);
            }
        }
    }

    #[test]
    fn superuser_flag_is_an_equal_override() {
        let grants = CallerGrants {
            is_superuser: true,
            ..CallerGrants::none()
        };
        assert_eq!(
            evaluate(&grants, Action::Delete, &building(1, 2)),
            Decision::Allow
        );
        assert_eq!(scoped_children(&grants, &ResourcePath::Project { project: 1 }), Scope::All);
    }

    #[test]
    fn empty_grants_deny_everything() {
        let grants = CallerGrants::none();
        let paths = [
            ResourcePath::Project { project: 1 },
            building(1, 2),
            content(1, 2),
        ];
        for path in &paths {
            for action in [Action::Read, Action::Create, Action::Update, Action::Delete] {
                assert_eq!(evaluate(&grants, action, path), Decision::Deny);
            }
        }
    }

    #[test]
    fn project_read_grant_reaches_every_building_and_its_content() {
        // Broad grant implies all narrower reads under the same project.
        let grants = CallerGrants::with_codenames(["can_access_project_1"]);
        assert_eq!(
            evaluate(&grants, Action::Read, &ResourcePath::Project { project: 1 }),
            Decision::Allow
        );
        for b in [2, 3, 900] {
            assert_eq!(evaluate(&grants, Action::Read, &building(1, b)), Decision::Allow);
            assert_eq!(evaluate(&grants, Action::Read, &content(1, b)), Decision::Allow);
        }
        // But not under a different project.
        assert_eq!(evaluate(&grants, Action::Read, &content(2, 2)), Decision::Deny);
    }

    #[test]
    fn building_grant_does_not_reach_upward_or_sideways() {
        let grants = CallerGrants::with_codenames(["can_access_project_1_building_3"]);
        assert_eq!(evaluate(&grants, Action::Read, &building(1, 3)), Decision::Allow);
        assert_eq!(evaluate(&grants, Action::Read, &content(1, 3)), Decision::Allow);
        // Not the project itself, not a sibling building.
        assert_eq!(
            evaluate(&grants, Action::Read, &ResourcePath::Project { project: 1 }),
            Decision::Deny
        );
        assert_eq!(evaluate(&grants, Action::Read, &content(1, 4)), Decision::Deny);
    }

    #[test]
    fn building_mutations_require_the_management_grants() {
        let managed = CallerGrants::with_codenames([
            "can_create_buildings_project_1",
            "can_update_buildings_project_1",
            "can_delete_buildings_project_1",
        ]);
        assert_eq!(evaluate(&managed, Action::Create, &building(1, 0)), Decision::Allow);
        assert_eq!(evaluate(&managed, Action::Update, &building(1, 5)), Decision::Allow);
        assert_eq!(evaluate(&managed, Action::Delete, &building(1, 5)), Decision::Allow);

        // Project read/update codenames never stand in for them.
        let read_only =
            CallerGrants::with_codenames(["can_access_project_1", "can_update_project_1"]);
        assert_eq!(evaluate(&read_only, Action::Create, &building(1, 0)), Decision::Deny);
        assert_eq!(evaluate(&read_only, Action::Update, &building(1, 5)), Decision::Deny);
        assert_eq!(evaluate(&read_only, Action::Delete, &building(1, 5)), Decision::Deny);
    }

    #[test]
    fn management_grants_do_not_imply_project_mutation() {
        let grants = CallerGrants::with_codenames(["can_update_buildings_project_1"]);
        assert_eq!(
            evaluate(&grants, Action::Update, &ResourcePath::Project { project: 1 }),
            Decision::Deny
        );
    }

    #[test]
    fn project_create_and_delete_are_identity_only() {
        let grants = CallerGrants::with_codenames([
            "can_access_project_1",
            "can_update_project_1",
            "can_create_buildings_project_1",
        ]);
        assert_eq!(
            evaluate(&grants, Action::Create, &ResourcePath::Project { project: 1 }),
            Decision::Deny
        );
        assert_eq!(
            evaluate(&grants, Action::Delete, &ResourcePath::Project { project: 1 }),
            Decision::Deny
        );
    }

    #[test]
    fn content_mutation_requires_the_building_update_grant() {
        let grants = CallerGrants::with_codenames(["can_update_buildings_project_1"]);
        assert_eq!(evaluate(&grants, Action::Create, &content(1, 3)), Decision::Allow);

        let reader = CallerGrants::with_codenames(["can_access_project_1"]);
        assert_eq!(evaluate(&reader, Action::Create, &content(1, 3)), Decision::Deny);
    }

    #[test]
    fn filter_collects_exactly_the_granted_building_ids() {
        let grants = CallerGrants::with_codenames([
            "can_access_project_1_building_3",
            "can_access_project_1_building_7",
        ]);
        let scope = scoped_children(&grants, &ResourcePath::Project { project: 1 });
        assert_eq!(scope, Scope::Ids(BTreeSet::from([3, 7])));
    }

    #[test]
    fn filter_ignores_grants_on_other_projects() {
        let grants = CallerGrants::with_codenames([
            "can_access_project_1_building_3",
            "can_access_project_2_building_9",
            "can_access_project_2",
        ]);
        let scope = scoped_children(&grants, &ResourcePath::Project { project: 1 });
        assert_eq!(scope, Scope::Ids(BTreeSet::from([3])));
    }

    #[test]
    fn broad_grant_wins_over_narrower_ones() {
        let grants = CallerGrants::with_codenames([
            "can_access_project_1",
            "can_access_project_1_building_3",
        ]);
        assert_eq!(
            scoped_children(&grants, &ResourcePath::Project { project: 1 }),
            Scope::All
        );
    }

    #[test]
    fn management_grant_sees_every_building() {
        let grants = CallerGrants::with_codenames(["can_update_buildings_project_1"]);
        assert_eq!(
            scoped_children(&grants, &ResourcePath::Project { project: 1 }),
            Scope::All
        );
    }

    #[test]
    fn staff_filter_returns_the_all_sentinel() {
        assert_eq!(
            scoped_children(&CallerGrants::staff(), &ResourcePath::Project { project: 1 }),
            Scope::All
        );
    }

    #[test]
    fn content_listing_is_all_or_nothing() {
        let reader = CallerGrants::with_codenames(["can_access_project_1_building_3"]);
        assert_eq!(scoped_children(&reader, &building(1, 3)), Scope::All);
        assert_eq!(scoped_children(&reader, &building(1, 4)), Scope::empty());
    }

    #[test]
    fn malformed_grants_change_nothing() {
        let clean = CallerGrants::with_codenames([
            "can_access_project_1_building_3",
            "can_access_project_1_building_7",
        ]);
        let mut noisy = clean.clone();
        for junk in [
            "not_a_codename",
            "can_access_project_",
            "can_access_project_01",
            "can_access_project_1_building_x",
            "delete_everything",
        ] {
            noisy.codenames.insert(junk.to_string());
        }

        let parent = ResourcePath::Project { project: 1 };
        assert_eq!(scoped_children(&clean, &parent), scoped_children(&noisy, &parent));
        for b in [3, 4, 7] {
            assert_eq!(
                evaluate(&clean, Action::Read, &content(1, b)),
                evaluate(&noisy, Action::Read, &content(1, b))
            );
        }
        assert_eq!(visible_projects(&clean), visible_projects(&noisy));
    }

    #[test]
    fn visible_projects_collects_footholds() {
        let grants = CallerGrants::with_codenames([
            "can_access_project_1_building_3",
            "can_update_project_2",
            "can_delete_buildings_project_5",
            "unrelated_grant",
        ]);
        assert_eq!(visible_projects(&grants), Scope::Ids(BTreeSet::from([1, 2, 5])));
        assert_eq!(visible_projects(&CallerGrants::none()), Scope::empty());
        assert_eq!(visible_projects(&CallerGrants::staff()), Scope::All);
    }
}
