//! API modules: projects, building objects, and building content.
//!
//! Every handler follows the same shape: authenticate the caller, fetch
//! their grant snapshot once, run the pure access core on it, and only
//! then touch the entity store. The helpers here keep that order honest.

mod buildings;
mod content;
mod projects;

pub use buildings::BuildingsModule;
pub use content::ContentModule;
pub use projects::ProjectsModule;

use crate::access::{self, Decision};
use crate::grants::{CallerGrants, GrantStore};
use crate::resource::{Action, ResourcePath};
use crate::router::Context;
use crate::store::Store;
use crate::{Error, Result};

/// Open the store and fetch the caller's grant snapshot for this request.
///
/// The snapshot is fetched exactly once per request and never re-read;
/// a grant-store failure propagates and the transport fails closed.
pub(crate) async fn store_and_grants(ctx: &Context) -> Result<(Store, CallerGrants)> {
    let store = Store::new(ctx.require_db()?.clone());
    let caller = ctx.require_caller_id()?;
    let grants = store.grants_for(caller).await?;
    Ok((store, grants))
}

/// Run the evaluator and map a deny to a 403-class error.
pub(crate) fn require(grants: &CallerGrants, action: Action, path: &ResourcePath) -> Result<()> {
    match access::evaluate(grants, action, path) {
        Decision::Allow => Ok(()),
        Decision::Deny => Err(Error::Forbidden {
            resource: describe_path(path),
            action: describe_action(action),
        }),
    }
}

/// Require the identity override for operations the codename grammar has
/// no codename for (project create/delete).
pub(crate) fn require_override(
    grants: &CallerGrants,
    resource: &str,
    action: &str,
) -> Result<()> {
    if grants.has_override() {
        Ok(())
    } else {
        Err(Error::Forbidden {
            resource: resource.to_string(),
            action: action.to_string(),
        })
    }
}

fn describe_action(action: Action) -> String {
    match action {
        Action::Read => "read",
        Action::Create => "create",
        Action::Update => "update",
        Action::Delete => "delete",
    }
    .to_string()
}

fn describe_path(path: &ResourcePath) -> String {
    match *path {
        ResourcePath::Project { project } => format!("project {project}"),
        ResourcePath::Building { project, building } => {
            format!("building {building} of project {project}")
        }
        ResourcePath::Content { project, building } => {
            format!("content of building {building} of project {project}")
        }
    }
}
