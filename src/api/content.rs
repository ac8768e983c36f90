//! Building content: data points and the responsible-user list.
//!
//! Both share one access scope — a caller who may read a building's data
//! points may also see who is responsible for it. Reads are granted by the
//! building-scoped read codename or by the project-wide one; writes need
//! the project-scoped building-update grant.

use serde::Deserialize;

use crate::resource::{Action, ResourcePath};
use crate::response::{self, HttpResponse};
use crate::router::{Context, Router};
use crate::store::Store;
use crate::{Module, Result};

use super::{require, store_and_grants};

pub struct ContentModule;

#[derive(Debug, Deserialize)]
struct DataPointInput {
    value: f64,
    kind: String,
    #[serde(default)]
    unit: String,
    #[serde(default)]
    device: String,
}

impl Module for ContentModule {
    fn name(&self) -> &'static str {
        "content"
    }

    fn routes(&self, router: &mut Router) {
        router.get(
            "/api/projects/{project}/buildings/{building}/data-points",
            list_data_points,
        );
        router.post(
            "/api/projects/{project}/buildings/{building}/data-points",
            create_data_point,
        );
        router.get(
            "/api/projects/{project}/buildings/{building}/users",
            list_responsible_users,
        );
    }
}

/// Confirm the building really lives under the project named in the path.
/// The access core assumes well-formed paths; this is where they are made
/// well formed.
async fn check_ancestry(store: &Store, project: u64, building: u64) -> Result<()> {
    if store.building(project, building).await?.is_none() {
        return Err(crate::Error::NotFound("Building not found".to_string()));
    }
    Ok(())
}

async fn list_data_points(ctx: Context) -> Result<HttpResponse> {
    let (store, grants) = store_and_grants(&ctx).await?;
    let project = ctx.id_param("project")?;
    let building = ctx.id_param("building")?;
    require(&grants, Action::Read, &ResourcePath::Content { project, building })?;
    check_ancestry(&store, project, building).await?;
    let points = store.data_points(building).await?;
    response::ok(&points)
}

async fn create_data_point(ctx: Context) -> Result<HttpResponse> {
    let (store, grants) = store_and_grants(&ctx).await?;
    let project = ctx.id_param("project")?;
    let building = ctx.id_param("building")?;
    require(&grants, Action::Create, &ResourcePath::Content { project, building })?;
    check_ancestry(&store, project, building).await?;
    let input: DataPointInput = ctx.json()?;
    let point = store
        .insert_data_point(building, input.value, &input.kind, &input.unit, &input.device)
        .await?;
    response::created(&point)
}

async fn list_responsible_users(ctx: Context) -> Result<HttpResponse> {
    let (store, grants) = store_and_grants(&ctx).await?;
    let project = ctx.id_param("project")?;
    let building = ctx.id_param("building")?;
    require(&grants, Action::Read, &ResourcePath::Content { project, building })?;
    check_ancestry(&store, project, building).await?;
    let users = store.responsible_users(building).await?;
    response::ok(&users)
}
