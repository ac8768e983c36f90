//! Building object CRUD under a project.
//!
//! The listing endpoint is the consumer of the collection scoping filter:
//! it resolves the `All` sentinel into an unfiltered project query and an
//! id scope into an `IN` query, so an ungranted caller never enumerates
//! the project's buildings.

use serde::Deserialize;

use crate::access::{self, Scope};
use crate::resource::{Action, ResourcePath};
use crate::response::{self, HttpResponse};
use crate::router::{Context, Router};
use crate::{Module, Result};

use super::{require, store_and_grants};

pub struct BuildingsModule;

#[derive(Debug, Deserialize)]
struct BuildingInput {
    name: String,
    #[serde(default)]
    location: String,
}

impl Module for BuildingsModule {
    fn name(&self) -> &'static str {
        "buildings"
    }

    fn routes(&self, router: &mut Router) {
        router.get("/api/projects/{project}/buildings", list);
        router.post("/api/projects/{project}/buildings", create);
        router.get("/api/projects/{project}/buildings/{building}", detail);
        router.put("/api/projects/{project}/buildings/{building}", update);
        router.patch("/api/projects/{project}/buildings/{building}", update);
        router.delete("/api/projects/{project}/buildings/{building}", delete);
    }
}

async fn list(ctx: Context) -> Result<HttpResponse> {
    let (store, grants) = store_and_grants(&ctx).await?;
    let project = ctx.id_param("project")?;
    let parent = ResourcePath::Project { project };
    let buildings = match access::scoped_children(&grants, &parent) {
        Scope::All => store.buildings_in_project(project).await?,
        Scope::Ids(ids) => store.buildings_by_ids(project, &ids).await?,
    };
    response::ok(&buildings)
}

async fn create(ctx: Context) -> Result<HttpResponse> {
    let (store, grants) = store_and_grants(&ctx).await?;
    let project = ctx.id_param("project")?;
    // The building id is not known yet; the create codename is scoped to
    // the project anyway.
    let path = ResourcePath::Building {
        project,
        building: 0,
    };
    require(&grants, Action::Create, &path)?;
    if store.project(project).await?.is_none() {
        return Ok(response::not_found("Project not found"));
    }
    let input: BuildingInput = ctx.json()?;
    let building = store
        .create_building(project, &input.name, &input.location)
        .await?;
    response::created(&building)
}

async fn detail(ctx: Context) -> Result<HttpResponse> {
    let (store, grants) = store_and_grants(&ctx).await?;
    let project = ctx.id_param("project")?;
    let building = ctx.id_param("building")?;
    require(&grants, Action::Read, &ResourcePath::Building { project, building })?;
    match store.building(project, building).await? {
        Some(row) => response::ok(&row),
        None => Ok(response::not_found("Building not found")),
    }
}

async fn update(ctx: Context) -> Result<HttpResponse> {
    let (store, grants) = store_and_grants(&ctx).await?;
    let project = ctx.id_param("project")?;
    let building = ctx.id_param("building")?;
    require(&grants, Action::Update, &ResourcePath::Building { project, building })?;
    let input: BuildingInput = ctx.json()?;
    match store
        .update_building(project, building, &input.name, &input.location)
        .await?
    {
        Some(row) => response::ok(&row),
        None => Ok(response::not_found("Building not found")),
    }
}

async fn delete(ctx: Context) -> Result<HttpResponse> {
    let (store, grants) = store_and_grants(&ctx).await?;
    let project = ctx.id_param("project")?;
    let building = ctx.id_param("building")?;
    require(&grants, Action::Delete, &ResourcePath::Building { project, building })?;
    if store.delete_building(project, building).await? {
        Ok(response::no_content())
    } else {
        Ok(response::not_found("Building not found"))
    }
}
