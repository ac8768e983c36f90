//! Project CRUD.
//!
//! Listing is scoped by the caller's grant footholds; detail and update go
//! through the evaluator; create and delete have no codename in the
//! grammar and are identity-only.

use serde::Deserialize;

use crate::access::{self, Scope};
use crate::resource::{Action, ResourcePath};
use crate::response::{self, HttpResponse};
use crate::router::{Context, Router};
use crate::{Module, Result};

use super::{require, require_override, store_and_grants};

pub struct ProjectsModule;

#[derive(Debug, Deserialize)]
struct ProjectInput {
    name: String,
    #[serde(default)]
    description: String,
}

impl Module for ProjectsModule {
    fn name(&self) -> &'static str {
        "projects"
    }

    fn routes(&self, router: &mut Router) {
        router.get("/api/projects", list);
        router.post("/api/projects", create);
        router.get("/api/projects/{project}", detail);
        router.put("/api/projects/{project}", update);
        router.patch("/api/projects/{project}", update);
        router.delete("/api/projects/{project}", delete);
    }
}

async fn list(ctx: Context) -> Result<HttpResponse> {
    let (store, grants) = store_and_grants(&ctx).await?;
    let projects = match access::visible_projects(&grants) {
        Scope::All => store.projects_all().await?,
        Scope::Ids(ids) => store.projects_by_ids(&ids).await?,
    };
    response::ok(&projects)
}

async fn create(ctx: Context) -> Result<HttpResponse> {
    let (store, grants) = store_and_grants(&ctx).await?;
    require_override(&grants, "projects", "create")?;
    let input: ProjectInput = ctx.json()?;
    let project = store.create_project(&input.name, &input.description).await?;
    response::created(&project)
}

async fn detail(ctx: Context) -> Result<HttpResponse> {
    let (store, grants) = store_and_grants(&ctx).await?;
    let project = ctx.id_param("project")?;
    require(&grants, Action::Read, &ResourcePath::Project { project })?;
    match store.project(project).await? {
        Some(row) => response::ok(&row),
        None => Ok(response::not_found("Project not found")),
    }
}

async fn update(ctx: Context) -> Result<HttpResponse> {
    let (store, grants) = store_and_grants(&ctx).await?;
    let project = ctx.id_param("project")?;
    require(&grants, Action::Update, &ResourcePath::Project { project })?;
    let input: ProjectInput = ctx.json()?;
    match store
        .update_project(project, &input.name, &input.description)
        .await?
    {
        Some(row) => response::ok(&row),
        None => Ok(response::not_found("Project not found")),
    }
}

async fn delete(ctx: Context) -> Result<HttpResponse> {
    let (store, grants) = store_and_grants(&ctx).await?;
    let project = ctx.id_param("project")?;
    require_override(&grants, "projects", "delete")?;
    if store.delete_project(project).await? {
        Ok(response::no_content())
    } else {
        Ok(response::not_found("Project not found"))
    }
}
