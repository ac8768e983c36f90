//! libsql-backed persistence for entities and grants.
//!
//! The access core never sees this module directly: handlers fetch a
//! [`CallerGrants`] snapshot through the [`GrantStore`] impl, run the pure
//! evaluator/filter on it, and only then come back here to resolve the
//! winning scope into rows.

use std::collections::BTreeSet;

use libsql::{Connection, params};
use serde::{Deserialize, Serialize};

use crate::codename::Codename;
use crate::db::Handle;
use crate::grants::{CallerGrants, GrantStore};
use crate::resource::{BuildingId, ProjectId};
use crate::{Error, Result};

/// A project grouping building objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
}

/// A building object under a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingObject {
    pub id: BuildingId,
    pub project_id: ProjectId,
    pub name: String,
    pub location: String,
}

/// One sensor reading for a building object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPoint {
    pub id: u64,
    pub building_id: BuildingId,
    pub recorded_at: String,
    pub value: f64,
    /// Reading kind code, e.g. `TEMP`, `CO2`, `HUM`, `EC`.
    pub kind: String,
    /// Unit of the value, e.g. `°C`, `ppm`, `%`, `kWh`.
    pub unit: String,
    /// Name of the collecting device.
    pub device: String,
}

/// A service user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    #[serde(default)]
    pub is_staff: bool,
    #[serde(skip_serializing)]
    #[serde(default)]
    pub is_superuser: bool,
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS projects (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT ''
);
CREATE TABLE IF NOT EXISTS buildings (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    name       TEXT NOT NULL,
    location   TEXT NOT NULL DEFAULT ''
);
CREATE TABLE IF NOT EXISTS users (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    full_name    TEXT NOT NULL,
    email        TEXT NOT NULL,
    is_staff     INTEGER NOT NULL DEFAULT 0,
    is_superuser INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS building_users (
    building_id INTEGER NOT NULL REFERENCES buildings(id) ON DELETE CASCADE,
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    PRIMARY KEY (building_id, user_id)
);
CREATE TABLE IF NOT EXISTS data_points (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    building_id INTEGER NOT NULL REFERENCES buildings(id) ON DELETE CASCADE,
    recorded_at TEXT NOT NULL,
    value       REAL NOT NULL,
    kind        TEXT NOT NULL,
    unit        TEXT NOT NULL DEFAULT '',
    device      TEXT NOT NULL DEFAULT ''
);
CREATE TABLE IF NOT EXISTS user_grants (
    user_id  INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    codename TEXT NOT NULL,
    PRIMARY KEY (user_id, codename)
);
";

/// Entity and grant storage over a shared database handle.
#[derive(Clone)]
pub struct Store {
    db: Handle,
}

impl Store {
    pub fn new(db: Handle) -> Self {
        Self { db }
    }

    fn conn(&self) -> Result<Connection> {
        Ok(self.db.connect()?)
    }

    /// Create the schema if it does not exist yet.
    pub async fn init_schema(&self) -> Result<()> {
        self.conn()?.execute_batch(SCHEMA).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Projects
    // ------------------------------------------------------------------

    pub async fn projects_all(&self) -> Result<Vec<Project>> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                "SELECT id, name, description FROM projects ORDER BY id",
                (),
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(project_from_row(&row)?);
        }
        Ok(out)
    }

    /// Fetch the projects named by `ids`, in id order. Missing ids are
    /// simply absent from the result.
    pub async fn projects_by_ids(&self, ids: &BTreeSet<u64>) -> Result<Vec<Project>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn()?;
        // The ids come from decoded codenames and are plain integers.
        let list = join_ids(ids);
        let sql =
            format!("SELECT id, name, description FROM projects WHERE id IN ({list}) ORDER BY id");
        let mut rows = conn.query(&sql, ()).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(project_from_row(&row)?);
        }
        Ok(out)
    }

    pub async fn project(&self, id: ProjectId) -> Result<Option<Project>> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                "SELECT id, name, description FROM projects WHERE id = ?1",
                params![id as i64],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(project_from_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn create_project(&self, name: &str, description: &str) -> Result<Project> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO projects (name, description) VALUES (?1, ?2)",
            params![name, description],
        )
        .await?;
        Ok(Project {
            id: conn.last_insert_rowid() as u64,
            name: name.to_string(),
            description: description.to_string(),
        })
    }

    pub async fn update_project(
        &self,
        id: ProjectId,
        name: &str,
        description: &str,
    ) -> Result<Option<Project>> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE projects SET name = ?1, description = ?2 WHERE id = ?3",
                params![name, description, id as i64],
            )
            .await?;
        if changed == 0 {
            return Ok(None);
        }
        Ok(Some(Project {
            id,
            name: name.to_string(),
            description: description.to_string(),
        }))
    }

    pub async fn delete_project(&self, id: ProjectId) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn
            .execute("DELETE FROM projects WHERE id = ?1", params![id as i64])
            .await?;
        Ok(changed > 0)
    }

    // ------------------------------------------------------------------
    // Building objects
    // ------------------------------------------------------------------

    pub async fn buildings_in_project(&self, project: ProjectId) -> Result<Vec<BuildingObject>> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                "SELECT id, project_id, name, location FROM buildings
                 WHERE project_id = ?1 ORDER BY id",
                params![project as i64],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(building_from_row(&row)?);
        }
        Ok(out)
    }

    /// Resolve an id scope from the collection filter into rows. Ids that
    /// do not exist under this project are silently dropped — a grant can
    /// outlive its building.
    pub async fn buildings_by_ids(
        &self,
        project: ProjectId,
        ids: &BTreeSet<u64>,
    ) -> Result<Vec<BuildingObject>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn()?;
        let list = join_ids(ids);
        let sql = format!(
            "SELECT id, project_id, name, location FROM buildings
             WHERE project_id = ?1 AND id IN ({list}) ORDER BY id"
        );
        let mut rows = conn.query(&sql, params![project as i64]).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(building_from_row(&row)?);
        }
        Ok(out)
    }

    /// Fetch one building, checking it really belongs to `project`.
    pub async fn building(
        &self,
        project: ProjectId,
        building: BuildingId,
    ) -> Result<Option<BuildingObject>> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                "SELECT id, project_id, name, location FROM buildings
                 WHERE id = ?1 AND project_id = ?2",
                params![building as i64, project as i64],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(building_from_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn create_building(
        &self,
        project: ProjectId,
        name: &str,
        location: &str,
    ) -> Result<BuildingObject> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO buildings (project_id, name, location) VALUES (?1, ?2, ?3)",
            params![project as i64, name, location],
        )
        .await?;
        Ok(BuildingObject {
            id: conn.last_insert_rowid() as u64,
            project_id: project,
            name: name.to_string(),
            location: location.to_string(),
        })
    }

    pub async fn update_building(
        &self,
        project: ProjectId,
        building: BuildingId,
        name: &str,
        location: &str,
    ) -> Result<Option<BuildingObject>> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE buildings SET name = ?1, location = ?2
                 WHERE id = ?3 AND project_id = ?4",
                params![name, location, building as i64, project as i64],
            )
            .await?;
        if changed == 0 {
            return Ok(None);
        }
        Ok(Some(BuildingObject {
            id: building,
            project_id: project,
            name: name.to_string(),
            location: location.to_string(),
        }))
    }

    pub async fn delete_building(&self, project: ProjectId, building: BuildingId) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "DELETE FROM buildings WHERE id = ?1 AND project_id = ?2",
                params![building as i64, project as i64],
            )
            .await?;
        Ok(changed > 0)
    }

    // ------------------------------------------------------------------
    // Data points and responsible users
    // ------------------------------------------------------------------

    pub async fn data_points(&self, building: BuildingId) -> Result<Vec<DataPoint>> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                "SELECT id, building_id, recorded_at, value, kind, unit, device
                 FROM data_points WHERE building_id = ?1 ORDER BY id",
                params![building as i64],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(data_point_from_row(&row)?);
        }
        Ok(out)
    }

    pub async fn insert_data_point(
        &self,
        building: BuildingId,
        value: f64,
        kind: &str,
        unit: &str,
        device: &str,
    ) -> Result<DataPoint> {
        let conn = self.conn()?;
        let recorded_at = jiff::Timestamp::now().to_string();
        conn.execute(
            "INSERT INTO data_points (building_id, recorded_at, value, kind, unit, device)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![building as i64, recorded_at.as_str(), value, kind, unit, device],
        )
        .await?;
        Ok(DataPoint {
            id: conn.last_insert_rowid() as u64,
            building_id: building,
            recorded_at,
            value,
            kind: kind.to_string(),
            unit: unit.to_string(),
            device: device.to_string(),
        })
    }

    pub async fn responsible_users(&self, building: BuildingId) -> Result<Vec<User>> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                "SELECT u.id, u.full_name, u.email, u.is_staff, u.is_superuser
                 FROM users u
                 JOIN building_users bu ON bu.user_id = u.id
                 WHERE bu.building_id = ?1 ORDER BY u.id",
                params![building as i64],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(user_from_row(&row)?);
        }
        Ok(out)
    }

    pub async fn create_user(
        &self,
        full_name: &str,
        email: &str,
        is_staff: bool,
        is_superuser: bool,
    ) -> Result<User> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (full_name, email, is_staff, is_superuser)
             VALUES (?1, ?2, ?3, ?4)",
            params![full_name, email, is_staff as i64, is_superuser as i64],
        )
        .await?;
        Ok(User {
            id: conn.last_insert_rowid() as u64,
            full_name: full_name.to_string(),
            email: email.to_string(),
            is_staff,
            is_superuser,
        })
    }

    pub async fn assign_user(&self, building: BuildingId, user: u64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO building_users (building_id, user_id) VALUES (?1, ?2)",
            params![building as i64, user as i64],
        )
        .await?;
        Ok(())
    }

    /// Provision one codename for a user. The string form is produced by
    /// the codec, never assembled at a call site.
    pub async fn grant(&self, user: u64, codename: &Codename) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO user_grants (user_id, codename) VALUES (?1, ?2)",
            params![user as i64, codename.to_string()],
        )
        .await?;
        Ok(())
    }
}

impl GrantStore for Store {
    /// One flags query plus one codename query, returned as an immutable
    /// per-request snapshot. An unknown caller id is an auth failure, not
    /// an empty snapshot.
    async fn grants_for(&self, caller_id: u64) -> Result<CallerGrants> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                "SELECT is_staff, is_superuser FROM users WHERE id = ?1",
                params![caller_id as i64],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Err(Error::Unauthorized);
        };
        let is_staff: i64 = row.get(0)?;
        let is_superuser: i64 = row.get(1)?;

        let mut grants = CallerGrants {
            is_staff: is_staff != 0,
            is_superuser: is_superuser != 0,
            ..CallerGrants::default()
        };

        let mut rows = conn
            .query(
                "SELECT codename FROM user_grants WHERE user_id = ?1",
                params![caller_id as i64],
            )
            .await?;
        while let Some(row) = rows.next().await? {
            grants.codenames.insert(row.get::<String>(0)?);
        }
        Ok(grants)
    }
}

fn join_ids(ids: &BTreeSet<u64>) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn project_from_row(row: &libsql::Row) -> Result<Project> {
    Ok(Project {
        id: row.get::<i64>(0)? as u64,
        name: row.get(1)?,
        description: row.get(2)?,
    })
}

fn building_from_row(row: &libsql::Row) -> Result<BuildingObject> {
    Ok(BuildingObject {
        id: row.get::<i64>(0)? as u64,
        project_id: row.get::<i64>(1)? as u64,
        name: row.get(2)?,
        location: row.get(3)?,
    })
}

fn data_point_from_row(row: &libsql::Row) -> Result<DataPoint> {
    Ok(DataPoint {
        id: row.get::<i64>(0)? as u64,
        building_id: row.get::<i64>(1)? as u64,
        recorded_at: row.get(2)?,
        value: row.get(3)?,
        kind: row.get(4)?,
        unit: row.get(5)?,
        device: row.get(6)?,
    })
}

fn user_from_row(row: &libsql::Row) -> Result<User> {
    Ok(User {
        id: row.get::<i64>(0)? as u64,
        full_name: row.get(1)?,
        email: row.get(2)?,
        is_staff: row.get::<i64>(3)? != 0,
        is_superuser: row.get::<i64>(4)? != 0,
    })
}
