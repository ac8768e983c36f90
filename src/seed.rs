//! Demo data seeding.
//!
//! Provisions a small deployment for local runs and integration tests:
//! projects, building objects, users, sensor readings, and the grants that
//! tie them together. Grants are always built through [`Codename`] so the
//! seeded strings stay byte-compatible with what the evaluator expects.

use tracing::info;

use crate::codename::Codename;
use crate::store::Store;

/// Ids of the seeded rows, for tests and for logging.
#[derive(Debug, Clone)]
pub struct DemoData {
    pub admin: u64,
    /// Holds a project-wide read grant on `project_a`.
    pub project_reader: u64,
    /// Holds read grants on two specific buildings of `project_a`.
    pub building_reader: u64,
    /// Holds the building-management grants on `project_a`.
    pub manager: u64,
    pub project_a: u64,
    pub project_b: u64,
    pub buildings_a: Vec<u64>,
    pub building_b: u64,
}

/// Create the schema and load the demo dataset.
pub async fn demo(store: &Store) -> crate::Result<DemoData> {
    store.init_schema().await?;

    let project_a = store
        .create_project("Riverside Plant", "Production site with office annex")
        .await?;
    let project_b = store
        .create_project("Harbor Offices", "Leased office floors")
        .await?;

    let factory = store
        .create_building(project_a.id, "Factory Hall", "Mill Road 21")
        .await?;
    let office = store
        .create_building(project_a.id, "Annex Office", "Mill Road 23")
        .await?;
    let warehouse = store
        .create_building(project_a.id, "Warehouse", "Mill Road 25")
        .await?;
    let harbor = store
        .create_building(project_b.id, "Pier House", "Quay 4")
        .await?;

    let admin = store
        .create_user("Dana Ozols", "dana@example.com", true, false)
        .await?;
    let project_reader = store
        .create_user("Mara Berzina", "mara@example.com", false, false)
        .await?;
    let building_reader = store
        .create_user("Janis Kalns", "janis@example.com", false, false)
        .await?;
    let manager = store
        .create_user("Ilze Liepa", "ilze@example.com", false, false)
        .await?;

    // Project-wide read on project A.
    store
        .grant(
            project_reader.id,
            &Codename::ProjectRead {
                project: project_a.id,
            },
        )
        .await?;

    // Building-scoped reads on two of project A's buildings.
    for building in [factory.id, office.id] {
        store
            .grant(
                building_reader.id,
                &Codename::BuildingRead {
                    project: project_a.id,
                    building,
                },
            )
            .await?;
    }

    // Building management on project A.
    store
        .grant(
            manager.id,
            &Codename::BuildingCreate {
                project: project_a.id,
            },
        )
        .await?;
    store
        .grant(
            manager.id,
            &Codename::BuildingUpdate {
                project: project_a.id,
            },
        )
        .await?;
    store
        .grant(
            manager.id,
            &Codename::BuildingDelete {
                project: project_a.id,
            },
        )
        .await?;

    store.assign_user(factory.id, building_reader.id).await?;
    store.assign_user(office.id, project_reader.id).await?;

    for (value, kind, unit, device) in [
        (21.5, "TEMP", "°C", "dev1"),
        (640.0, "CO2", "ppm", "dev1"),
        (48.0, "HUM", "%", "dev1"),
        (1250.0, "EC", "kWh", "dev2"),
    ] {
        store
            .insert_data_point(factory.id, value, kind, unit, device)
            .await?;
    }
    store
        .insert_data_point(harbor.id, 19.8, "TEMP", "°C", "dev3")
        .await?;

    info!(
        "Seeded demo data: projects {} and {}",
        project_a.id, project_b.id
    );

    Ok(DemoData {
        admin: admin.id,
        project_reader: project_reader.id,
        building_reader: building_reader.id,
        manager: manager.id,
        project_a: project_a.id,
        project_b: project_b.id,
        buildings_a: vec![factory.id, office.id, warehouse.id],
        building_b: harbor.id,
    })
}
