//! Collection scoping: listings show exactly what the caller may see.

use super::harness::{deploy, get, ids_of};

#[tokio::test]
async fn building_listing_matches_the_granted_ids() {
    let d = deploy().await;
    let token = d.token_for(d.data.building_reader);
    let p = d.data.project_a;

    let (status, body) = get(
        d.addr(),
        &format!("/api/projects/{p}/buildings"),
        Some(&token),
    )
    .await;
    assert_eq!(status, 200);
    // The seeder grants reads on the first two buildings only.
    assert_eq!(ids_of(&body), d.data.buildings_a[..2].to_vec());
}

#[tokio::test]
async fn broad_grants_list_every_building() {
    let d = deploy().await;
    let p = d.data.project_a;

    for user in [d.data.project_reader, d.data.manager, d.data.admin] {
        let token = d.token_for(user);
        let (status, body) = get(
            d.addr(),
            &format!("/api/projects/{p}/buildings"),
            Some(&token),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(ids_of(&body), d.data.buildings_a, "user {user}");
    }
}

#[tokio::test]
async fn project_listing_shows_only_footholds() {
    let d = deploy().await;

    let (status, body) = get(
        d.addr(),
        "/api/projects",
        Some(&d.token_for(d.data.building_reader)),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(ids_of(&body), vec![d.data.project_a]);

    let (status, body) = get(
        d.addr(),
        "/api/projects",
        Some(&d.token_for(d.data.manager)),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(ids_of(&body), vec![d.data.project_a]);

    let (status, body) = get(d.addr(), "/api/projects", Some(&d.token_for(d.data.admin))).await;
    assert_eq!(status, 200);
    assert_eq!(ids_of(&body), vec![d.data.project_a, d.data.project_b]);
}

#[tokio::test]
async fn caller_without_grants_sees_empty_listings() {
    let d = deploy().await;
    let nobody = d
        .store
        .create_user("No Grants", "nobody@example.com", false, false)
        .await
        .expect("failed to create user");
    let token = d.token_for(nobody.id);

    let (status, body) = get(d.addr(), "/api/projects", Some(&token)).await;
    assert_eq!(status, 200);
    assert!(ids_of(&body).is_empty());

    let (status, body) = get(
        d.addr(),
        &format!("/api/projects/{}/buildings", d.data.project_a),
        Some(&token),
    )
    .await;
    assert_eq!(status, 200);
    assert!(ids_of(&body).is_empty());
}

#[tokio::test]
async fn responsible_users_share_the_content_scope() {
    let d = deploy().await;
    let p = d.data.project_a;
    let factory = d.data.buildings_a[0];
    let office = d.data.buildings_a[1];

    // The building reader may list who is responsible for their buildings.
    let token = d.token_for(d.data.building_reader);
    let (status, body) = get(
        d.addr(),
        &format!("/api/projects/{p}/buildings/{factory}/users"),
        Some(&token),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(ids_of(&body), vec![d.data.building_reader]);

    let (status, body) = get(
        d.addr(),
        &format!("/api/projects/{p}/buildings/{office}/users"),
        Some(&token),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(ids_of(&body), vec![d.data.project_reader]);

    // The manager holds no read grant at all.
    let token = d.token_for(d.data.manager);
    let (status, _) = get(
        d.addr(),
        &format!("/api/projects/{p}/buildings/{factory}/users"),
        Some(&token),
    )
    .await;
    assert_eq!(status, 403);
}
