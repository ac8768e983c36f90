//! Per-request access decisions as seen over HTTP.

use super::harness::{deploy, get, request};

#[tokio::test]
async fn requests_without_token_are_unauthorized() {
    let d = deploy().await;
    let (status, _) = get(d.addr(), "/api/projects", None).await;
    assert_eq!(status, 401);

    let (status, _) = get(
        d.addr(),
        &format!("/api/projects/{}", d.data.project_a),
        None,
    )
    .await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn unknown_caller_is_unauthorized() {
    let d = deploy().await;
    let token = d.token_for(999_999);
    let (status, _) = get(d.addr(), "/api/projects", Some(&token)).await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn staff_override_reaches_everything() {
    let d = deploy().await;
    let token = d.token_for(d.data.admin);
    let factory = d.data.buildings_a[0];

    for path in [
        format!("/api/projects/{}", d.data.project_a),
        format!("/api/projects/{}", d.data.project_b),
        format!("/api/projects/{}/buildings/{}", d.data.project_a, factory),
        format!(
            "/api/projects/{}/buildings/{}/data-points",
            d.data.project_a, factory
        ),
        format!(
            "/api/projects/{}/buildings/{}/users",
            d.data.project_a, factory
        ),
    ] {
        let (status, body) = get(d.addr(), &path, Some(&token)).await;
        assert_eq!(status, 200, "GET {path} -> {body}");
    }

    let (status, _) = request(
        d.addr(),
        "PUT",
        &format!("/api/projects/{}", d.data.project_a),
        Some(&token),
        Some(r#"{"name":"Riverside Plant","description":"renamed"}"#),
    )
    .await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn project_reader_reads_the_whole_subtree() {
    let d = deploy().await;
    let token = d.token_for(d.data.project_reader);
    let p = d.data.project_a;

    let (status, _) = get(d.addr(), &format!("/api/projects/{p}"), Some(&token)).await;
    assert_eq!(status, 200);

    // The project-wide grant reaches every building and its content, even
    // ones no building-scoped codename mentions.
    for b in &d.data.buildings_a {
        let (status, _) = get(
            d.addr(),
            &format!("/api/projects/{p}/buildings/{b}"),
            Some(&token),
        )
        .await;
        assert_eq!(status, 200);

        let (status, _) = get(
            d.addr(),
            &format!("/api/projects/{p}/buildings/{b}/data-points"),
            Some(&token),
        )
        .await;
        assert_eq!(status, 200);
    }

    // But not the other project.
    let (status, _) = get(
        d.addr(),
        &format!("/api/projects/{}", d.data.project_b),
        Some(&token),
    )
    .await;
    assert_eq!(status, 403);

    // And read is not update.
    let (status, _) = request(
        d.addr(),
        "PUT",
        &format!("/api/projects/{p}"),
        Some(&token),
        Some(r#"{"name":"x","description":""}"#),
    )
    .await;
    assert_eq!(status, 403);

    let (status, _) = request(
        d.addr(),
        "POST",
        &format!("/api/projects/{p}/buildings"),
        Some(&token),
        Some(r#"{"name":"Shed","location":"yard"}"#),
    )
    .await;
    assert_eq!(status, 403);
}

#[tokio::test]
async fn building_reader_cannot_reach_up_or_sideways() {
    let d = deploy().await;
    let token = d.token_for(d.data.building_reader);
    let p = d.data.project_a;
    let granted = d.data.buildings_a[0];
    let ungranted = d.data.buildings_a[2];

    // Not the project itself.
    let (status, _) = get(d.addr(), &format!("/api/projects/{p}"), Some(&token)).await;
    assert_eq!(status, 403);

    // The granted building and its content.
    let (status, _) = get(
        d.addr(),
        &format!("/api/projects/{p}/buildings/{granted}"),
        Some(&token),
    )
    .await;
    assert_eq!(status, 200);
    let (status, _) = get(
        d.addr(),
        &format!("/api/projects/{p}/buildings/{granted}/data-points"),
        Some(&token),
    )
    .await;
    assert_eq!(status, 200);

    // Not a sibling building.
    let (status, _) = get(
        d.addr(),
        &format!("/api/projects/{p}/buildings/{ungranted}"),
        Some(&token),
    )
    .await;
    assert_eq!(status, 403);
    let (status, _) = get(
        d.addr(),
        &format!("/api/projects/{p}/buildings/{ungranted}/data-points"),
        Some(&token),
    )
    .await;
    assert_eq!(status, 403);
}

#[tokio::test]
async fn manager_mutates_buildings_but_cannot_read_content() {
    let d = deploy().await;
    let token = d.token_for(d.data.manager);
    let p = d.data.project_a;
    let factory = d.data.buildings_a[0];
    let warehouse = d.data.buildings_a[2];

    let (status, body) = request(
        d.addr(),
        "POST",
        &format!("/api/projects/{p}/buildings"),
        Some(&token),
        Some(r#"{"name":"New Hall","location":"Mill Road 27"}"#),
    )
    .await;
    assert_eq!(status, 201, "{body}");

    let (status, _) = request(
        d.addr(),
        "PUT",
        &format!("/api/projects/{p}/buildings/{factory}"),
        Some(&token),
        Some(r#"{"name":"Factory Hall","location":"Mill Road 21A"}"#),
    )
    .await;
    assert_eq!(status, 200);

    let (status, _) = request(
        d.addr(),
        "DELETE",
        &format!("/api/projects/{p}/buildings/{warehouse}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, 204);

    // Content mutation rides on the building-update grant.
    let (status, _) = request(
        d.addr(),
        "POST",
        &format!("/api/projects/{p}/buildings/{factory}/data-points"),
        Some(&token),
        Some(r#"{"value":22.1,"kind":"TEMP","unit":"C","device":"dev9"}"#),
    )
    .await;
    assert_eq!(status, 201);

    // Management grants carry no read access.
    let (status, _) = get(
        d.addr(),
        &format!("/api/projects/{p}/buildings/{factory}/data-points"),
        Some(&token),
    )
    .await;
    assert_eq!(status, 403);
    let (status, _) = get(d.addr(), &format!("/api/projects/{p}"), Some(&token)).await;
    assert_eq!(status, 403);
}

#[tokio::test]
async fn project_lifecycle_is_staff_only() {
    let d = deploy().await;
    let manager = d.token_for(d.data.manager);
    let admin = d.token_for(d.data.admin);

    let (status, _) = request(
        d.addr(),
        "POST",
        "/api/projects",
        Some(&manager),
        Some(r#"{"name":"Side Project","description":""}"#),
    )
    .await;
    assert_eq!(status, 403);

    let (status, body) = request(
        d.addr(),
        "POST",
        "/api/projects",
        Some(&admin),
        Some(r#"{"name":"Side Project","description":""}"#),
    )
    .await;
    assert_eq!(status, 201);
    let created: serde_json::Value = serde_json::from_str(&body).unwrap();
    let id = created["id"].as_u64().unwrap();

    let (status, _) = request(
        d.addr(),
        "DELETE",
        &format!("/api/projects/{id}"),
        Some(&manager),
        None,
    )
    .await;
    assert_eq!(status, 403);

    let (status, _) = request(
        d.addr(),
        "DELETE",
        &format!("/api/projects/{id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, 204);
}

#[tokio::test]
async fn mismatched_ancestry_is_not_found() {
    let d = deploy().await;
    let token = d.token_for(d.data.admin);
    let factory = d.data.buildings_a[0];

    // Factory lives under project A, not project B.
    let (status, _) = get(
        d.addr(),
        &format!(
            "/api/projects/{}/buildings/{}/data-points",
            d.data.project_b, factory
        ),
        Some(&token),
    )
    .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn malformed_ids_are_bad_requests() {
    let d = deploy().await;
    let token = d.token_for(d.data.admin);

    for path in ["/api/projects/01", "/api/projects/abc", "/api/projects/-1"] {
        let (status, _) = get(d.addr(), path, Some(&token)).await;
        assert_eq!(status, 400, "GET {path}");
    }
}
