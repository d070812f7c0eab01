//! Tests for organization handlers.

use super::*;
use crate::domain::{Membership, MembershipWithOrganization, Organization};
use crate::inbound::http::test_utils::{MockPorts, session_cookie, signed_in, test_app};
use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use chrono::{TimeZone, Utc};
use rstest::rstest;
use serde_json::{Value, json};

fn acme(owner: UserId) -> Organization {
    let name = OrganizationName::new("Acme Corp").expect("valid name");
    Organization::create(&name, owner, Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).single().expect("time"))
}

fn membership(org: &Organization, user: UserId, role: OrgRole) -> Membership {
    Membership {
        user_id: user,
        org_id: org.id,
        role,
        joined_at: org.created_at,
    }
}

#[actix_web::test]
async fn requests_without_a_session_are_rejected() {
    let app = actix_test::init_service(test_app(MockPorts::default().into_state())).await;

    let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/api/v1/orgs").to_request()).await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn create_makes_the_new_org_active() {
    let owner = UserId::random();
    let org = acme(owner);
    let created = org.clone();
    let mut ports = MockPorts::default();
    ports
        .organizations
        .expect_create_organization()
        .withf(|_, name| name.slug() == "acme-corp")
        .return_once(move |_, _| Ok(created));
    let listed = MembershipWithOrganization {
        membership: membership(&org, owner, OrgRole::Owner),
        organization: org.clone(),
    };
    let org_id = org.id;
    ports
        .organizations_query
        .expect_resolve_active()
        .withf(move |_, pointer| *pointer == Some(org_id))
        .return_once(move |_, _| Ok(Some(listed)));
    let app = actix_test::init_service(test_app(ports.into_state())).await;
    let cookie = signed_in(&app, &owner).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/orgs")
            .cookie(cookie)
            .set_json(json!({ "name": "Acme Corp" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let cookie = session_cookie(&res);

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/orgs/active")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["active"]["organization"]["slug"], json!("acme-corp"));
    assert_eq!(body["active"]["role"], json!("OWNER"));
}

#[rstest]
#[case("A")]
#[case("!!!")]
#[actix_web::test]
async fn invalid_names_never_reach_the_service(#[case] name: &str) {
    let app = actix_test::init_service(test_app(MockPorts::default().into_state())).await;
    let cookie = signed_in(&app, &UserId::random()).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/orgs")
            .cookie(cookie)
            .set_json(json!({ "name": name }))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["details"]["field"], json!("name"));
}

#[actix_web::test]
async fn malformed_org_ids_are_bad_requests() {
    let app = actix_test::init_service(test_app(MockPorts::default().into_state())).await;
    let cookie = signed_in(&app, &UserId::random()).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/orgs/not-a-uuid")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["details"]["field"], json!("orgId"));
}

#[actix_web::test]
async fn switching_to_a_foreign_org_is_not_found() {
    let mut ports = MockPorts::default();
    ports
        .organizations
        .expect_switch_active()
        .return_once(|_, _| Err(Error::not_found("organization not found")));
    let app = actix_test::init_service(test_app(ports.into_state())).await;
    let cookie = signed_in(&app, &UserId::random()).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri(&format!("/api/v1/orgs/{}/switch", OrganizationId::random()))
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[rstest]
#[case("OWNER", true)]
#[case("ADMIN", true)]
#[case("GOD", false)]
#[actix_web::test]
async fn role_changes_parse_the_role(#[case] role: &str, #[case] reaches_service: bool) {
    let owner = UserId::random();
    let target = UserId::random();
    let org = acme(owner);
    let org_id = org.id;
    let mut ports = MockPorts::default();
    ports
        .organizations
        .expect_change_member_role()
        .times(usize::from(reaches_service))
        .returning(move |_, _, _, role| {
            if role == OrgRole::Owner {
                return Err(Error::invalid_request("cannot assign owner"));
            }
            Ok(membership(&org, target, role))
        });
    let app = actix_test::init_service(test_app(ports.into_state())).await;
    let cookie = signed_in(&app, &owner).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::patch()
            .uri(&format!("/api/v1/orgs/{org_id}/members/{target}"))
            .cookie(cookie)
            .set_json(json!({ "role": role }))
            .to_request(),
    )
    .await;

    let expected = if role == "ADMIN" { StatusCode::OK } else { StatusCode::BAD_REQUEST };
    assert_eq!(res.status(), expected);
}

#[actix_web::test]
async fn deleting_the_active_org_clears_the_pointer() {
    let owner = UserId::random();
    let org = acme(owner);
    let org_id = org.id;
    let mut ports = MockPorts::default();
    ports
        .organizations
        .expect_switch_active()
        .return_once(move |_, _| Ok(membership(&org, owner, OrgRole::Owner)));
    ports
        .organizations
        .expect_delete_organization()
        .return_once(|_, _| Ok(()));
    ports
        .organizations_query
        .expect_resolve_active()
        .withf(|_, pointer| pointer.is_none())
        .return_once(|_, _| Ok(None));
    let app = actix_test::init_service(test_app(ports.into_state())).await;
    let cookie = signed_in(&app, &owner).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri(&format!("/api/v1/orgs/{org_id}/switch"))
            .cookie(cookie)
            .to_request(),
    )
    .await;
    let cookie = session_cookie(&res);
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::delete()
            .uri(&format!("/api/v1/orgs/{org_id}"))
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = session_cookie(&res);

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/orgs/active")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["active"], Value::Null);
}
