//! Notes and threaded comments across roles.

mod support;

use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{Method, StatusCode};
use actix_web::test as actix_test;
use chrono::TimeDelta;
use serde_json::json;

use support::{Agent, World, id_of};

/// Create an organization owned by `owner` and pull `member` in with `role`.
async fn team<S>(world: &World, app: &S, owner: &mut Agent, member: &mut Agent, email: &str, role: &str) -> String
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let org_id = id_of(
        &owner
            .post(app, "/orgs", json!({ "name": "Notebook" }))
            .await
            .expect(StatusCode::CREATED),
    );
    owner
        .post(
            app,
            &format!("/orgs/{org_id}/invites"),
            json!({ "email": email, "role": role }),
        )
        .await
        .expect(StatusCode::CREATED);
    let token = world.mailer.token_for(email);
    member
        .post(app, &format!("/invites/{token}/accept"), json!({}))
        .await
        .expect(StatusCode::OK);
    org_id
}

#[actix_web::test]
async fn comments_form_a_thread_under_the_note() {
    let world = World::new();
    let app = actix_test::init_service(world.app()).await;
    let (mut owner, _) = Agent::sign_up(&app, "owner@example.com", "Olive").await;
    let (mut member, _) = Agent::sign_up(&app, "member@example.com", "Mo").await;
    let org_id = team(&world, &app, &mut owner, &mut member, "member@example.com", "MEMBER").await;

    let note = member
        .post(
            &app,
            &format!("/orgs/{org_id}/notes"),
            json!({ "title": "Launch plan", "content": "Ship on Friday" }),
        )
        .await
        .expect(StatusCode::CREATED);
    assert_eq!(note["status"], "OPEN");
    let note_id = id_of(&note);
    let comments = format!("/notes/{note_id}/comments");

    let root = owner
        .post(&app, &comments, json!({ "content": "Which Friday?" }))
        .await
        .expect(StatusCode::CREATED);
    world.clock.advance(TimeDelta::minutes(5));
    let reply = member
        .post(
            &app,
            &comments,
            json!({ "content": "This one", "parentId": id_of(&root) }),
        )
        .await
        .expect(StatusCode::CREATED);
    assert_eq!(reply["parentId"], root["id"]);

    let detail = owner
        .get(&app, &format!("/notes/{note_id}"))
        .await
        .expect(StatusCode::OK);
    assert_eq!(detail["authorName"], "Mo");
    let thread = detail["comments"].as_array().expect("comment thread");
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0]["authorName"], "Olive");
    assert_eq!(thread[0]["replies"][0]["content"], "This one");

    let listed = owner
        .get(&app, &format!("/orgs/{org_id}/notes"))
        .await
        .expect(StatusCode::OK);
    assert_eq!(listed[0]["commentCount"], 2);

    owner
        .call(&app, Method::DELETE, &format!("/comments/{}", id_of(&root)), None)
        .await
        .expect(StatusCode::OK);
    let pruned = owner
        .get(&app, &format!("/notes/{note_id}"))
        .await
        .expect(StatusCode::OK);
    assert_eq!(pruned["comments"], json!([]));
}

#[actix_web::test]
async fn viewers_read_but_do_not_write() {
    let world = World::new();
    let app = actix_test::init_service(world.app()).await;
    let (mut owner, _) = Agent::sign_up(&app, "owner@example.com", "Olive").await;
    let (mut viewer, _) = Agent::sign_up(&app, "viewer@example.com", "Vera").await;
    let org_id = team(&world, &app, &mut owner, &mut viewer, "viewer@example.com", "VIEWER").await;

    let note_id = id_of(
        &owner
            .post(
                &app,
                &format!("/orgs/{org_id}/notes"),
                json!({ "title": "Budget", "content": "Numbers pending" }),
            )
            .await
            .expect(StatusCode::CREATED),
    );

    viewer
        .get(&app, &format!("/notes/{note_id}"))
        .await
        .expect(StatusCode::OK);

    let create = viewer
        .post(
            &app,
            &format!("/orgs/{org_id}/notes"),
            json!({ "title": "Mine", "content": "Not allowed" }),
        )
        .await;
    assert_eq!(create.status, StatusCode::FORBIDDEN);

    let comment = viewer
        .post(&app, &format!("/notes/{note_id}/comments"), json!({ "content": "hi" }))
        .await;
    assert_eq!(comment.status, StatusCode::FORBIDDEN);

    let toggle = viewer
        .post(&app, &format!("/notes/{note_id}/toggle-status"), json!({}))
        .await;
    assert_eq!(toggle.status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn status_filter_follows_toggles() {
    let world = World::new();
    let app = actix_test::init_service(world.app()).await;
    let (mut owner, _) = Agent::sign_up(&app, "owner@example.com", "Olive").await;
    let org_id = id_of(
        &owner
            .post(&app, "/orgs", json!({ "name": "Solo" }))
            .await
            .expect(StatusCode::CREATED),
    );
    let notes = format!("/orgs/{org_id}/notes");

    let first = id_of(
        &owner
            .post(&app, &notes, json!({ "title": "One", "content": "a" }))
            .await
            .expect(StatusCode::CREATED),
    );
    world.clock.advance(TimeDelta::minutes(1));
    owner
        .post(&app, &notes, json!({ "title": "Two", "content": "b" }))
        .await
        .expect(StatusCode::CREATED);

    let closed = owner
        .post(&app, &format!("/notes/{first}/toggle-status"), json!({}))
        .await
        .expect(StatusCode::OK);
    assert_eq!(closed["status"], "CLOSED");

    let open = owner
        .get(&app, &format!("{notes}?status=OPEN"))
        .await
        .expect(StatusCode::OK);
    assert_eq!(open.as_array().map(Vec::len), Some(1));
    assert_eq!(open[0]["title"], "Two");

    let bad = owner.get(&app, &format!("{notes}?status=ARCHIVED")).await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
}
