//! Tests for the note service.

use super::*;
use crate::domain::ports::{MockIdentityProvider, MockNoteRepository, MockOrganizationRepository};
use crate::domain::{ErrorCode, Membership, OrgRole};
use crate::test_support::MutableClock;
use chrono::Utc;
use rstest::{fixture, rstest};

type Service = NoteService<MockNoteRepository, MockOrganizationRepository, MockIdentityProvider>;

#[fixture]
fn draft() -> NoteDraft {
    NoteDraft::new("Quarterly plan", "Ship the thing").expect("valid draft")
}

fn with_role(org_id: OrganizationId, caller: UserId, role: OrgRole) -> MockOrganizationRepository {
    let mut repo = MockOrganizationRepository::new();
    repo.expect_find_membership().returning(move |_, _| {
        Ok(Some(Membership {
            user_id: caller,
            org_id,
            role,
            joined_at: Utc::now(),
        }))
    });
    repo
}

fn make_service(
    notes: MockNoteRepository,
    organizations: MockOrganizationRepository,
    identity: MockIdentityProvider,
) -> Service {
    NoteService::new(
        Arc::new(notes),
        Arc::new(organizations),
        Arc::new(identity),
        Arc::new(MutableClock::fixed()),
    )
}

fn note_by(author: UserId, org_id: OrganizationId) -> Note {
    let draft = NoteDraft::new("Existing", "Body").expect("valid draft");
    Note::create(&draft, author, org_id, Utc::now())
}

#[rstest]
#[tokio::test]
async fn viewers_cannot_create_notes(draft: NoteDraft) {
    let caller = UserId::random();
    let org_id = OrganizationId::random();
    let mut notes = MockNoteRepository::new();
    notes.expect_insert().never();
    let service = make_service(
        notes,
        with_role(org_id, caller, OrgRole::Viewer),
        MockIdentityProvider::new(),
    );

    let err = service
        .create_note(&caller, &org_id, &draft)
        .await
        .expect_err("viewer");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn members_create_open_notes(draft: NoteDraft) {
    let caller = UserId::random();
    let org_id = OrganizationId::random();
    let mut notes = MockNoteRepository::new();
    notes.expect_insert().times(1).return_once(|_| Ok(()));
    let service = make_service(
        notes,
        with_role(org_id, caller, OrgRole::Member),
        MockIdentityProvider::new(),
    );

    let note = service
        .create_note(&caller, &org_id, &draft)
        .await
        .expect("created");

    assert_eq!(note.status, NoteStatus::Open);
    assert_eq!(note.author_id, caller);
}

#[rstest]
#[case(OrgRole::Member, false)]
#[case(OrgRole::Admin, true)]
#[case(OrgRole::Owner, true)]
#[tokio::test]
async fn non_authors_need_moderator_role(draft: NoteDraft, #[case] role: OrgRole, #[case] allowed: bool) {
    let caller = UserId::random();
    let org_id = OrganizationId::random();
    let note = note_by(UserId::random(), org_id);
    let mut notes = MockNoteRepository::new();
    notes.expect_find_by_id().return_once(move |_| Ok(Some(note)));
    notes.expect_update().returning(|_| Ok(true));
    let service = make_service(notes, with_role(org_id, caller, role), MockIdentityProvider::new());

    let result = service.update_note(&caller, &NoteId::random(), &draft).await;

    match (allowed, result) {
        (true, Ok(_)) => {}
        (false, Err(err)) => assert_eq!(err.code(), ErrorCode::Forbidden),
        (_, other) => panic!("unexpected outcome: {other:?}"),
    }
}

#[rstest]
#[tokio::test]
async fn author_viewer_may_toggle_own_note() {
    let caller = UserId::random();
    let org_id = OrganizationId::random();
    let note = note_by(caller, org_id);
    let mut notes = MockNoteRepository::new();
    notes.expect_find_by_id().return_once(move |_| Ok(Some(note)));
    notes
        .expect_update()
        .withf(|note| note.status == NoteStatus::Closed)
        .times(1)
        .return_once(|_| Ok(true));
    let service = make_service(
        notes,
        with_role(org_id, caller, OrgRole::Viewer),
        MockIdentityProvider::new(),
    );

    let toggled = service
        .toggle_note_status(&caller, &NoteId::random())
        .await
        .expect("toggled");

    assert_eq!(toggled.status, NoteStatus::Closed);
}

#[rstest]
#[tokio::test]
async fn outsiders_see_not_found() {
    let note = note_by(UserId::random(), OrganizationId::random());
    let mut notes = MockNoteRepository::new();
    notes.expect_find_by_id().return_once(move |_| Ok(Some(note)));
    notes.expect_list_comments().never();
    let mut organizations = MockOrganizationRepository::new();
    organizations
        .expect_find_membership()
        .return_once(|_, _| Ok(None));
    let service = make_service(notes, organizations, MockIdentityProvider::new());

    let err = service
        .get_note(&UserId::random(), &NoteId::random())
        .await
        .expect_err("not a member");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn reply_parent_must_share_the_note() {
    let caller = UserId::random();
    let org_id = OrganizationId::random();
    let note = note_by(caller, org_id);
    let foreign = Comment::create(
        &CommentBody::new("elsewhere").expect("valid"),
        caller,
        NoteId::random(),
        None,
        Utc::now(),
    );
    let mut notes = MockNoteRepository::new();
    notes.expect_find_by_id().return_once(move |_| Ok(Some(note)));
    let foreign_id = foreign.id;
    notes
        .expect_find_comment()
        .return_once(move |_| Ok(Some(foreign)));
    notes.expect_insert_comment().never();
    let service = make_service(
        notes,
        with_role(org_id, caller, OrgRole::Member),
        MockIdentityProvider::new(),
    );

    let err = service
        .add_comment(
            &caller,
            &NoteId::random(),
            &CommentBody::new("reply").expect("valid"),
            Some(foreign_id),
        )
        .await
        .expect_err("foreign parent");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn detail_threads_comments() {
    let caller = UserId::random();
    let org_id = OrganizationId::random();
    let note = note_by(caller, org_id);
    let body = CommentBody::new("hello").expect("valid");
    let root = Comment::create(&body, caller, note.id, None, Utc::now());
    let reply = Comment::create(&body, caller, note.id, Some(root.id), Utc::now());
    let mut notes = MockNoteRepository::new();
    notes.expect_find_by_id().return_once(move |_| Ok(Some(note)));
    notes
        .expect_list_comments()
        .return_once(move |_| Ok(vec![root, reply]));
    let mut identity = MockIdentityProvider::new();
    identity.expect_find_users().return_once(|_| Ok(Vec::new()));
    let service = make_service(notes, with_role(org_id, caller, OrgRole::Viewer), identity);

    let detail = service
        .get_note(&caller, &NoteId::random())
        .await
        .expect("detail");

    assert_eq!(detail.comments.len(), 1);
    assert_eq!(detail.comments[0].replies.len(), 1);
    assert_eq!(detail.author_name, "");
}

#[rstest]
#[tokio::test]
async fn members_cannot_delete_others_comments() {
    let caller = UserId::random();
    let org_id = OrganizationId::random();
    let note = note_by(caller, org_id);
    let comment = Comment::create(
        &CommentBody::new("not yours").expect("valid"),
        UserId::random(),
        note.id,
        None,
        Utc::now(),
    );
    let mut notes = MockNoteRepository::new();
    notes
        .expect_find_comment()
        .return_once(move |_| Ok(Some(comment)));
    notes.expect_find_by_id().return_once(move |_| Ok(Some(note)));
    notes.expect_delete_comment().never();
    let service = make_service(
        notes,
        with_role(org_id, caller, OrgRole::Member),
        MockIdentityProvider::new(),
    );

    let err = service
        .delete_comment(&caller, &CommentId::random())
        .await
        .expect_err("not author");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}
