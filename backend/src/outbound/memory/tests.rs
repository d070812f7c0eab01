//! Behavioural tests for the in-memory store.

use chrono::{TimeDelta, TimeZone};
use rand::rngs::OsRng;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::{
    CampaignDraft, CommentBody, FieldDraft, FieldType, InviteRole, NoteDraft, OrganizationName,
    SubmissionId, SubmissionValue,
};

fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
        + TimeDelta::minutes(minutes)
}

struct Seeded {
    store: MemoryStore,
    org: Organization,
    owner: UserId,
}

#[fixture]
async fn seeded() -> Seeded {
    let store = MemoryStore::new();
    let owner = UserId::random();
    let org = Organization::create(
        &OrganizationName::new("Acme Corp").expect("valid name"),
        owner,
        at(0),
    );
    let membership = Membership {
        user_id: owner,
        org_id: org.id,
        role: OrgRole::Owner,
        joined_at: at(0),
    };
    OrganizationRepository::create_with_owner(&store, &org, &membership)
        .await
        .expect("create");
    Seeded { store, org, owner }
}

async fn add_note(seeded: &Seeded, minutes: i64) -> Note {
    let draft = NoteDraft::new("Title", "Body").expect("valid draft");
    let note = Note::create(&draft, seeded.owner, seeded.org.id, at(minutes));
    NoteRepository::insert(&seeded.store, &note).await.expect("insert note");
    note
}

async fn add_comment(seeded: &Seeded, note: &Note, parent: Option<CommentId>, minutes: i64) -> Comment {
    let body = CommentBody::new("reply").expect("valid body");
    let comment = Comment::create(&body, seeded.owner, note.id, parent, at(minutes));
    seeded.store.insert_comment(&comment).await.expect("insert comment");
    comment
}

async fn add_campaign(seeded: &Seeded) -> Campaign {
    let draft = CampaignDraft::new("Survey", None).expect("valid draft");
    let campaign = Campaign::create(
        draft,
        crate::domain::generate_public_slug(&mut OsRng),
        seeded.owner,
        seeded.org.id,
        at(0),
    );
    CampaignRepository::insert(&seeded.store, &campaign)
        .await
        .expect("insert campaign");
    campaign
}

async fn add_field(seeded: &Seeded, campaign: &Campaign, name: &str) -> CampaignField {
    let draft = FieldDraft::new(name, FieldType::Text, false, None).expect("valid field");
    let mut field = CampaignField::create(draft, campaign.id, 0);
    field.order = seeded.store.append_field(&field).await.expect("append field");
    field
}

#[rstest]
#[tokio::test]
async fn duplicate_slug_leaves_nothing_behind(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let intruder = UserId::random();
    let clash = Organization::create(
        &OrganizationName::new("Acme Corp").expect("valid name"),
        intruder,
        at(5),
    );
    let membership = Membership {
        user_id: intruder,
        org_id: clash.id,
        role: OrgRole::Owner,
        joined_at: at(5),
    };

    let err = seeded
        .store
        .create_with_owner(&clash, &membership)
        .await
        .expect_err("slug taken");

    assert_eq!(err, OrganizationRepositoryError::duplicate_slug("acme-corp"));
    let memberships = seeded
        .store
        .list_memberships_for_user(&intruder)
        .await
        .expect("list");
    assert!(memberships.is_empty());
}

#[rstest]
#[tokio::test]
async fn removing_all_memberships_spares_other_users(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let leaver = UserId::random();
    let invite = Invite::issue(
        seeded.org.id,
        seeded.owner,
        Email::new("leaver@example.com").expect("valid email"),
        InviteRole::Member,
        InviteToken::generate(&mut OsRng),
        at(0),
    );
    InviteRepository::insert(&seeded.store, &invite).await.expect("insert");
    let joined = Membership {
        user_id: leaver,
        org_id: seeded.org.id,
        role: OrgRole::Member,
        joined_at: at(1),
    };
    seeded.store.accept(&invite, &joined).await.expect("joined");

    let removed = seeded.store.remove_all_memberships(&leaver).await.expect("removed");

    assert_eq!(removed, 1);
    assert!(seeded.store.find_membership(&seeded.org.id, &leaver).await.expect("find").is_none());
    assert_eq!(seeded.store.count_members(&seeded.org.id).await.expect("count"), 1);
}

#[rstest]
#[tokio::test]
async fn deleting_a_note_removes_its_thread(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let note = add_note(&seeded, 1).await;
    let root = add_comment(&seeded, &note, None, 2).await;
    let reply = add_comment(&seeded, &note, Some(root.id), 3).await;
    add_comment(&seeded, &note, Some(reply.id), 4).await;
    let other = add_comment(&seeded, &note, None, 5).await;

    assert!(NoteRepository::delete(&seeded.store, &note.id).await.expect("delete"));

    assert!(seeded.store.find_comment(&other.id).await.expect("find").is_none());
    assert!(seeded.store.list_comments(&note.id).await.expect("list").is_empty());
}

#[rstest]
#[tokio::test]
async fn deleting_a_comment_removes_its_replies_only(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let note = add_note(&seeded, 1).await;
    let root = add_comment(&seeded, &note, None, 2).await;
    let reply = add_comment(&seeded, &note, Some(root.id), 3).await;
    add_comment(&seeded, &note, Some(reply.id), 4).await;
    let sibling = add_comment(&seeded, &note, None, 5).await;

    assert!(seeded.store.delete_comment(&root.id).await.expect("delete"));

    let remaining = seeded.store.list_comments(&note.id).await.expect("list");
    assert_eq!(remaining, vec![sibling]);
}

#[rstest]
#[tokio::test]
async fn notes_list_newest_first_with_counts(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let older = add_note(&seeded, 1).await;
    let newer = add_note(&seeded, 2).await;
    add_comment(&seeded, &older, None, 3).await;
    add_comment(&seeded, &older, None, 4).await;

    let listed = NoteRepository::list_for_org(&seeded.store, &seeded.org.id, None)
        .await
        .expect("list");

    assert_eq!(listed, vec![(newer, 0), (older, 2)]);
}

#[rstest]
#[tokio::test]
async fn accept_is_single_use(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let email = Email::new("bob@example.com").expect("valid email");
    let invite = Invite::issue(
        seeded.org.id,
        seeded.owner,
        email,
        InviteRole::Member,
        InviteToken::generate(&mut OsRng),
        at(0),
    );
    InviteRepository::insert(&seeded.store, &invite).await.expect("insert");
    let membership = Membership {
        user_id: UserId::random(),
        org_id: seeded.org.id,
        role: OrgRole::Member,
        joined_at: at(1),
    };

    seeded.store.accept(&invite, &membership).await.expect("first accept");
    let second = seeded.store.accept(&invite, &membership).await;

    assert_eq!(second, Err(InviteRepositoryError::consumed()));
    assert!(seeded.store.find_by_token(&invite.token).await.expect("find").is_none());
    assert_eq!(seeded.store.count_members(&seeded.org.id).await.expect("count"), 2);
}

#[rstest]
#[tokio::test]
async fn racing_accepts_admit_exactly_one(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let invite = Invite::issue(
        seeded.org.id,
        seeded.owner,
        Email::new("bob@example.com").expect("valid email"),
        InviteRole::Member,
        InviteToken::generate(&mut OsRng),
        at(0),
    );
    InviteRepository::insert(&seeded.store, &invite).await.expect("insert");
    let joining = |user_id| Membership {
        user_id,
        org_id: seeded.org.id,
        role: OrgRole::Member,
        joined_at: at(1),
    };
    let (left, right) = (joining(UserId::random()), joining(UserId::random()));

    let (a, b) = tokio::join!(
        seeded.store.accept(&invite, &left),
        seeded.store.accept(&invite, &right)
    );

    let mut outcomes = vec![a, b];
    outcomes.sort_by_key(Result::is_err);
    assert_eq!(outcomes, vec![Ok(()), Err(InviteRepositoryError::consumed())]);
    assert_eq!(seeded.store.count_members(&seeded.org.id).await.expect("count"), 2);
}

#[rstest]
#[tokio::test]
async fn pending_invites_are_unique_per_email(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let issue = || {
        Invite::issue(
            seeded.org.id,
            seeded.owner,
            Email::new("bob@example.com").expect("valid email"),
            InviteRole::Viewer,
            InviteToken::generate(&mut OsRng),
            at(0),
        )
    };
    InviteRepository::insert(&seeded.store, &issue()).await.expect("first");

    let err = InviteRepository::insert(&seeded.store, &issue())
        .await
        .expect_err("duplicate");

    assert_eq!(err, InviteRepositoryError::duplicate_invite());
}

#[rstest]
#[tokio::test]
async fn deleting_a_field_closes_the_gap(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let campaign = add_campaign(&seeded).await;
    let first = add_field(&seeded, &campaign, "Name").await;
    let middle = add_field(&seeded, &campaign, "Email").await;
    let last = add_field(&seeded, &campaign, "Notes").await;

    assert!(seeded.store.delete_field(&middle.id).await.expect("delete"));

    let fields = seeded.store.list_fields(&campaign.id).await.expect("list");
    let orders: Vec<(FieldId, i32)> = fields.iter().map(|f| (f.id, f.order)).collect();
    assert_eq!(orders, vec![(first.id, 0), (last.id, 1)]);
}

#[rstest]
#[tokio::test]
async fn concurrent_appends_get_distinct_positions(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let campaign = add_campaign(&seeded).await;

    let (a, b, c) = tokio::join!(
        add_field(&seeded, &campaign, "One"),
        add_field(&seeded, &campaign, "Two"),
        add_field(&seeded, &campaign, "Three")
    );

    let mut orders = vec![a.order, b.order, c.order];
    orders.sort_unstable();
    assert_eq!(orders, vec![0, 1, 2]);
}

#[rstest]
#[tokio::test]
async fn reorder_rewrites_positions(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let campaign = add_campaign(&seeded).await;
    let f1 = add_field(&seeded, &campaign, "One").await;
    let f2 = add_field(&seeded, &campaign, "Two").await;
    let f3 = add_field(&seeded, &campaign, "Three").await;

    seeded
        .store
        .reorder_fields(&campaign.id, &[f3.id, f1.id, f2.id])
        .await
        .expect("reorder");

    let ids: Vec<FieldId> = seeded
        .store
        .list_fields(&campaign.id)
        .await
        .expect("list")
        .into_iter()
        .map(|field| field.id)
        .collect();
    assert_eq!(ids, vec![f3.id, f1.id, f2.id]);
}

#[rstest]
#[tokio::test]
async fn counts_split_on_last_view(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let campaign = add_campaign(&seeded).await;
    for minutes in [1, 2, 10] {
        let submission = Submission {
            id: SubmissionId::random(),
            campaign_id: campaign.id,
            created_at: at(minutes),
            values: Vec::<SubmissionValue>::new(),
        };
        seeded.store.insert_submission(&submission).await.expect("insert");
    }

    let unseen = seeded.store.submission_counts(&campaign.id, None).await.expect("counts");
    let seen = seeded
        .store
        .submission_counts(&campaign.id, Some(at(5)))
        .await
        .expect("counts");

    assert_eq!(unseen, SubmissionCounts { total: 3, new: 3 });
    assert_eq!(seen, SubmissionCounts { total: 3, new: 1 });
}

#[rstest]
#[tokio::test]
async fn deleting_an_organization_cascades(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let note = add_note(&seeded, 1).await;
    let campaign = add_campaign(&seeded).await;

    assert!(OrganizationRepository::delete(&seeded.store, &seeded.org.id).await.expect("delete"));

    assert!(NoteRepository::find_by_id(&seeded.store, &note.id).await.expect("find").is_none());
    assert!(CampaignRepository::find_by_id(&seeded.store, &campaign.id)
        .await
        .expect("find")
        .is_none());
    assert!(seeded
        .store
        .find_membership(&seeded.org.id, &seeded.owner)
        .await
        .expect("find")
        .is_none());
}
