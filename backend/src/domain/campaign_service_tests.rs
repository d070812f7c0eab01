//! Tests for the campaign service.

use super::*;
use crate::domain::ports::{
    MockCampaignRepository, MockOrganizationRepository, SubmissionCounts,
};
use crate::domain::{ErrorCode, FieldType, Membership, OrgRole};
use crate::test_support::MutableClock;
use chrono::Utc;
use rstest::rstest;

type Service = CampaignService<MockCampaignRepository, MockOrganizationRepository>;

fn with_role(caller: UserId, role: OrgRole) -> MockOrganizationRepository {
    let mut repo = MockOrganizationRepository::new();
    repo.expect_find_membership().returning(move |org_id, _| {
        Ok(Some(Membership {
            user_id: caller,
            org_id: *org_id,
            role,
            joined_at: Utc::now(),
        }))
    });
    repo
}

fn make_service(campaigns: MockCampaignRepository, organizations: MockOrganizationRepository) -> Service {
    CampaignService::new(
        Arc::new(campaigns),
        Arc::new(organizations),
        Arc::new(MutableClock::fixed()),
    )
}

fn campaign_by(author: UserId, status: CampaignStatus) -> Campaign {
    let mut campaign = Campaign::create(
        CampaignDraft::new("Signup", None).expect("valid draft"),
        "abcdefghijkl".to_owned(),
        author,
        OrganizationId::random(),
        Utc::now(),
    );
    campaign.status = status;
    campaign
}

fn field(campaign_id: CampaignId, name: &str, required: bool, order: i32) -> CampaignField {
    CampaignField::create(
        FieldDraft::new(name, FieldType::Text, required, None).expect("valid field"),
        campaign_id,
        order,
    )
}

#[rstest]
#[tokio::test]
async fn create_retries_slug_collisions() {
    let caller = UserId::random();
    let mut campaigns = MockCampaignRepository::new();
    let mut seq = mockall::Sequence::new();
    campaigns
        .expect_insert()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|campaign| Err(CampaignRepositoryError::duplicate_slug(campaign.slug.clone())));
    campaigns
        .expect_insert()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    let service = make_service(campaigns, with_role(caller, OrgRole::Member));

    let campaign = service
        .create_campaign(
            &caller,
            &OrganizationId::random(),
            CampaignDraft::new("Feedback", Some("Tell us")).expect("valid"),
        )
        .await
        .expect("created");

    assert_eq!(campaign.status, CampaignStatus::Draft);
    assert_eq!(campaign.slug.len(), 12);
}

#[rstest]
#[case(CampaignStatus::Draft, CampaignStatus::Closed)]
#[case(CampaignStatus::Active, CampaignStatus::Draft)]
#[case(CampaignStatus::Active, CampaignStatus::Active)]
#[tokio::test]
async fn disallowed_transitions_conflict(#[case] from: CampaignStatus, #[case] to: CampaignStatus) {
    let caller = UserId::random();
    let campaign = campaign_by(caller, from);
    let mut campaigns = MockCampaignRepository::new();
    campaigns
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(campaign)));
    campaigns.expect_update().never();
    let service = make_service(campaigns, with_role(caller, OrgRole::Member));

    let err = service
        .change_campaign_status(&caller, &CampaignId::random(), to)
        .await
        .expect_err("invalid transition");

    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn open_reports_counts_before_marking_viewed() {
    let caller = UserId::random();
    let campaign = campaign_by(caller, CampaignStatus::Active);
    let mut campaigns = MockCampaignRepository::new();
    campaigns
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(campaign)));
    campaigns.expect_list_fields().return_once(|_| Ok(Vec::new()));
    let mut seq = mockall::Sequence::new();
    campaigns
        .expect_submission_counts()
        .withf(|_, viewed| viewed.is_none())
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_, _| Ok(SubmissionCounts { total: 3, new: 3 }));
    campaigns
        .expect_mark_viewed()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_, _| Ok(true));
    let service = make_service(campaigns, with_role(caller, OrgRole::Viewer));

    let detail = service
        .open_campaign(&caller, &CampaignId::random())
        .await
        .expect("opened");

    assert_eq!(detail.new_submission_count, 3);
    assert!(detail.campaign.last_viewed_at.is_some());
}

#[rstest]
#[case(CampaignStatus::Draft)]
#[case(CampaignStatus::Closed)]
#[tokio::test]
async fn hidden_campaigns_look_missing(#[case] status: CampaignStatus) {
    let campaign = campaign_by(UserId::random(), status);
    let mut campaigns = MockCampaignRepository::new();
    campaigns
        .expect_find_by_slug()
        .return_once(move |_| Ok(Some(campaign)));
    let service = make_service(campaigns, MockOrganizationRepository::new());

    let err = service
        .public_campaign("abcdefghijkl")
        .await
        .expect_err("hidden");

    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(err.message(), "campaign not found");
}

#[rstest]
#[tokio::test]
async fn missing_required_answer_stores_nothing() {
    let campaign = campaign_by(UserId::random(), CampaignStatus::Active);
    let campaign_id = campaign.id;
    let email = field(campaign_id, "Email", true, 0);
    let mut campaigns = MockCampaignRepository::new();
    campaigns
        .expect_find_by_slug()
        .return_once(move |_| Ok(Some(campaign)));
    campaigns
        .expect_list_fields()
        .return_once(move |_| Ok(vec![email]));
    campaigns.expect_insert_submission().never();
    let service = make_service(campaigns, MockOrganizationRepository::new());

    let err = service
        .submit("abcdefghijkl", Vec::new())
        .await
        .expect_err("required");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert!(err.message().contains("Email"));
}

#[rstest]
#[tokio::test]
async fn blank_optional_answers_are_dropped() {
    let campaign = campaign_by(UserId::random(), CampaignStatus::Active);
    let campaign_id = campaign.id;
    let name = field(campaign_id, "Name", true, 0);
    let note = field(campaign_id, "Note", false, 1);
    let answers = vec![
        SubmissionAnswer {
            field_id: name.id,
            value: "Ada".to_owned(),
        },
        SubmissionAnswer {
            field_id: note.id,
            value: "   ".to_owned(),
        },
    ];
    let mut campaigns = MockCampaignRepository::new();
    campaigns
        .expect_find_by_slug()
        .return_once(move |_| Ok(Some(campaign)));
    campaigns
        .expect_list_fields()
        .return_once(move |_| Ok(vec![name, note]));
    campaigns
        .expect_insert_submission()
        .withf(|submission| submission.values.len() == 1 && submission.values[0].value == "Ada")
        .times(1)
        .return_once(|_| Ok(()));
    let service = make_service(campaigns, MockOrganizationRepository::new());

    service
        .submit("abcdefghijkl", answers)
        .await
        .expect("stored");
}

#[rstest]
#[tokio::test]
async fn reorder_rejects_partial_lists() {
    let caller = UserId::random();
    let campaign = campaign_by(caller, CampaignStatus::Draft);
    let campaign_id = campaign.id;
    let first = field(campaign_id, "A", false, 0);
    let second = field(campaign_id, "B", false, 1);
    let only_first = vec![first.id];
    let mut campaigns = MockCampaignRepository::new();
    campaigns
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(campaign)));
    campaigns
        .expect_list_fields()
        .return_once(move |_| Ok(vec![first, second]));
    campaigns.expect_reorder_fields().never();
    let service = make_service(campaigns, with_role(caller, OrgRole::Member));

    let err = service
        .reorder_fields(&caller, &campaign_id, only_first)
        .await
        .expect_err("partial");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn viewers_cannot_add_fields() {
    let caller = UserId::random();
    let campaign = campaign_by(caller, CampaignStatus::Draft);
    let mut campaigns = MockCampaignRepository::new();
    campaigns
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(campaign)));
    campaigns.expect_append_field().never();
    let service = make_service(campaigns, with_role(caller, OrgRole::Viewer));

    let err = service
        .add_field(
            &caller,
            &CampaignId::random(),
            FieldDraft::new("Name", FieldType::Text, true, None).expect("valid"),
        )
        .await
        .expect_err("viewer");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn new_field_takes_the_position_the_store_assigns() {
    let caller = UserId::random();
    let campaign = campaign_by(caller, CampaignStatus::Draft);
    let campaign_id = campaign.id;
    let mut campaigns = MockCampaignRepository::new();
    campaigns
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(campaign)));
    campaigns.expect_list_fields().never();
    campaigns
        .expect_append_field()
        .withf(move |field| field.campaign_id == campaign_id && field.name == "C")
        .times(1)
        .return_once(|_| Ok(2));
    let service = make_service(campaigns, with_role(caller, OrgRole::Member));

    let created = service
        .add_field(
            &caller,
            &campaign_id,
            FieldDraft::new("C", FieldType::Number, false, None).expect("valid"),
        )
        .await
        .expect("added");

    assert_eq!(created.order, 2);
}

#[rstest]
#[tokio::test]
async fn clashing_field_positions_are_a_conflict() {
    let caller = UserId::random();
    let campaign = campaign_by(caller, CampaignStatus::Draft);
    let campaign_id = campaign.id;
    let mut campaigns = MockCampaignRepository::new();
    campaigns
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(campaign)));
    campaigns
        .expect_append_field()
        .return_once(|_| Err(CampaignRepositoryError::field_order_conflict()));
    let service = make_service(campaigns, with_role(caller, OrgRole::Member));

    let err = service
        .add_field(
            &caller,
            &campaign_id,
            FieldDraft::new("C", FieldType::Text, false, None).expect("valid"),
        )
        .await
        .expect_err("conflict");

    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn new_submission_total_sums_campaigns() {
    let caller = UserId::random();
    let org_id = OrganizationId::random();
    let listed = vec![
        campaign_by(caller, CampaignStatus::Active),
        campaign_by(caller, CampaignStatus::Closed),
    ];
    let mut campaigns = MockCampaignRepository::new();
    campaigns
        .expect_list_for_org()
        .return_once(move |_| Ok(listed));
    campaigns
        .expect_submission_counts()
        .times(2)
        .returning(|_, _| Ok(SubmissionCounts { total: 5, new: 2 }));
    let service = make_service(campaigns, with_role(caller, OrgRole::Viewer));

    let total = service
        .new_submission_total(&caller, &org_id)
        .await
        .expect("summed");

    assert_eq!(total, 4);
}
