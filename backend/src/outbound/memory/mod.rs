//! In-process store implementing every repository port.
//!
//! Used when no database URL is configured and by the integration tests. The
//! store mirrors the PostgreSQL schema's guarantees: unique slugs, one
//! membership per user and organization, one invite per email and
//! organization, cascading deletes, and contiguous field orders. Each
//! operation takes the lock once, so multi-row writes are atomic.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::ports::{
    CampaignRepository, CampaignRepositoryError, InviteRepository, InviteRepositoryError,
    NoteRepository, NoteRepositoryError, OrganizationRepository, OrganizationRepositoryError,
    SubmissionCounts,
};
use crate::domain::{
    Campaign, CampaignField, CampaignId, Comment, CommentId, Email, FieldId, Invite, InviteId,
    InviteToken, Membership, MembershipWithOrganization, Note, NoteId, NoteStatus, OrgRole,
    Organization, OrganizationId, Submission, UserId, is_new_submission,
};

#[derive(Debug, Default)]
struct Tables {
    organizations: Vec<Organization>,
    memberships: Vec<Membership>,
    invites: Vec<Invite>,
    notes: Vec<Note>,
    comments: Vec<Comment>,
    campaigns: Vec<Campaign>,
    fields: Vec<CampaignField>,
    submissions: Vec<Submission>,
}

impl Tables {
    fn drop_notes(&mut self, doomed: &[NoteId]) {
        self.notes.retain(|note| !doomed.contains(&note.id));
        self.comments.retain(|comment| !doomed.contains(&comment.note_id));
    }

    fn drop_campaigns(&mut self, doomed: &[CampaignId]) {
        self.campaigns.retain(|campaign| !doomed.contains(&campaign.id));
        self.fields.retain(|field| !doomed.contains(&field.campaign_id));
        self.submissions
            .retain(|submission| !doomed.contains(&submission.campaign_id));
    }

    fn drop_organization(&mut self, org_id: OrganizationId) {
        self.organizations.retain(|org| org.id != org_id);
        self.memberships.retain(|m| m.org_id != org_id);
        self.invites.retain(|invite| invite.org_id != org_id);
        let notes: Vec<NoteId> = self
            .notes
            .iter()
            .filter(|note| note.org_id == org_id)
            .map(|note| note.id)
            .collect();
        self.drop_notes(&notes);
        let campaigns: Vec<CampaignId> = self
            .campaigns
            .iter()
            .filter(|campaign| campaign.org_id == org_id)
            .map(|campaign| campaign.id)
            .collect();
        self.drop_campaigns(&campaigns);
    }

    /// `root` and every reply beneath it.
    fn comment_subtree(&self, root: CommentId) -> Vec<CommentId> {
        let mut doomed = vec![root];
        let mut cursor = 0;
        while let Some(current) = doomed.get(cursor).copied() {
            doomed.extend(
                self.comments
                    .iter()
                    .filter(|comment| comment.parent_id == Some(current))
                    .map(|comment| comment.id),
            );
            cursor += 1;
        }
        doomed
    }
}

/// Newest first; among equal timestamps the later insert wins.
fn newest_first<T, F>(items: impl DoubleEndedIterator<Item = T>, created_at: F) -> Vec<T>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    let mut sorted: Vec<T> = items.rev().collect();
    sorted.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
    sorted
}

fn order_of(index: usize) -> i32 {
    i32::try_from(index).unwrap_or(i32::MAX)
}

/// Shared in-memory tables. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrganizationRepository for MemoryStore {
    async fn create_with_owner(
        &self,
        organization: &Organization,
        owner: &Membership,
    ) -> Result<(), OrganizationRepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.organizations.iter().any(|org| org.slug == organization.slug) {
            return Err(OrganizationRepositoryError::duplicate_slug(organization.slug.clone()));
        }
        tables.organizations.push(organization.clone());
        tables.memberships.push(owner.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &OrganizationId,
    ) -> Result<Option<Organization>, OrganizationRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.organizations.iter().find(|org| org.id == *id).cloned())
    }

    async fn update(&self, organization: &Organization) -> Result<bool, OrganizationRepositoryError> {
        let mut tables = self.tables.write().await;
        if tables
            .organizations
            .iter()
            .any(|org| org.id != organization.id && org.slug == organization.slug)
        {
            return Err(OrganizationRepositoryError::duplicate_slug(organization.slug.clone()));
        }
        let Some(stored) = tables.organizations.iter_mut().find(|org| org.id == organization.id) else {
            return Ok(false);
        };
        stored.name.clone_from(&organization.name);
        stored.slug.clone_from(&organization.slug);
        stored.updated_at = organization.updated_at;
        Ok(true)
    }

    async fn delete(&self, id: &OrganizationId) -> Result<bool, OrganizationRepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.organizations.iter().any(|org| org.id == *id) {
            return Ok(false);
        }
        tables.drop_organization(*id);
        Ok(true)
    }

    async fn find_membership(
        &self,
        org_id: &OrganizationId,
        user_id: &UserId,
    ) -> Result<Option<Membership>, OrganizationRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .memberships
            .iter()
            .find(|m| m.org_id == *org_id && m.user_id == *user_id)
            .cloned())
    }

    async fn list_memberships_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<MembershipWithOrganization>, OrganizationRepositoryError> {
        let tables = self.tables.read().await;
        let joined = tables
            .memberships
            .iter()
            .filter(|m| m.user_id == *user_id)
            .filter_map(|m| {
                let organization = tables.organizations.iter().find(|org| org.id == m.org_id)?;
                Some(MembershipWithOrganization {
                    membership: m.clone(),
                    organization: organization.clone(),
                })
            })
            .collect::<Vec<_>>();
        Ok(newest_first(joined.into_iter(), |entry| entry.membership.joined_at))
    }

    async fn list_members(
        &self,
        org_id: &OrganizationId,
    ) -> Result<Vec<Membership>, OrganizationRepositoryError> {
        let tables = self.tables.read().await;
        let mut members: Vec<Membership> = tables
            .memberships
            .iter()
            .filter(|m| m.org_id == *org_id)
            .cloned()
            .collect();
        members.sort_by_key(|m| m.joined_at);
        Ok(members)
    }

    async fn count_members(&self, org_id: &OrganizationId) -> Result<u64, OrganizationRepositoryError> {
        let tables = self.tables.read().await;
        let count = tables.memberships.iter().filter(|m| m.org_id == *org_id).count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn update_member_role(
        &self,
        org_id: &OrganizationId,
        user_id: &UserId,
        role: OrgRole,
    ) -> Result<bool, OrganizationRepositoryError> {
        let mut tables = self.tables.write().await;
        let Some(membership) = tables
            .memberships
            .iter_mut()
            .find(|m| m.org_id == *org_id && m.user_id == *user_id)
        else {
            return Ok(false);
        };
        membership.role = role;
        Ok(true)
    }

    async fn remove_member(
        &self,
        org_id: &OrganizationId,
        user_id: &UserId,
    ) -> Result<bool, OrganizationRepositoryError> {
        let mut tables = self.tables.write().await;
        let before = tables.memberships.len();
        tables
            .memberships
            .retain(|m| !(m.org_id == *org_id && m.user_id == *user_id));
        Ok(tables.memberships.len() < before)
    }

    async fn remove_all_memberships(&self, user_id: &UserId) -> Result<u64, OrganizationRepositoryError> {
        let mut tables = self.tables.write().await;
        let before = tables.memberships.len();
        tables.memberships.retain(|m| m.user_id != *user_id);
        Ok(u64::try_from(before - tables.memberships.len()).unwrap_or(u64::MAX))
    }
}

#[async_trait]
impl InviteRepository for MemoryStore {
    async fn insert(&self, invite: &Invite) -> Result<(), InviteRepositoryError> {
        let mut tables = self.tables.write().await;
        if tables
            .invites
            .iter()
            .any(|existing| existing.org_id == invite.org_id && existing.email == invite.email)
        {
            return Err(InviteRepositoryError::duplicate_invite());
        }
        if tables.invites.iter().any(|existing| existing.token == invite.token) {
            return Err(InviteRepositoryError::query("invite token collision"));
        }
        if !tables.organizations.iter().any(|org| org.id == invite.org_id) {
            return Err(InviteRepositoryError::query("referenced row missing"));
        }
        tables.invites.push(invite.clone());
        Ok(())
    }

    async fn find_by_token(&self, token: &InviteToken) -> Result<Option<Invite>, InviteRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.invites.iter().find(|invite| invite.token == *token).cloned())
    }

    async fn find_for_email(
        &self,
        org_id: &OrganizationId,
        email: &Email,
    ) -> Result<Option<Invite>, InviteRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .invites
            .iter()
            .find(|invite| invite.org_id == *org_id && invite.email == *email)
            .cloned())
    }

    async fn list_for_org(&self, org_id: &OrganizationId) -> Result<Vec<Invite>, InviteRepositoryError> {
        let tables = self.tables.read().await;
        let pending = tables.invites.iter().filter(|invite| invite.org_id == *org_id).cloned();
        Ok(newest_first(pending.collect::<Vec<_>>().into_iter(), |invite| invite.created_at))
    }

    async fn delete(&self, id: &InviteId) -> Result<bool, InviteRepositoryError> {
        let mut tables = self.tables.write().await;
        let before = tables.invites.len();
        tables.invites.retain(|invite| invite.id != *id);
        Ok(tables.invites.len() < before)
    }

    async fn delete_in_org(
        &self,
        org_id: &OrganizationId,
        id: &InviteId,
    ) -> Result<bool, InviteRepositoryError> {
        let mut tables = self.tables.write().await;
        let before = tables.invites.len();
        tables
            .invites
            .retain(|invite| !(invite.id == *id && invite.org_id == *org_id));
        Ok(tables.invites.len() < before)
    }

    async fn accept(&self, invite: &Invite, membership: &Membership) -> Result<(), InviteRepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.invites.iter().any(|pending| pending.id == invite.id) {
            return Err(InviteRepositoryError::consumed());
        }
        if tables
            .memberships
            .iter()
            .any(|m| m.org_id == membership.org_id && m.user_id == membership.user_id)
        {
            return Err(InviteRepositoryError::duplicate_membership());
        }
        tables.invites.retain(|pending| pending.id != invite.id);
        tables.memberships.push(membership.clone());
        Ok(())
    }
}

#[async_trait]
impl NoteRepository for MemoryStore {
    async fn insert(&self, note: &Note) -> Result<(), NoteRepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.organizations.iter().any(|org| org.id == note.org_id) {
            return Err(NoteRepositoryError::query("referenced row missing"));
        }
        tables.notes.push(note.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &NoteId) -> Result<Option<Note>, NoteRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.notes.iter().find(|note| note.id == *id).cloned())
    }

    async fn list_for_org(
        &self,
        org_id: &OrganizationId,
        status: Option<NoteStatus>,
    ) -> Result<Vec<(Note, u64)>, NoteRepositoryError> {
        let tables = self.tables.read().await;
        let listed: Vec<(Note, u64)> = tables
            .notes
            .iter()
            .filter(|note| note.org_id == *org_id)
            .filter(|note| status.is_none_or(|wanted| note.status == wanted))
            .map(|note| {
                let count = tables.comments.iter().filter(|c| c.note_id == note.id).count();
                (note.clone(), u64::try_from(count).unwrap_or(u64::MAX))
            })
            .collect();
        Ok(newest_first(listed.into_iter(), |(note, _)| note.created_at))
    }

    async fn update(&self, note: &Note) -> Result<bool, NoteRepositoryError> {
        let mut tables = self.tables.write().await;
        let Some(stored) = tables.notes.iter_mut().find(|stored| stored.id == note.id) else {
            return Ok(false);
        };
        stored.title.clone_from(&note.title);
        stored.content.clone_from(&note.content);
        stored.status = note.status;
        stored.updated_at = note.updated_at;
        Ok(true)
    }

    async fn delete(&self, id: &NoteId) -> Result<bool, NoteRepositoryError> {
        let mut tables = self.tables.write().await;
        let before = tables.notes.len();
        tables.drop_notes(&[*id]);
        Ok(tables.notes.len() < before)
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<(), NoteRepositoryError> {
        let mut tables = self.tables.write().await;
        let note_exists = tables.notes.iter().any(|note| note.id == comment.note_id);
        let parent_exists = comment
            .parent_id
            .is_none_or(|parent| tables.comments.iter().any(|c| c.id == parent));
        if !(note_exists && parent_exists) {
            return Err(NoteRepositoryError::query("referenced row missing"));
        }
        tables.comments.push(comment.clone());
        Ok(())
    }

    async fn find_comment(&self, id: &CommentId) -> Result<Option<Comment>, NoteRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.comments.iter().find(|comment| comment.id == *id).cloned())
    }

    async fn list_comments(&self, note_id: &NoteId) -> Result<Vec<Comment>, NoteRepositoryError> {
        let tables = self.tables.read().await;
        let mut thread: Vec<Comment> = tables
            .comments
            .iter()
            .filter(|comment| comment.note_id == *note_id)
            .cloned()
            .collect();
        thread.sort_by_key(|comment| comment.created_at);
        Ok(thread)
    }

    async fn delete_comment(&self, id: &CommentId) -> Result<bool, NoteRepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.comments.iter().any(|comment| comment.id == *id) {
            return Ok(false);
        }
        let doomed = tables.comment_subtree(*id);
        tables.comments.retain(|comment| !doomed.contains(&comment.id));
        Ok(true)
    }
}

#[async_trait]
impl CampaignRepository for MemoryStore {
    async fn insert(&self, campaign: &Campaign) -> Result<(), CampaignRepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.campaigns.iter().any(|existing| existing.slug == campaign.slug) {
            return Err(CampaignRepositoryError::duplicate_slug(campaign.slug.clone()));
        }
        if !tables.organizations.iter().any(|org| org.id == campaign.org_id) {
            return Err(CampaignRepositoryError::query("referenced row missing"));
        }
        tables.campaigns.push(campaign.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &CampaignId) -> Result<Option<Campaign>, CampaignRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.campaigns.iter().find(|campaign| campaign.id == *id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Campaign>, CampaignRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.campaigns.iter().find(|campaign| campaign.slug == slug).cloned())
    }

    async fn list_for_org(
        &self,
        org_id: &OrganizationId,
    ) -> Result<Vec<Campaign>, CampaignRepositoryError> {
        let tables = self.tables.read().await;
        let owned: Vec<Campaign> = tables
            .campaigns
            .iter()
            .filter(|campaign| campaign.org_id == *org_id)
            .cloned()
            .collect();
        Ok(newest_first(owned.into_iter(), |campaign| campaign.created_at))
    }

    async fn update(&self, campaign: &Campaign) -> Result<bool, CampaignRepositoryError> {
        let mut tables = self.tables.write().await;
        let Some(stored) = tables.campaigns.iter_mut().find(|stored| stored.id == campaign.id) else {
            return Ok(false);
        };
        stored.name.clone_from(&campaign.name);
        stored.description.clone_from(&campaign.description);
        stored.status = campaign.status;
        stored.updated_at = campaign.updated_at;
        Ok(true)
    }

    async fn delete(&self, id: &CampaignId) -> Result<bool, CampaignRepositoryError> {
        let mut tables = self.tables.write().await;
        let before = tables.campaigns.len();
        tables.drop_campaigns(&[*id]);
        Ok(tables.campaigns.len() < before)
    }

    async fn mark_viewed(
        &self,
        id: &CampaignId,
        at: DateTime<Utc>,
    ) -> Result<bool, CampaignRepositoryError> {
        let mut tables = self.tables.write().await;
        let Some(stored) = tables.campaigns.iter_mut().find(|stored| stored.id == *id) else {
            return Ok(false);
        };
        stored.last_viewed_at = Some(at);
        Ok(true)
    }

    async fn list_fields(
        &self,
        campaign_id: &CampaignId,
    ) -> Result<Vec<CampaignField>, CampaignRepositoryError> {
        let tables = self.tables.read().await;
        let mut fields: Vec<CampaignField> = tables
            .fields
            .iter()
            .filter(|field| field.campaign_id == *campaign_id)
            .cloned()
            .collect();
        fields.sort_by_key(|field| field.order);
        Ok(fields)
    }

    async fn find_field(&self, id: &FieldId) -> Result<Option<CampaignField>, CampaignRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.fields.iter().find(|field| field.id == *id).cloned())
    }

    async fn append_field(&self, field: &CampaignField) -> Result<i32, CampaignRepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.campaigns.iter().any(|campaign| campaign.id == field.campaign_id) {
            return Err(CampaignRepositoryError::query("referenced row missing"));
        }
        let order = tables
            .fields
            .iter()
            .filter(|existing| existing.campaign_id == field.campaign_id)
            .map(|existing| existing.order)
            .max()
            .map_or(Ok(0), |last| {
                last.checked_add(1)
                    .ok_or_else(|| CampaignRepositoryError::query("field position overflow"))
            })?;
        tables.fields.push(CampaignField {
            order,
            ..field.clone()
        });
        Ok(order)
    }

    async fn update_field(&self, field: &CampaignField) -> Result<bool, CampaignRepositoryError> {
        let mut tables = self.tables.write().await;
        let Some(stored) = tables.fields.iter_mut().find(|stored| stored.id == field.id) else {
            return Ok(false);
        };
        stored.name.clone_from(&field.name);
        stored.field_type = field.field_type;
        stored.required = field.required;
        stored.options.clone_from(&field.options);
        Ok(true)
    }

    async fn delete_field(&self, id: &FieldId) -> Result<bool, CampaignRepositoryError> {
        let mut tables = self.tables.write().await;
        let Some(removed) = tables.fields.iter().find(|field| field.id == *id).cloned() else {
            return Ok(false);
        };
        tables.fields.retain(|field| field.id != *id);
        for field in &mut tables.fields {
            if field.campaign_id == removed.campaign_id && field.order > removed.order {
                field.order -= 1;
            }
        }
        for submission in &mut tables.submissions {
            submission.values.retain(|value| value.field_id != *id);
        }
        Ok(true)
    }

    async fn reorder_fields(
        &self,
        campaign_id: &CampaignId,
        ordered: &[FieldId],
    ) -> Result<(), CampaignRepositoryError> {
        let mut tables = self.tables.write().await;
        for (index, field_id) in ordered.iter().enumerate() {
            if let Some(field) = tables
                .fields
                .iter_mut()
                .find(|field| field.id == *field_id && field.campaign_id == *campaign_id)
            {
                field.order = order_of(index);
            }
        }
        Ok(())
    }

    async fn insert_submission(&self, submission: &Submission) -> Result<(), CampaignRepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables
            .campaigns
            .iter()
            .any(|campaign| campaign.id == submission.campaign_id)
        {
            return Err(CampaignRepositoryError::query("referenced row missing"));
        }
        tables.submissions.push(submission.clone());
        Ok(())
    }

    async fn list_submissions(
        &self,
        campaign_id: &CampaignId,
    ) -> Result<Vec<Submission>, CampaignRepositoryError> {
        let tables = self.tables.read().await;
        let received: Vec<Submission> = tables
            .submissions
            .iter()
            .filter(|submission| submission.campaign_id == *campaign_id)
            .cloned()
            .collect();
        Ok(newest_first(received.into_iter(), |submission| submission.created_at))
    }

    async fn submission_counts(
        &self,
        campaign_id: &CampaignId,
        last_viewed_at: Option<DateTime<Utc>>,
    ) -> Result<SubmissionCounts, CampaignRepositoryError> {
        let tables = self.tables.read().await;
        let (total, new) = tables
            .submissions
            .iter()
            .filter(|submission| submission.campaign_id == *campaign_id)
            .fold((0_u64, 0_u64), |(total, new), submission| {
                let fresh = is_new_submission(submission.created_at, last_viewed_at);
                (total + 1, new + u64::from(fresh))
            });
        Ok(SubmissionCounts { total, new })
    }
}

#[cfg(test)]
mod tests;
