//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Tenants. `slug` is globally unique.
    organizations (id) {
        id -> Uuid,
        name -> Varchar,
        slug -> Varchar,
        owner_id -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// One row per (user, organization) pair.
    memberships (user_id, org_id) {
        user_id -> Uuid,
        org_id -> Uuid,
        role -> Varchar,
        joined_at -> Timestamptz,
    }
}

diesel::table! {
    /// Pending invites; unique per (email, org) and per token.
    invites (id) {
        id -> Uuid,
        email -> Varchar,
        role -> Varchar,
        token -> Varchar,
        org_id -> Uuid,
        inviter_id -> Uuid,
        expires_at -> Timestamptz,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    notes (id) {
        id -> Uuid,
        title -> Varchar,
        content -> Text,
        status -> Varchar,
        author_id -> Uuid,
        org_id -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Comments cascade from their note and from their parent comment.
    comments (id) {
        id -> Uuid,
        content -> Text,
        author_id -> Uuid,
        note_id -> Uuid,
        parent_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    campaigns (id) {
        id -> Uuid,
        name -> Varchar,
        description -> Nullable<Varchar>,
        status -> Varchar,
        slug -> Varchar,
        author_id -> Uuid,
        org_id -> Uuid,
        last_viewed_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Form fields. `position` is unique per campaign (deferred constraint).
    campaign_fields (id) {
        id -> Uuid,
        campaign_id -> Uuid,
        name -> Varchar,
        field_type -> Varchar,
        required -> Bool,
        options -> Nullable<Text>,
        position -> Int4,
    }
}

diesel::table! {
    campaign_submissions (id) {
        id -> Uuid,
        campaign_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    campaign_submission_values (submission_id, field_id) {
        submission_id -> Uuid,
        field_id -> Uuid,
        value -> Text,
    }
}

diesel::joinable!(memberships -> organizations (org_id));
diesel::joinable!(invites -> organizations (org_id));
diesel::joinable!(notes -> organizations (org_id));
diesel::joinable!(comments -> notes (note_id));
diesel::joinable!(campaigns -> organizations (org_id));
diesel::joinable!(campaign_fields -> campaigns (campaign_id));
diesel::joinable!(campaign_submissions -> campaigns (campaign_id));
diesel::joinable!(campaign_submission_values -> campaign_submissions (submission_id));
diesel::joinable!(campaign_submission_values -> campaign_fields (field_id));

diesel::allow_tables_to_appear_in_same_query!(
    organizations,
    memberships,
    invites,
    notes,
    comments,
    campaigns,
    campaign_fields,
    campaign_submissions,
    campaign_submission_values,
);
