//! Notes and threaded comments.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{CommentId, NoteId, OrganizationId, UserId};

/// Maximum note title length.
pub const NOTE_TITLE_MAX: usize = 200;

/// Workflow state of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoteStatus {
    /// Still being discussed.
    Open,
    /// Resolved.
    Closed,
}

impl NoteStatus {
    /// The opposite state.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Open => Self::Closed,
            Self::Closed => Self::Open,
        }
    }

    /// Stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
        }
    }
}

/// Raised when a stored or requested note status is unknown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown note status: {0}")]
pub struct UnknownNoteStatus(pub String);

impl FromStr for NoteStatus {
    type Err = UnknownNoteStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(Self::Open),
            "CLOSED" => Ok(Self::Closed),
            other => Err(UnknownNoteStatus(other.to_owned())),
        }
    }
}

impl fmt::Display for NoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation failures for note and comment payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NoteValidationError {
    /// Title was blank.
    #[error("title is required")]
    EmptyTitle,
    /// Title exceeded [`NOTE_TITLE_MAX`].
    #[error("title must be at most {max} characters")]
    TitleTooLong { max: usize },
    /// Note body was blank.
    #[error("content is required")]
    EmptyContent,
    /// Comment body was blank.
    #[error("comment is required")]
    EmptyComment,
}

impl NoteValidationError {
    /// Request field the failure refers to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyTitle | Self::TitleTooLong { .. } => "title",
            Self::EmptyContent | Self::EmptyComment => "content",
        }
    }
}

/// Validated title and body for creating or replacing a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    title: String,
    content: String,
}

impl NoteDraft {
    /// Validate raw inputs. The title is trimmed; content is kept verbatim.
    pub fn new(title: &str, content: &str) -> Result<Self, NoteValidationError> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(NoteValidationError::EmptyTitle);
        }
        if trimmed.chars().count() > NOTE_TITLE_MAX {
            return Err(NoteValidationError::TitleTooLong {
                max: NOTE_TITLE_MAX,
            });
        }
        if content.trim().is_empty() {
            return Err(NoteValidationError::EmptyContent);
        }
        Ok(Self {
            title: trimmed.to_owned(),
            content: content.to_owned(),
        })
    }

    /// Note title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Note body.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Validated comment body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBody(String);

impl CommentBody {
    /// Reject blank bodies.
    pub fn new(raw: &str) -> Result<Self, NoteValidationError> {
        if raw.trim().is_empty() {
            return Err(NoteValidationError::EmptyComment);
        }
        Ok(Self(raw.to_owned()))
    }

    /// Comment text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A note inside an organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    /// Identifier.
    pub id: NoteId,
    /// Note title.
    pub title: String,
    /// Note body.
    pub content: String,
    /// Open or closed.
    pub status: NoteStatus,
    /// User who created it.
    pub author_id: UserId,
    /// Owning organization.
    pub org_id: OrganizationId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Build a new open note.
    #[must_use]
    pub fn create(
        draft: &NoteDraft,
        author_id: UserId,
        org_id: OrganizationId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: NoteId::random(),
            title: draft.title().to_owned(),
            content: draft.content().to_owned(),
            status: NoteStatus::Open,
            author_id,
            org_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace title and content.
    pub fn revise(&mut self, draft: &NoteDraft, now: DateTime<Utc>) {
        draft.title().clone_into(&mut self.title);
        draft.content().clone_into(&mut self.content);
        self.updated_at = now;
    }

    /// Flip between open and closed.
    pub fn toggle_status(&mut self, now: DateTime<Utc>) {
        self.status = self.status.toggled();
        self.updated_at = now;
    }
}

/// Note listing row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteSummary {
    /// The note.
    pub note: Note,
    /// Number of comments.
    pub comment_count: u64,
    /// Author display name; empty when unknown.
    pub author_name: String,
}

/// A comment on a note, optionally replying to another comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Identifier.
    pub id: CommentId,
    /// Body text.
    pub content: String,
    /// User who created it.
    pub author_id: UserId,
    /// Note commented on.
    pub note_id: NoteId,
    /// Comment replied to, if any.
    pub parent_id: Option<CommentId>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Build a new comment.
    #[must_use]
    pub fn create(
        body: &CommentBody,
        author_id: UserId,
        note_id: NoteId,
        parent_id: Option<CommentId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CommentId::random(),
            content: body.as_str().to_owned(),
            author_id,
            note_id,
            parent_id,
            created_at: now,
        }
    }
}

/// Comment with its author's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentView {
    /// The comment.
    pub comment: Comment,
    /// Author display name; empty when unknown.
    pub author_name: String,
}

/// Node of an assembled comment thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentNode {
    /// The comment and its author.
    pub view: CommentView,
    /// Direct replies, oldest first.
    pub replies: Vec<CommentNode>,
}

/// Note with its comment threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDetail {
    /// The note.
    pub note: Note,
    /// Author display name; empty when unknown.
    pub author_name: String,
    /// Top-level threads, oldest first.
    pub comments: Vec<CommentNode>,
}

/// Deepest reply level kept in an assembled thread. Replies below it are
/// listed alongside their parent.
pub const MAX_THREAD_DEPTH: usize = 32;

/// Assemble flat comments into threads.
///
/// Input order is preserved among siblings, so callers pass comments sorted
/// by creation time. A comment whose parent is absent from `comments` is
/// promoted to a root rather than dropped. Nesting stops at
/// [`MAX_THREAD_DEPTH`].
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use orgdesk::domain::{Comment, CommentBody, CommentView, NoteId, UserId, build_comment_tree};
///
/// let note = NoteId::random();
/// let author = UserId::random();
/// let body = CommentBody::new("hi").unwrap();
/// let root = Comment::create(&body, author, note, None, Utc::now());
/// let reply = Comment::create(&body, author, note, Some(root.id), Utc::now());
/// let tree = build_comment_tree(vec![
///     CommentView { comment: root, author_name: String::new() },
///     CommentView { comment: reply, author_name: String::new() },
/// ]);
/// assert_eq!(tree.len(), 1);
/// assert_eq!(tree[0].replies.len(), 1);
/// ```
#[must_use]
pub fn build_comment_tree(comments: Vec<CommentView>) -> Vec<CommentNode> {
    let positions: HashMap<CommentId, usize> = comments
        .iter()
        .enumerate()
        .map(|(position, view)| (view.comment.id, position))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); comments.len()];
    let mut roots = Vec::new();
    for (position, view) in comments.iter().enumerate() {
        let parent = view
            .comment
            .parent_id
            .and_then(|parent_id| positions.get(&parent_id).copied())
            .filter(|parent| *parent != position);
        match parent.and_then(|parent| children.get_mut(parent)) {
            Some(siblings) => siblings.push(position),
            None => roots.push(position),
        }
    }

    let layout = ThreadLayout::walk(&roots, &children);
    let mut slots: Vec<Option<CommentView>> = comments.into_iter().map(Some).collect();
    let mut built: Vec<Option<CommentNode>> = slots.iter().map(|_| None).collect();

    // Pre-order reversed: every reply is built before the comment it hangs off.
    for &position in layout.order.iter().rev() {
        let Some(view) = slots.get_mut(position).and_then(Option::take) else {
            continue;
        };
        let replies = layout
            .replies
            .get(position)
            .map(|kids| {
                kids.iter()
                    .filter_map(|kid| built.get_mut(*kid).and_then(Option::take))
                    .collect()
            })
            .unwrap_or_default();
        if let Some(slot) = built.get_mut(position) {
            *slot = Some(CommentNode { view, replies });
        }
    }

    roots
        .into_iter()
        .filter_map(|root| built.get_mut(root).and_then(Option::take))
        .collect()
}

/// Depth-capped parent links, computed without recursion.
struct ThreadLayout {
    /// Reachable positions in pre-order.
    order: Vec<usize>,
    /// Effective replies per position, in input order.
    replies: Vec<Vec<usize>>,
}

impl ThreadLayout {
    fn walk(roots: &[usize], children: &[Vec<usize>]) -> Self {
        let len = children.len();
        let mut depth = vec![0_usize; len];
        let mut anchor: Vec<Option<usize>> = vec![None; len];
        let mut replies: Vec<Vec<usize>> = vec![Vec::new(); len];
        let mut order = Vec::with_capacity(len);
        let mut stack: Vec<usize> = roots.iter().rev().copied().collect();

        while let Some(position) = stack.pop() {
            order.push(position);
            let level = depth.get(position).copied().unwrap_or_default();
            let above = anchor.get(position).copied().flatten();
            let (target, kid_level) = match above {
                Some(grand) if level >= MAX_THREAD_DEPTH => (grand, level),
                _ => (position, level + 1),
            };
            let kids = children.get(position).map(Vec::as_slice).unwrap_or_default();
            for &kid in kids.iter().rev() {
                if let Some(slot) = depth.get_mut(kid) {
                    *slot = kid_level;
                }
                if let Some(slot) = anchor.get_mut(kid) {
                    *slot = Some(target);
                }
                if let Some(list) = replies.get_mut(target) {
                    list.push(kid);
                }
                stack.push(kid);
            }
        }

        for list in &mut replies {
            list.sort_unstable();
        }
        Self { order, replies }
    }
}
