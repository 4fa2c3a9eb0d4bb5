/// Comment tree manager
///
/// Keeps posts, their top-level comments and one level of replies consistent.
/// Child lists are never stored: a post's comment list is every comment with
/// that `post_id` and no parent, and a comment's replies are every comment
/// whose `parent_comment_id` points at it. Creating or deleting a comment is
/// therefore a matter of inserting or removing records, and the "appears
/// exactly once" property holds by construction.
///
/// Multi-step operations are not atomic. Each step tolerates records that are
/// already gone, so repeating a delete after a partial failure converges.
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::metrics::COMMENTS_CREATED_TOTAL;
use crate::metrics::COMMENTS_DELETED_TOTAL;
use crate::middleware::permissions::check_comment_ownership;
use crate::models::{AuthorSummary, Comment, CommentView, CommentWithAuthor, NewComment};
use crate::store::{CommentStore, ForumStore, LikeStore, LikeTarget, PostStore, UserStore};

/// How a new comment attaches to the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    /// Listed under the post
    TopLevel,
    /// Listed under an existing parent comment
    Reply(Uuid),
    /// Parent id did not resolve; the comment is stored but listed nowhere
    Dangling(Uuid),
}

impl Linkage {
    fn label(&self) -> &'static str {
        match self {
            Linkage::TopLevel => "top_level",
            Linkage::Reply(_) => "reply",
            Linkage::Dangling(_) => "dangling",
        }
    }
}

/// What a successful delete removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletedComment {
    pub replies_removed: u64,
    /// False when a concurrent or earlier attempt already removed the record
    pub comment_removed: bool,
}

pub struct CommentTree {
    store: Arc<dyn ForumStore>,
}

impl CommentTree {
    pub fn new(store: Arc<dyn ForumStore>) -> Self {
        Self { store }
    }

    /// Decide where a comment with the given parent would be linked
    async fn resolve_linkage(&self, post_id: Uuid, parent: Option<Uuid>) -> Result<Linkage> {
        let Some(parent_id) = parent else {
            return Ok(Linkage::TopLevel);
        };

        match self.store.find_comment(parent_id).await? {
            None => {
                warn!(
                    %post_id,
                    %parent_id,
                    "parent comment not found; comment will not appear in any list"
                );
                Ok(Linkage::Dangling(parent_id))
            }
            Some(parent) if parent.post_id != post_id => Err(AppError::Validation(
                "parent comment belongs to a different post".into(),
            )),
            Some(parent) if parent.is_reply() => Err(AppError::Validation(
                "replies can only be made to top-level comments".into(),
            )),
            Some(_) => Ok(Linkage::Reply(parent_id)),
        }
    }

    /// Create a comment on a post, optionally as a reply
    ///
    /// Fails with `NotFound` if the post does not exist. A parent that does not
    /// resolve is not an error: the comment is stored with the dangling
    /// reference and a warning is logged.
    pub async fn create_comment(
        &self,
        author_id: Uuid,
        post_id: Uuid,
        content: &str,
        parent_comment_id: Option<Uuid>,
    ) -> Result<CommentWithAuthor> {
        if self.store.find_post(post_id).await?.is_none() {
            return Err(AppError::NotFound("Post not found".into()));
        }

        let linkage = self.resolve_linkage(post_id, parent_comment_id).await?;

        let comment = self
            .store
            .insert_comment(NewComment {
                post_id,
                author_id,
                content: content.to_string(),
                parent_comment_id,
            })
            .await?;

        COMMENTS_CREATED_TOTAL
            .with_label_values(&[linkage.label()])
            .inc();
        info!(
            comment_id = %comment.id,
            %post_id,
            linkage = linkage.label(),
            "comment created"
        );

        let author = self.author_of(author_id).await?;
        Ok(CommentWithAuthor { comment, author })
    }

    /// Delete a comment and its replies on behalf of `acting_user`
    pub async fn delete_comment(
        &self,
        comment_id: Uuid,
        acting_user: Uuid,
    ) -> Result<DeletedComment> {
        let comment = self
            .store
            .find_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".into()))?;

        check_comment_ownership(acting_user, &comment)?;

        let replies_removed = self.store.delete_replies(comment_id).await?;
        let comment_removed = self.store.delete_comment(comment_id).await?;

        COMMENTS_DELETED_TOTAL
            .with_label_values(&["reply_cascade"])
            .inc_by(replies_removed);
        if comment_removed {
            COMMENTS_DELETED_TOTAL.with_label_values(&["direct"]).inc();
        }
        info!(
            %comment_id,
            post_id = %comment.post_id,
            replies_removed,
            "comment deleted"
        );

        Ok(DeletedComment {
            replies_removed,
            comment_removed,
        })
    }

    /// Remove every comment of a post, replies included, without unlinking
    /// them one by one. Returns the number of comments removed.
    pub async fn delete_post_cascade(&self, post_id: Uuid) -> Result<u64> {
        let removed = self.store.delete_comments_by_post(post_id).await?;

        COMMENTS_DELETED_TOTAL
            .with_label_values(&["post_cascade"])
            .inc_by(removed);
        info!(%post_id, removed, "post comments removed");

        Ok(removed)
    }

    /// Thread of a post: top-level comments newest first, each with its
    /// replies oldest first, authors and like counts resolved
    pub async fn thread(&self, post_id: Uuid) -> Result<Vec<CommentView>> {
        let mut top_level = self.store.top_level_comments(post_id).await?;
        top_level.reverse();

        let mut branches = Vec::with_capacity(top_level.len());
        for comment in top_level {
            let replies = self.store.replies(comment.id).await?;
            branches.push((comment, replies));
        }

        let author_ids = branches.iter().flat_map(|(comment, replies)| {
            std::iter::once(comment.author_id).chain(replies.iter().map(|r| r.author_id))
        });
        let authors = resolve_authors(self.store.as_ref(), author_ids).await?;

        let mut thread = Vec::with_capacity(branches.len());
        for (comment, replies) in branches {
            let mut reply_views = Vec::with_capacity(replies.len());
            for reply in replies {
                reply_views.push(self.view(reply, &authors, Vec::new()).await?);
            }
            thread.push(self.view(comment, &authors, reply_views).await?);
        }

        Ok(thread)
    }

    async fn view(
        &self,
        comment: Comment,
        authors: &HashMap<Uuid, AuthorSummary>,
        replies: Vec<CommentView>,
    ) -> Result<CommentView> {
        let likes = self
            .store
            .like_count(LikeTarget::Comment(comment.id))
            .await?;
        let author = authors
            .get(&comment.author_id)
            .cloned()
            .unwrap_or_else(|| AuthorSummary::unknown(comment.author_id));

        Ok(CommentView {
            comment,
            author,
            likes,
            replies,
        })
    }

    async fn author_of(&self, user_id: Uuid) -> Result<AuthorSummary> {
        Ok(self
            .store
            .find_user(user_id)
            .await?
            .map(|user| AuthorSummary::from(&user))
            .unwrap_or_else(|| AuthorSummary::unknown(user_id)))
    }
}

/// Look up display summaries for a set of (possibly repeated) user ids
pub(crate) async fn resolve_authors(
    store: &dyn ForumStore,
    ids: impl IntoIterator<Item = Uuid>,
) -> Result<HashMap<Uuid, AuthorSummary>> {
    let mut unique: Vec<Uuid> = ids.into_iter().collect();
    unique.sort();
    unique.dedup();

    Ok(store
        .find_authors(&unique)
        .await?
        .into_iter()
        .map(|author| (author.id, author))
        .collect())
}
