/// Authorization module for forum-service
///
/// Ownership is a plain equality check between the acting user and the
/// author recorded on the resource.
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Comment, Post};

/// Check if a user authored a post
pub fn check_post_ownership(user_id: Uuid, post: &Post) -> Result<()> {
    if post.author_id == user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You don't have permission to modify this post".into(),
        ))
    }
}

/// Check if a user authored a comment
pub fn check_comment_ownership(user_id: Uuid, comment: &Comment) -> Result<()> {
    if comment.author_id == user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You don't have permission to delete this comment".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn comment_by(author_id: Uuid) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            post_id: Uuid::new_v4(),
            author_id,
            content: "hi".into(),
            parent_comment_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_comment_ownership() {
        let author = Uuid::new_v4();
        let comment = comment_by(author);

        assert!(check_comment_ownership(author, &comment).is_ok());
        assert!(matches!(
            check_comment_ownership(Uuid::new_v4(), &comment),
            Err(AppError::Forbidden(_))
        ));
    }
}
