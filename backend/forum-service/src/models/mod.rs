/// Data models for forum-service
///
/// - `user`: accounts and the author summaries embedded in responses
/// - `post`: posts, categories, attachments and list filters
/// - `comment`: comments, replies and the rendered thread view
pub mod comment;
pub mod post;
pub mod user;

pub use comment::{Comment, CommentView, CommentWithAuthor, NewComment};
pub use post::{Category, NewPost, NewPostFile, Post, PostChanges, PostFile, PostFilter};
pub use user::{AuthorSummary, NewUser, ProfileChanges, PublicUser, User};
