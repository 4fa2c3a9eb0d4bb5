/// Business logic layer
///
/// Services own the rules; handlers translate HTTP to service calls and the
/// store persists records.
pub mod auth;
pub mod comment_tree;
pub mod files;
pub mod posts;

pub use auth::AuthService;
pub use comment_tree::CommentTree;
pub use files::FileService;
pub use posts::PostService;
