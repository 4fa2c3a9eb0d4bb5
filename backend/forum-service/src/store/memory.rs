/// In-process store
///
/// All records live in one arena guarded by a single `RwLock`, so each call is
/// atomic on its own and nothing spans calls. Child lists are computed by
/// scanning the arena, the same way the SQL store derives them from foreign
/// keys. Insertion order is tracked with a sequence number so that ordering
/// stays stable when timestamps collide.
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::{CommentStore, ForumStore, LikeStore, LikeTarget, PostStore, UserStore};
use crate::error::{AppError, Result};
use crate::models::{
    AuthorSummary, Comment, NewComment, NewPost, NewPostFile, NewUser, Post, PostChanges,
    PostFile, PostFilter, ProfileChanges, User,
};

struct Entry<T> {
    seq: u64,
    record: T,
}

#[derive(Default)]
struct Arena {
    seq: u64,
    users: HashMap<Uuid, User>,
    posts: HashMap<Uuid, Entry<Post>>,
    files: HashMap<Uuid, Entry<PostFile>>,
    comments: HashMap<Uuid, Entry<Comment>>,
    likes: HashMap<LikeTarget, Vec<Uuid>>,
}

impl Arena {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn sorted_comments<F>(&self, keep: F) -> Vec<Comment>
    where
        F: Fn(&Comment) -> bool,
    {
        let mut matched: Vec<&Entry<Comment>> =
            self.comments.values().filter(|e| keep(&e.record)).collect();
        matched.sort_by_key(|e| e.seq);
        matched.into_iter().map(|e| e.record.clone()).collect()
    }

    fn remove_comment(&mut self, id: Uuid) -> bool {
        self.likes.remove(&LikeTarget::Comment(id));
        self.comments.remove(&id).is_some()
    }

    fn username_taken(&self, username: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| u.username == username && Some(u.id) != except)
    }
}

/// Arena-backed [`ForumStore`]
#[derive(Default)]
pub struct MemoryStore {
    arena: RwLock<Arena>,
    failpoints: Mutex<HashSet<&'static str>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call of the named store operation fail with a
    /// `Database` error. Used to exercise recovery from partial cascades.
    pub async fn fail_next(&self, operation: &'static str) {
        self.failpoints.lock().await.insert(operation);
    }

    async fn check_failpoint(&self, operation: &'static str) -> Result<()> {
        if self.failpoints.lock().await.remove(operation) {
            return Err(AppError::Database(format!(
                "injected failure in {}",
                operation
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let mut arena = self.arena.write().await;

        if arena.username_taken(&user.username, None) {
            return Err(AppError::Conflict("username already taken".into()));
        }
        if arena.users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("email already registered".into()));
        }

        let record = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            avatar: String::new(),
            bio: String::new(),
            created_at: Utc::now(),
        };
        arena.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.arena.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let arena = self.arena.read().await;
        Ok(arena.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let arena = self.arena.read().await;
        Ok(arena.users.values().find(|u| u.username == username).cloned())
    }

    async fn update_user_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
    ) -> Result<Option<User>> {
        let mut arena = self.arena.write().await;

        if let Some(username) = &changes.username {
            if arena.username_taken(username, Some(id)) {
                return Err(AppError::Conflict("username already taken".into()));
            }
        }

        let Some(user) = arena.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(bio) = changes.bio {
            user.bio = bio;
        }
        Ok(Some(user.clone()))
    }

    async fn find_authors(&self, ids: &[Uuid]) -> Result<Vec<AuthorSummary>> {
        let arena = self.arena.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| arena.users.get(id))
            .map(AuthorSummary::from)
            .collect())
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn insert_post(&self, post: NewPost, files: Vec<NewPostFile>) -> Result<Post> {
        let mut arena = self.arena.write().await;
        let now = Utc::now();

        let record = Post {
            id: Uuid::new_v4(),
            author_id: post.author_id,
            title: post.title,
            content: post.content,
            category: post.category,
            tags: post.tags,
            views: 0,
            created_at: now,
            updated_at: now,
        };

        for file in files {
            let seq = arena.next_seq();
            let stored = PostFile {
                id: Uuid::new_v4(),
                post_id: record.id,
                filename: file.filename,
                original_name: file.original_name,
                mimetype: file.mimetype,
                size: file.size,
                path: file.path,
                upload_date: now,
            };
            arena.files.insert(stored.id, Entry { seq, record: stored });
        }

        let seq = arena.next_seq();
        arena.posts.insert(
            record.id,
            Entry {
                seq,
                record: record.clone(),
            },
        );
        Ok(record)
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>> {
        let arena = self.arena.read().await;
        Ok(arena.posts.get(&id).map(|e| e.record.clone()))
    }

    async fn list_posts(&self, filter: &PostFilter) -> Result<(Vec<Post>, i64)> {
        let arena = self.arena.read().await;
        let needle = filter.search.as_ref().map(|s| s.to_lowercase());

        let mut matched: Vec<&Entry<Post>> = arena
            .posts
            .values()
            .filter(|e| filter.category.map_or(true, |c| e.record.category == c))
            .filter(|e| {
                filter
                    .tag
                    .as_ref()
                    .map_or(true, |tag| e.record.tags.iter().any(|t| t == tag))
            })
            .filter(|e| {
                needle.as_ref().map_or(true, |needle| {
                    e.record.title.to_lowercase().contains(needle.as_str())
                        || e.record.content.to_lowercase().contains(needle.as_str())
                })
            })
            .collect();
        matched.sort_by(|a, b| b.seq.cmp(&a.seq));

        let total = matched.len() as i64;
        let page = matched
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .map(|e| e.record.clone())
            .collect();
        Ok((page, total))
    }

    async fn update_post(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>> {
        let mut arena = self.arena.write().await;
        let Some(entry) = arena.posts.get_mut(&id) else {
            return Ok(None);
        };

        let post = &mut entry.record;
        if let Some(title) = changes.title {
            post.title = title;
        }
        if let Some(content) = changes.content {
            post.content = content;
        }
        if let Some(category) = changes.category {
            post.category = category;
        }
        if let Some(tags) = changes.tags {
            post.tags = tags;
        }
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn increment_views(&self, id: Uuid) -> Result<()> {
        let mut arena = self.arena.write().await;
        if let Some(entry) = arena.posts.get_mut(&id) {
            entry.record.views += 1;
        }
        Ok(())
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool> {
        self.check_failpoint("delete_post").await?;
        let mut arena = self.arena.write().await;
        arena.files.retain(|_, e| e.record.post_id != id);
        arena.likes.remove(&LikeTarget::Post(id));
        Ok(arena.posts.remove(&id).is_some())
    }

    async fn post_files(&self, post_id: Uuid) -> Result<Vec<PostFile>> {
        let arena = self.arena.read().await;
        let mut files: Vec<&Entry<PostFile>> = arena
            .files
            .values()
            .filter(|e| e.record.post_id == post_id)
            .collect();
        files.sort_by_key(|e| e.seq);
        Ok(files.into_iter().map(|e| e.record.clone()).collect())
    }

    async fn find_post_file(&self, post_id: Uuid, file_id: Uuid) -> Result<Option<PostFile>> {
        let arena = self.arena.read().await;
        Ok(arena
            .files
            .get(&file_id)
            .filter(|e| e.record.post_id == post_id)
            .map(|e| e.record.clone()))
    }

    async fn delete_post_file(&self, post_id: Uuid, file_id: Uuid) -> Result<bool> {
        let mut arena = self.arena.write().await;
        let belongs = arena
            .files
            .get(&file_id)
            .map_or(false, |e| e.record.post_id == post_id);
        if belongs {
            arena.files.remove(&file_id);
        }
        Ok(belongs)
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn insert_comment(&self, comment: NewComment) -> Result<Comment> {
        self.check_failpoint("insert_comment").await?;
        let mut arena = self.arena.write().await;
        let now = Utc::now();

        let record = Comment {
            id: Uuid::new_v4(),
            post_id: comment.post_id,
            author_id: comment.author_id,
            content: comment.content,
            parent_comment_id: comment.parent_comment_id,
            created_at: now,
            updated_at: now,
        };
        let seq = arena.next_seq();
        arena.comments.insert(
            record.id,
            Entry {
                seq,
                record: record.clone(),
            },
        );
        Ok(record)
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>> {
        let arena = self.arena.read().await;
        Ok(arena.comments.get(&id).map(|e| e.record.clone()))
    }

    async fn top_level_comments(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        let arena = self.arena.read().await;
        Ok(arena.sorted_comments(|c| c.post_id == post_id && c.parent_comment_id.is_none()))
    }

    async fn replies(&self, parent_id: Uuid) -> Result<Vec<Comment>> {
        let arena = self.arena.read().await;
        Ok(arena.sorted_comments(|c| c.parent_comment_id == Some(parent_id)))
    }

    async fn count_comments(&self, post_id: Uuid) -> Result<i64> {
        let arena = self.arena.read().await;
        Ok(arena
            .comments
            .values()
            .filter(|e| e.record.post_id == post_id && e.record.parent_comment_id.is_none())
            .count() as i64)
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool> {
        self.check_failpoint("delete_comment").await?;
        Ok(self.arena.write().await.remove_comment(id))
    }

    async fn delete_replies(&self, parent_id: Uuid) -> Result<u64> {
        self.check_failpoint("delete_replies").await?;
        let mut arena = self.arena.write().await;
        let ids: Vec<Uuid> = arena
            .sorted_comments(|c| c.parent_comment_id == Some(parent_id))
            .into_iter()
            .map(|c| c.id)
            .collect();

        let mut removed = 0;
        for id in ids {
            if arena.remove_comment(id) {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn delete_comments_by_post(&self, post_id: Uuid) -> Result<u64> {
        self.check_failpoint("delete_comments_by_post").await?;
        let mut arena = self.arena.write().await;
        let ids: Vec<Uuid> = arena
            .comments
            .values()
            .filter(|e| e.record.post_id == post_id)
            .map(|e| e.record.id)
            .collect();

        let mut removed = 0;
        for id in ids {
            if arena.remove_comment(id) {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl LikeStore for MemoryStore {
    async fn toggle_like(&self, target: LikeTarget, user_id: Uuid) -> Result<(bool, i64)> {
        let mut arena = self.arena.write().await;
        let users = arena.likes.entry(target).or_default();

        let liked = match users.iter().position(|u| *u == user_id) {
            Some(index) => {
                users.remove(index);
                false
            }
            None => {
                users.push(user_id);
                true
            }
        };
        Ok((liked, users.len() as i64))
    }

    async fn like_count(&self, target: LikeTarget) -> Result<i64> {
        let arena = self.arena.read().await;
        Ok(arena.likes.get(&target).map_or(0, |users| users.len() as i64))
    }

    async fn likers(&self, target: LikeTarget) -> Result<Vec<Uuid>> {
        let arena = self.arena.read().await;
        Ok(arena.likes.get(&target).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl ForumStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    async fn seed_post(store: &MemoryStore, title: &str, tags: &[&str]) -> Post {
        store
            .insert_post(
                NewPost {
                    author_id: Uuid::new_v4(),
                    title: title.to_string(),
                    content: format!("{} body", title),
                    category: Category::Discussion,
                    tags: tags.iter().map(|t| t.to_string()).collect(),
                },
                vec![],
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_username_is_conflict() {
        let store = MemoryStore::new();
        let new_user = |name: &str, email: &str| NewUser {
            username: name.into(),
            email: email.into(),
            password_hash: "hash".into(),
        };

        store.insert_user(new_user("alice", "a@example.com")).await.unwrap();
        let err = store
            .insert_user(new_user("alice", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = store
            .insert_user(new_user("alice2", "a@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_posts_filters_and_pages() {
        let store = MemoryStore::new();
        seed_post(&store, "Rust ownership", &["rust"]).await;
        seed_post(&store, "Async in practice", &["rust", "async"]).await;
        let newest = seed_post(&store, "Cooking", &["food"]).await;

        let (page, total) = store.list_posts(&PostFilter::default()).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(page[0].id, newest.id);

        let by_tag = PostFilter {
            tag: Some("rust".into()),
            ..PostFilter::default()
        };
        assert_eq!(store.list_posts(&by_tag).await.unwrap().1, 2);

        let by_search = PostFilter {
            search: Some("OWNERSHIP".into()),
            ..PostFilter::default()
        };
        let (found, _) = store.list_posts(&by_search).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Rust ownership");

        let second_page = PostFilter {
            limit: 2,
            offset: 2,
            ..PostFilter::default()
        };
        let (page, total) = store.list_posts(&second_page).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_like_flips() {
        let store = MemoryStore::new();
        let target = LikeTarget::Post(Uuid::new_v4());
        let user = Uuid::new_v4();

        assert_eq!(store.toggle_like(target, user).await.unwrap(), (true, 1));
        assert_eq!(store.toggle_like(target, user).await.unwrap(), (false, 0));
        assert!(store.likers(target).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failpoint_fires_once() {
        let store = MemoryStore::new();
        store.fail_next("delete_comment").await;

        assert!(store.delete_comment(Uuid::new_v4()).await.is_err());
        assert!(!store.delete_comment(Uuid::new_v4()).await.unwrap());
    }
}
