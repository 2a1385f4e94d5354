use chrono::Utc;
use sqlx::{SqliteExecutor, SqlitePool};

use crate::db::reputation;
use crate::models::{Comment, Post, VoteCounts};

const POST_SELECT: &str = r#"
    SELECT p.post_id, p.user_id, u.username, p.title, p.content, p.upvotes, p.downvotes,
           p.created_at, p.updated_at
    FROM posts p
    JOIN users u ON u.user_id = p.user_id
"#;

const COMMENT_SELECT: &str = r#"
    SELECT c.comment_id, c.post_id, c.user_id, u.username, c.content, c.upvotes, c.downvotes,
           c.created_at, c.updated_at
    FROM comments c
    JOIN users u ON u.user_id = c.user_id
"#;

// ============================================================================
// Posts and comments
// ============================================================================

pub async fn insert_post(
    pool: &SqlitePool,
    user_id: i64,
    title: &str,
    content: &str,
) -> Result<Post, sqlx::Error> {
    let now = Utc::now();
    let post_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO posts (user_id, title, content, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING post_id
        "#,
    )
    .bind(user_id)
    .bind(title)
    .bind(content)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    find_post(pool, post_id).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn find_post(db: impl SqliteExecutor<'_>, post_id: i64) -> Result<Option<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>(&format!("{POST_SELECT} WHERE p.post_id = ?"))
        .bind(post_id)
        .fetch_optional(db)
        .await
}

pub async fn post_exists(db: impl SqliteExecutor<'_>, post_id: i64) -> Result<bool, sqlx::Error> {
    let found: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE post_id = ?")
        .bind(post_id)
        .fetch_one(db)
        .await?;
    Ok(found > 0)
}

/// Newest posts first.
pub async fn list_posts(
    db: impl SqliteExecutor<'_>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>(&format!(
        "{POST_SELECT} ORDER BY p.created_at DESC, p.post_id DESC LIMIT ? OFFSET ?"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
}

pub async fn insert_comment(
    pool: &SqlitePool,
    post_id: i64,
    user_id: i64,
    content: &str,
) -> Result<Comment, sqlx::Error> {
    let now = Utc::now();
    let comment_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO comments (post_id, user_id, content, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING comment_id
        "#,
    )
    .bind(post_id)
    .bind(user_id)
    .bind(content)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    sqlx::query_as::<_, Comment>(&format!("{COMMENT_SELECT} WHERE c.comment_id = ?"))
        .bind(comment_id)
        .fetch_one(pool)
        .await
}

/// Comments on a post in the order they were written.
pub async fn list_comments(
    db: impl SqliteExecutor<'_>,
    post_id: i64,
) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(&format!(
        "{COMMENT_SELECT} WHERE c.post_id = ? ORDER BY c.created_at ASC, c.comment_id ASC"
    ))
    .bind(post_id)
    .fetch_all(db)
    .await
}

// ============================================================================
// Voting
// ============================================================================

/// Votable forum content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteTarget {
    Post,
    Comment,
}

impl VoteTarget {
    fn table(self) -> &'static str {
        match self {
            VoteTarget::Post => "posts",
            VoteTarget::Comment => "comments",
        }
    }

    fn id_column(self) -> &'static str {
        match self {
            VoteTarget::Post => "post_id",
            VoteTarget::Comment => "comment_id",
        }
    }

    /// Name used in not-found errors.
    pub fn label(self) -> &'static str {
        match self {
            VoteTarget::Post => "Post",
            VoteTarget::Comment => "Comment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteKind {
    Up,
    Down,
}

impl VoteKind {
    fn column(self) -> &'static str {
        match self {
            VoteKind::Up => "upvotes",
            VoteKind::Down => "downvotes",
        }
    }
}

/// Add a vote. An upvote credits the author's aura in the same transaction.
/// Returns `None` if the target does not exist.
pub async fn cast_vote(
    pool: &SqlitePool,
    target: VoteTarget,
    id: i64,
    kind: VoteKind,
) -> Result<Option<VoteCounts>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let column = kind.column();
    let row: Option<(i64, i64, i64)> = sqlx::query_as(&format!(
        "UPDATE {table} SET {column} = {column} + 1 WHERE {id_column} = ? \
         RETURNING user_id, upvotes, downvotes",
        table = target.table(),
        id_column = target.id_column(),
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some((author_id, upvotes, downvotes)) = row else {
        return Ok(None);
    };

    if kind == VoteKind::Up {
        reputation::credit_aura(&mut *tx, author_id).await?;
    }

    tx.commit().await?;
    Ok(Some(VoteCounts { upvotes, downvotes }))
}

/// Take a vote back. Counters stop at zero and reputation is left alone.
/// Returns `None` if the target does not exist.
pub async fn retract_vote(
    db: impl SqliteExecutor<'_>,
    target: VoteTarget,
    id: i64,
    kind: VoteKind,
) -> Result<Option<VoteCounts>, sqlx::Error> {
    let column = kind.column();
    sqlx::query_as::<_, VoteCounts>(&format!(
        "UPDATE {table} SET {column} = MAX({column} - 1, 0) WHERE {id_column} = ? \
         RETURNING upvotes, downvotes",
        table = target.table(),
        id_column = target.id_column(),
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}
