mod models;

pub use models::*;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

use crate::models::{
    Comment, CommentId, Essay, EssayId, EssayState, NewComment, NewEssay, Profile, ProfileId,
    User, UserId,
};
use crate::repository::{CommentRepository, EssayRepository, RepositoryError, UserRepository};

pub type DbPool = Arc<PgPool>;

pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(Arc::new(pool))
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

const ESSAY_SELECT: &str = r#"
    SELECT e.id, e.univ, e.exam_year, e.e_type, e.inquiry, e.student_file, e.teacher_file,
           e.essay_state, e.reject_detail, e.review_score, e.review_detail, e.version,
           e.created_at, e.updated_at,
           s.id AS s_id, s.role AS s_role, s.name AS s_name, s.email AS s_email,
           s.catch_phrase AS s_catch_phrase,
           t.id AS t_id, t.role AS t_role, t.name AS t_name, t.email AS t_email,
           t.catch_phrase AS t_catch_phrase
    FROM essays e
    JOIN users s ON s.id = e.student_id
    JOIN users t ON t.id = e.teacher_id
"#;

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.essay_id, c.detail, c.created_at,
           a.id AS a_id, a.role AS a_role, a.name AS a_name, a.email AS a_email,
           a.catch_phrase AS a_catch_phrase
    FROM comments c
    JOIN users a ON a.id = c.author_id
"#;

/// Repository backed by PostgreSQL.
#[derive(Clone)]
pub struct PgRepository {
    pool: DbPool,
}

impl PgRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load_essay(&self, id: EssayId) -> Result<Option<Essay>, RepositoryError> {
        let row = sqlx::query_as::<_, EssayRow>(&format!("{ESSAY_SELECT} WHERE e.id = $1"))
            .bind(id.0)
            .fetch_optional(self.pool.as_ref())
            .await?;
        row.map(Essay::try_from).transpose()
    }

    async fn load_comment(&self, id: CommentId) -> Result<Option<Comment>, RepositoryError> {
        let row = sqlx::query_as::<_, CommentRow>(&format!("{COMMENT_SELECT} WHERE c.id = $1"))
            .bind(id.0)
            .fetch_optional(self.pool.as_ref())
            .await?;
        row.map(Comment::try_from).transpose()
    }
}

#[async_trait]
impl UserRepository for PgRepository {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, role, name, email, catch_phrase FROM users WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(self.pool.as_ref())
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_profile(&self, id: ProfileId) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT p.id AS profile_id, u.id, u.role, u.name, u.email, u.catch_phrase
            FROM profiles p
            JOIN users u ON u.id = p.user_id
            WHERE p.id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(self.pool.as_ref())
        .await?;
        row.map(Profile::try_from).transpose()
    }
}

#[async_trait]
impl EssayRepository for PgRepository {
    async fn insert(&self, essay: NewEssay) -> Result<Essay, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO essays (student_id, teacher_id, univ, exam_year, e_type, inquiry, student_file)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(essay.student.id.0)
        .bind(essay.teacher.id.0)
        .bind(&essay.univ)
        .bind(&essay.exam_year)
        .bind(&essay.e_type)
        .bind(&essay.inquiry)
        .bind(essay.student_file.as_str())
        .fetch_one(self.pool.as_ref())
        .await?;

        let id = EssayId(id);
        self.load_essay(id)
            .await?
            .ok_or(RepositoryError::MissingEssay(id))
    }

    async fn find(&self, id: EssayId) -> Result<Option<Essay>, RepositoryError> {
        self.load_essay(id).await
    }

    async fn find_by_participant(
        &self,
        user_id: UserId,
        state: EssayState,
    ) -> Result<Vec<Essay>, RepositoryError> {
        let rows = sqlx::query_as::<_, EssayRow>(&format!(
            "{ESSAY_SELECT} WHERE (e.student_id = $1 OR e.teacher_id = $1) AND e.essay_state = $2 ORDER BY e.id"
        ))
        .bind(user_id.0)
        .bind(state.as_str())
        .fetch_all(self.pool.as_ref())
        .await?;
        rows.into_iter().map(Essay::try_from).collect()
    }

    async fn update(&self, essay: &Essay) -> Result<Essay, RepositoryError> {
        let columns = LifecycleColumns::from(essay.lifecycle());
        let result = sqlx::query(
            r#"
            UPDATE essays
            SET essay_state = $2, teacher_file = $3, reject_detail = $4,
                review_score = $5, review_detail = $6,
                version = version + 1, updated_at = NOW()
            WHERE id = $1 AND version = $7
            "#,
        )
        .bind(essay.id.0)
        .bind(&columns.essay_state)
        .bind(&columns.teacher_file)
        .bind(&columns.reject_detail)
        .bind(columns.review_score)
        .bind(&columns.review_detail)
        .bind(essay.version)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM essays WHERE id = $1)")
                    .bind(essay.id.0)
                    .fetch_one(self.pool.as_ref())
                    .await?;
            return Err(if exists {
                RepositoryError::Conflict(essay.id)
            } else {
                RepositoryError::MissingEssay(essay.id)
            });
        }

        self.load_essay(essay.id)
            .await?
            .ok_or(RepositoryError::MissingEssay(essay.id))
    }
}

#[async_trait]
impl CommentRepository for PgRepository {
    async fn insert(&self, comment: NewComment) -> Result<Comment, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO comments (essay_id, author_id, detail) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(comment.essay_id.0)
        .bind(comment.author.id.0)
        .bind(&comment.detail)
        .fetch_one(self.pool.as_ref())
        .await?;

        let id = CommentId(id);
        self.load_comment(id).await?.ok_or_else(|| {
            RepositoryError::Corrupt(format!("comment {id} vanished after insert"))
        })
    }

    async fn find(&self, id: CommentId) -> Result<Option<Comment>, RepositoryError> {
        self.load_comment(id).await
    }

    async fn list_for_essay(&self, essay_id: EssayId) -> Result<Vec<Comment>, RepositoryError> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            "{COMMENT_SELECT} WHERE c.essay_id = $1 ORDER BY c.created_at, c.id"
        ))
        .bind(essay_id.0)
        .fetch_all(self.pool.as_ref())
        .await?;
        rows.into_iter().map(Comment::try_from).collect()
    }

    async fn delete(&self, id: CommentId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id.0)
            .execute(self.pool.as_ref())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
