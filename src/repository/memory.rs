//! In-memory implementation of the repository traits.
//!
//! All data lives in maps behind `tokio::sync::RwLock`s and is lost on
//! restart. Version checks on update happen under the essay write lock, which
//! gives the same compare-and-swap behavior as the SQL implementation.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{CommentRepository, EssayRepository, RepositoryError, UserRepository};
use crate::models::{
    Comment, CommentId, Essay, EssayId, EssayState, Lifecycle, NewComment, NewEssay, Profile,
    ProfileId, Role, User, UserId,
};

pub struct InMemoryRepository {
    users: RwLock<HashMap<UserId, User>>,
    profiles: RwLock<HashMap<ProfileId, Profile>>,
    essays: RwLock<BTreeMap<EssayId, Essay>>,
    comments: RwLock<BTreeMap<CommentId, Comment>>,
    next_essay_id: AtomicI64,
    next_comment_id: AtomicI64,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            profiles: RwLock::new(HashMap::new()),
            essays: RwLock::new(BTreeMap::new()),
            comments: RwLock::new(BTreeMap::new()),
            next_essay_id: AtomicI64::new(1),
            next_comment_id: AtomicI64::new(1),
        }
    }

    pub async fn add_user(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }

    pub async fn add_profile(&self, profile: Profile) {
        self.profiles.write().await.insert(profile.id, profile);
    }

    /// Stores an essay as-is, keeping its id and version.
    #[cfg(test)]
    pub async fn put_essay(&self, essay: Essay) {
        self.next_essay_id
            .fetch_max(essay.id.0 + 1, Ordering::SeqCst);
        self.essays.write().await.insert(essay.id, essay);
    }

    /// Stores a comment as-is, keeping its id.
    #[cfg(test)]
    pub async fn put_comment(&self, comment: Comment) {
        self.next_comment_id
            .fetch_max(comment.id.0 + 1, Ordering::SeqCst);
        self.comments.write().await.insert(comment.id, comment);
    }
}

impl InMemoryRepository {
    /// Adds one teacher with a public profile and one student, so a
    /// database-less server can be exercised by hand.
    pub async fn seed_demo(&self) {
        let teacher = User {
            id: UserId(1),
            role: Role::Teacher,
            name: "임탁균".to_string(),
            email: "sulsul@naver.com".to_string(),
            catch_phrase: Some("항상 최선을 다하겠습니다. 화이링".to_string()),
        };
        let student = User {
            id: UserId(2),
            role: Role::Student,
            name: "김경근".to_string(),
            email: "sulsul@gmail.com".to_string(),
            catch_phrase: None,
        };
        self.add_profile(Profile {
            id: ProfileId(1),
            teacher: teacher.clone(),
        })
        .await;
        self.add_user(teacher).await;
        self.add_user(student).await;
        tracing::info!("Seeded demo users: teacher 1 (profile 1), student 2");
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_profile(&self, id: ProfileId) -> Result<Option<Profile>, RepositoryError> {
        Ok(self.profiles.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl EssayRepository for InMemoryRepository {
    async fn insert(&self, essay: NewEssay) -> Result<Essay, RepositoryError> {
        let id = EssayId(self.next_essay_id.fetch_add(1, Ordering::SeqCst));
        let now = Utc::now();
        let essay = Essay::restore(id, essay, Lifecycle::Requested, 0, now, now);
        self.essays.write().await.insert(id, essay.clone());
        Ok(essay)
    }

    async fn find(&self, id: EssayId) -> Result<Option<Essay>, RepositoryError> {
        Ok(self.essays.read().await.get(&id).cloned())
    }

    async fn find_by_participant(
        &self,
        user_id: UserId,
        state: EssayState,
    ) -> Result<Vec<Essay>, RepositoryError> {
        let essays = self.essays.read().await;
        Ok(essays
            .values()
            .filter(|essay| essay.student.id == user_id || essay.teacher.id == user_id)
            .filter(|essay| essay.state() == state)
            .cloned()
            .collect())
    }

    async fn update(&self, essay: &Essay) -> Result<Essay, RepositoryError> {
        let mut essays = self.essays.write().await;
        let stored = essays
            .get_mut(&essay.id)
            .ok_or(RepositoryError::MissingEssay(essay.id))?;
        if stored.version != essay.version {
            return Err(RepositoryError::Conflict(essay.id));
        }

        let mut saved = essay.clone();
        saved.version += 1;
        saved.updated_at = Utc::now();
        *stored = saved.clone();
        Ok(saved)
    }
}

#[async_trait]
impl CommentRepository for InMemoryRepository {
    async fn insert(&self, comment: NewComment) -> Result<Comment, RepositoryError> {
        let id = CommentId(self.next_comment_id.fetch_add(1, Ordering::SeqCst));
        let comment = Comment {
            id,
            essay_id: comment.essay_id,
            author: comment.author,
            detail: comment.detail,
            created_at: Utc::now(),
        };
        self.comments.write().await.insert(id, comment.clone());
        Ok(comment)
    }

    async fn find(&self, id: CommentId) -> Result<Option<Comment>, RepositoryError> {
        Ok(self.comments.read().await.get(&id).cloned())
    }

    async fn list_for_essay(&self, essay_id: EssayId) -> Result<Vec<Comment>, RepositoryError> {
        let comments = self.comments.read().await;
        Ok(comments
            .values()
            .filter(|comment| comment.essay_id == essay_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: CommentId) -> Result<bool, RepositoryError> {
        Ok(self.comments.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[tokio::test]
    async fn insert_starts_in_request_with_fresh_ids() {
        let repo = InMemoryRepository::new();
        let teacher = fixtures::teacher1(1);
        let student = fixtures::student1(2);

        let first = EssayRepository::insert(&repo, fixtures::new_essay1(&student, &teacher))
            .await
            .unwrap();
        let second = EssayRepository::insert(&repo, fixtures::new_essay2(&student, &teacher))
            .await
            .unwrap();

        assert_eq!(first.id, EssayId(1));
        assert_eq!(second.id, EssayId(2));
        assert_eq!(first.state(), EssayState::Request);
        assert_eq!(first.version, 0);
    }

    #[tokio::test]
    async fn find_by_participant_filters_on_user_and_state() {
        let repo = InMemoryRepository::new();
        let student = fixtures::student1(1);
        let t1 = fixtures::teacher1(2);
        let t2 = fixtures::teacher2(3);
        repo.put_essay(fixtures::essay1(1, &student, &t1, Lifecycle::Requested))
            .await;
        repo.put_essay(fixtures::essay2(2, &student, &t2, Lifecycle::Requested))
            .await;
        repo.put_essay(fixtures::essay1(
            3,
            &student,
            &t1,
            Lifecycle::Proceeding { teacher_file: None },
        ))
        .await;

        let for_student = repo
            .find_by_participant(student.id, EssayState::Request)
            .await
            .unwrap();
        assert_eq!(
            for_student.iter().map(|e| e.id).collect::<Vec<_>>(),
            vec![EssayId(1), EssayId(2)]
        );

        let for_t1 = repo
            .find_by_participant(t1.id, EssayState::Request)
            .await
            .unwrap();
        assert_eq!(for_t1.iter().map(|e| e.id).collect::<Vec<_>>(), vec![EssayId(1)]);

        let proceeding = repo
            .find_by_participant(t2.id, EssayState::Proceed)
            .await
            .unwrap();
        assert!(proceeding.is_empty());
    }

    #[tokio::test]
    async fn stale_update_is_rejected() {
        let repo = InMemoryRepository::new();
        let student = fixtures::student1(1);
        let teacher = fixtures::teacher1(2);
        repo.put_essay(fixtures::essay1(1, &student, &teacher, Lifecycle::Requested))
            .await;

        let mut accepted = EssayRepository::find(&repo, EssayId(1))
            .await
            .unwrap()
            .unwrap();
        let mut rejected = accepted.clone();
        accepted.accept().unwrap();
        rejected.reject("busy".to_string()).unwrap();

        let saved = repo.update(&accepted).await.unwrap();
        assert_eq!(saved.version, 1);
        assert!(matches!(
            repo.update(&rejected).await,
            Err(RepositoryError::Conflict(EssayId(1)))
        ));

        let stored = EssayRepository::find(&repo, EssayId(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.state(), EssayState::Proceed);
    }

    #[tokio::test]
    async fn comments_are_listed_in_insertion_order() {
        let repo = InMemoryRepository::new();
        let student = fixtures::student1(1);
        let teacher = fixtures::teacher1(2);
        let essay = fixtures::essay1(1, &student, &teacher, Lifecycle::Requested);

        for (author, detail) in [(&student, "first"), (&teacher, "second"), (&student, "third")] {
            CommentRepository::insert(
                &repo,
                NewComment {
                    essay_id: essay.id,
                    author: author.clone(),
                    detail: detail.to_string(),
                },
            )
            .await
            .unwrap();
        }

        let listed = repo.list_for_essay(essay.id).await.unwrap();
        let details: Vec<_> = listed.iter().map(|c| c.detail.as_str()).collect();
        assert_eq!(details, vec!["first", "second", "third"]);
        assert_eq!(listed[1].author.name, "임탁균");
        assert!(repo.list_for_essay(EssayId(99)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn demo_seed_links_the_profile_to_a_teacher() {
        let repo = InMemoryRepository::new();
        repo.seed_demo().await;

        let profile = repo.find_profile(ProfileId(1)).await.unwrap().unwrap();
        assert!(profile.teacher.is_teacher());
        let student = repo.find_user(UserId(2)).await.unwrap().unwrap();
        assert!(student.is_student());
    }
}
