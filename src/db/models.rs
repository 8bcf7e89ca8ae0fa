use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::models::{
    Comment, CommentId, Essay, EssayId, EssayState, FileKey, Lifecycle, NewEssay, Profile,
    ProfileId, Review, Role, User, UserId,
};
use crate::repository::RepositoryError;

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub role: String,
    pub name: String,
    pub email: String,
    pub catch_phrase: Option<String>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: Role = row.role.parse().map_err(RepositoryError::Corrupt)?;
        Ok(User {
            id: UserId(row.id),
            role,
            name: row.name,
            email: row.email,
            catch_phrase: row.catch_phrase,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct ProfileRow {
    pub profile_id: i64,
    #[sqlx(flatten)]
    pub user: UserRow,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = RepositoryError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let teacher = User::try_from(row.user)?;
        if !teacher.is_teacher() {
            return Err(RepositoryError::Corrupt(format!(
                "profile {} belongs to non-teacher user {}",
                row.profile_id, teacher.id
            )));
        }
        Ok(Profile {
            id: ProfileId(row.profile_id),
            teacher,
        })
    }
}

/// One essay joined with its student (`s_*`) and teacher (`t_*`).
#[derive(Debug, FromRow)]
pub struct EssayRow {
    pub id: i64,
    pub univ: String,
    pub exam_year: String,
    pub e_type: String,
    pub inquiry: String,
    pub student_file: String,
    pub teacher_file: Option<String>,
    pub essay_state: String,
    pub reject_detail: Option<String>,
    pub review_score: Option<i16>,
    pub review_detail: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub s_id: i64,
    pub s_role: String,
    pub s_name: String,
    pub s_email: String,
    pub s_catch_phrase: Option<String>,
    pub t_id: i64,
    pub t_role: String,
    pub t_name: String,
    pub t_email: String,
    pub t_catch_phrase: Option<String>,
}

impl TryFrom<EssayRow> for Essay {
    type Error = RepositoryError;

    fn try_from(row: EssayRow) -> Result<Self, Self::Error> {
        let lifecycle = LifecycleColumns {
            essay_state: row.essay_state,
            teacher_file: row.teacher_file,
            reject_detail: row.reject_detail,
            review_score: row.review_score,
            review_detail: row.review_detail,
        }
        .into_lifecycle()
        .map_err(|e| RepositoryError::Corrupt(format!("essay {}: {}", row.id, e)))?;

        let student = User::try_from(UserRow {
            id: row.s_id,
            role: row.s_role,
            name: row.s_name,
            email: row.s_email,
            catch_phrase: row.s_catch_phrase,
        })?;
        let teacher = User::try_from(UserRow {
            id: row.t_id,
            role: row.t_role,
            name: row.t_name,
            email: row.t_email,
            catch_phrase: row.t_catch_phrase,
        })?;

        let draft = NewEssay {
            student,
            teacher,
            univ: row.univ,
            exam_year: row.exam_year,
            e_type: row.e_type,
            inquiry: row.inquiry,
            student_file: FileKey(row.student_file),
        };
        Ok(Essay::restore(
            EssayId(row.id),
            draft,
            lifecycle,
            row.version,
            row.created_at,
            row.updated_at,
        ))
    }
}

/// A comment joined with its author (`a_*`).
#[derive(Debug, FromRow)]
pub struct CommentRow {
    pub id: i64,
    pub essay_id: i64,
    pub detail: String,
    pub created_at: DateTime<Utc>,
    pub a_id: i64,
    pub a_role: String,
    pub a_name: String,
    pub a_email: String,
    pub a_catch_phrase: Option<String>,
}

impl TryFrom<CommentRow> for Comment {
    type Error = RepositoryError;

    fn try_from(row: CommentRow) -> Result<Self, Self::Error> {
        let author = User::try_from(UserRow {
            id: row.a_id,
            role: row.a_role,
            name: row.a_name,
            email: row.a_email,
            catch_phrase: row.a_catch_phrase,
        })?;
        Ok(Comment {
            id: CommentId(row.id),
            essay_id: EssayId(row.essay_id),
            author,
            detail: row.detail,
            created_at: row.created_at,
        })
    }
}

/// The flat columns a lifecycle is stored in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleColumns {
    pub essay_state: String,
    pub teacher_file: Option<String>,
    pub reject_detail: Option<String>,
    pub review_score: Option<i16>,
    pub review_detail: Option<String>,
}

impl LifecycleColumns {
    pub fn into_lifecycle(self) -> Result<Lifecycle, String> {
        let state: EssayState = self.essay_state.parse()?;
        let teacher_file = self.teacher_file.map(FileKey);

        if state != EssayState::Reject && self.reject_detail.is_some() {
            return Err(format!("reject detail set in {state} state"));
        }
        if state != EssayState::Complete
            && (self.review_score.is_some() || self.review_detail.is_some())
        {
            return Err(format!("review set in {state} state"));
        }

        match state {
            EssayState::Request => match teacher_file {
                None => Ok(Lifecycle::Requested),
                Some(_) => Err("teacher file set in REQUEST state".to_string()),
            },
            EssayState::Proceed => Ok(Lifecycle::Proceeding { teacher_file }),
            EssayState::Reject => {
                if teacher_file.is_some() {
                    return Err("teacher file set in REJECT state".to_string());
                }
                let detail = self
                    .reject_detail
                    .ok_or_else(|| "REJECT state without reject detail".to_string())?;
                Ok(Lifecycle::Rejected { detail })
            }
            EssayState::Complete => {
                let teacher_file =
                    teacher_file.ok_or_else(|| "COMPLETE state without teacher file".to_string())?;
                let review = match (self.review_score, self.review_detail) {
                    (None, None) => None,
                    (Some(score), Some(detail)) if (1..=5).contains(&score) => Some(Review {
                        score: score as u8,
                        detail,
                    }),
                    (Some(score), Some(_)) => return Err(format!("review score {score} out of range")),
                    _ => return Err("review score and detail must be set together".to_string()),
                };
                Ok(Lifecycle::Completed {
                    teacher_file,
                    review,
                })
            }
        }
    }
}

impl From<&Lifecycle> for LifecycleColumns {
    fn from(lifecycle: &Lifecycle) -> Self {
        let mut columns = LifecycleColumns {
            essay_state: lifecycle.state().as_str().to_string(),
            teacher_file: lifecycle.teacher_file().map(|key| key.as_str().to_string()),
            reject_detail: lifecycle.reject_detail().map(str::to_string),
            review_score: None,
            review_detail: None,
        };
        if let Some(review) = lifecycle.review() {
            columns.review_score = Some(i16::from(review.score));
            columns.review_detail = Some(review.detail.clone());
        }
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(state: &str) -> LifecycleColumns {
        LifecycleColumns {
            essay_state: state.to_string(),
            teacher_file: None,
            reject_detail: None,
            review_score: None,
            review_detail: None,
        }
    }

    #[test]
    fn lifecycles_survive_the_columns() {
        let lifecycles = [
            Lifecycle::Requested,
            Lifecycle::Proceeding { teacher_file: None },
            Lifecycle::Rejected {
                detail: "일정상 어렵습니다".to_string(),
            },
            Lifecycle::Completed {
                teacher_file: FileKey::from("20240305_751b44f7.pdf"),
                review: Some(Review {
                    score: 4,
                    detail: "감사합니다".to_string(),
                }),
            },
        ];
        for lifecycle in lifecycles {
            let restored = LifecycleColumns::from(&lifecycle).into_lifecycle().unwrap();
            assert_eq!(restored, lifecycle);
        }
    }

    #[test]
    fn inconsistent_columns_are_refused() {
        let mut reject_without_detail = columns("REJECT");
        assert!(reject_without_detail.clone().into_lifecycle().is_err());
        reject_without_detail.reject_detail = Some("busy".to_string());
        assert!(reject_without_detail.into_lifecycle().is_ok());

        assert!(columns("COMPLETE").into_lifecycle().is_err());
        assert!(columns("WAITING").into_lifecycle().is_err());

        let mut request_with_file = columns("REQUEST");
        request_with_file.teacher_file = Some("a.pdf".to_string());
        assert!(request_with_file.into_lifecycle().is_err());

        let mut half_review = columns("COMPLETE");
        half_review.teacher_file = Some("a.pdf".to_string());
        half_review.review_score = Some(3);
        assert!(half_review.into_lifecycle().is_err());
    }

    #[test]
    fn profile_rows_must_point_at_teachers() {
        let row = ProfileRow {
            profile_id: 1,
            user: UserRow {
                id: 2,
                role: "STUDENT".to_string(),
                name: "김경근".to_string(),
                email: "sulsul@gmail.com".to_string(),
                catch_phrase: None,
            },
        };
        assert!(matches!(
            Profile::try_from(row),
            Err(RepositoryError::Corrupt(_))
        ));
    }
}
