//! The essay lifecycle as an explicit state machine.
//!
//! Each variant carries exactly the data that is valid in that state, so a
//! reject detail outside REJECT or a teacher file on a fresh request cannot be
//! expressed. Transition methods are the only way to move between variants and
//! they never go back to `Requested`.

use thiserror::Error;

use super::{EssayState, FileKey, ReviewState};

/// A student's rating of a completed correction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub score: u8,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lifecycle {
    /// Submitted by the student, waiting for the teacher.
    Requested,
    /// Accepted; the annotated file may not be uploaded yet.
    Proceeding { teacher_file: Option<FileKey> },
    /// Declined by the teacher. Terminal.
    Rejected { detail: String },
    /// Finalized by the teacher. Terminal apart from the optional review.
    Completed {
        teacher_file: FileKey,
        review: Option<Review>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot {action} an essay in {from} state")]
    WrongState {
        action: &'static str,
        from: EssayState,
    },
    #[error("cannot complete an essay before the teacher file is uploaded")]
    MissingTeacherFile,
    #[error("essay has already been reviewed")]
    AlreadyReviewed,
}

impl Lifecycle {
    pub fn state(&self) -> EssayState {
        match self {
            Lifecycle::Requested => EssayState::Request,
            Lifecycle::Proceeding { .. } => EssayState::Proceed,
            Lifecycle::Rejected { .. } => EssayState::Reject,
            Lifecycle::Completed { .. } => EssayState::Complete,
        }
    }

    pub fn review_state(&self) -> ReviewState {
        match self {
            Lifecycle::Completed {
                review: Some(_), ..
            } => ReviewState::On,
            _ => ReviewState::Off,
        }
    }

    pub fn reject_detail(&self) -> Option<&str> {
        match self {
            Lifecycle::Rejected { detail } => Some(detail.as_str()),
            _ => None,
        }
    }

    pub fn teacher_file(&self) -> Option<&FileKey> {
        match self {
            Lifecycle::Proceeding { teacher_file } => teacher_file.as_ref(),
            Lifecycle::Completed { teacher_file, .. } => Some(teacher_file),
            _ => None,
        }
    }

    pub fn review(&self) -> Option<&Review> {
        match self {
            Lifecycle::Completed { review, .. } => review.as_ref(),
            _ => None,
        }
    }

    /// REQUEST -> PROCEED
    pub fn accept(&self) -> Result<Lifecycle, TransitionError> {
        match self {
            Lifecycle::Requested => Ok(Lifecycle::Proceeding { teacher_file: None }),
            other => Err(other.wrong_state("accept")),
        }
    }

    /// REQUEST -> REJECT
    pub fn reject(&self, detail: String) -> Result<Lifecycle, TransitionError> {
        match self {
            Lifecycle::Requested => Ok(Lifecycle::Rejected { detail }),
            other => Err(other.wrong_state("reject")),
        }
    }

    /// Attaches (or replaces) the teacher's annotated file while PROCEED.
    ///
    /// Returns the new lifecycle and the key of the file it replaced, if any.
    pub fn attach_teacher_file(
        &self,
        file: FileKey,
    ) -> Result<(Lifecycle, Option<FileKey>), TransitionError> {
        match self {
            Lifecycle::Proceeding { teacher_file } => Ok((
                Lifecycle::Proceeding {
                    teacher_file: Some(file),
                },
                teacher_file.clone(),
            )),
            other => Err(other.wrong_state("upload a teacher file to")),
        }
    }

    /// PROCEED -> COMPLETE, only once the teacher file exists.
    pub fn complete(&self) -> Result<Lifecycle, TransitionError> {
        match self {
            Lifecycle::Proceeding {
                teacher_file: Some(file),
            } => Ok(Lifecycle::Completed {
                teacher_file: file.clone(),
                review: None,
            }),
            Lifecycle::Proceeding { teacher_file: None } => {
                Err(TransitionError::MissingTeacherFile)
            }
            other => Err(other.wrong_state("complete")),
        }
    }

    /// Review OFF -> ON on a completed essay.
    pub fn review_with(&self, review: Review) -> Result<Lifecycle, TransitionError> {
        match self {
            Lifecycle::Completed {
                teacher_file,
                review: None,
            } => Ok(Lifecycle::Completed {
                teacher_file: teacher_file.clone(),
                review: Some(review),
            }),
            Lifecycle::Completed { review: Some(_), .. } => Err(TransitionError::AlreadyReviewed),
            other => Err(other.wrong_state("review")),
        }
    }

    fn wrong_state(&self, action: &'static str) -> TransitionError {
        TransitionError::WrongState {
            action,
            from: self.state(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_states() -> Vec<Lifecycle> {
        vec![
            Lifecycle::Requested,
            Lifecycle::Proceeding { teacher_file: None },
            Lifecycle::Proceeding {
                teacher_file: Some("t.pdf".into()),
            },
            Lifecycle::Rejected {
                detail: "일정상 첨삭이 불가능할 것 같습니다.".to_string(),
            },
            Lifecycle::Completed {
                teacher_file: "t.pdf".into(),
                review: None,
            },
        ]
    }

    #[test]
    fn accept_only_succeeds_from_request() {
        for lifecycle in all_states() {
            let result = lifecycle.accept();
            if lifecycle == Lifecycle::Requested {
                assert_eq!(result, Ok(Lifecycle::Proceeding { teacher_file: None }));
            } else {
                assert_eq!(
                    result,
                    Err(TransitionError::WrongState {
                        action: "accept",
                        from: lifecycle.state()
                    })
                );
            }
        }
    }

    #[test]
    fn reject_detail_is_present_exactly_in_reject_state() {
        let rejected = Lifecycle::Requested.reject("busy".to_string()).unwrap();
        assert_eq!(rejected.state(), EssayState::Reject);
        assert_eq!(rejected.reject_detail(), Some("busy"));

        for lifecycle in all_states() {
            assert_eq!(
                lifecycle.reject_detail().is_some(),
                lifecycle.state() == EssayState::Reject
            );
        }
    }

    #[test]
    fn reject_fails_outside_request() {
        let proceeding = Lifecycle::Proceeding { teacher_file: None };
        assert!(matches!(
            proceeding.reject("late".to_string()),
            Err(TransitionError::WrongState {
                from: EssayState::Proceed,
                ..
            })
        ));
    }

    #[test]
    fn complete_requires_proceed_with_teacher_file() {
        assert_eq!(
            Lifecycle::Proceeding { teacher_file: None }.complete(),
            Err(TransitionError::MissingTeacherFile)
        );

        let done = Lifecycle::Proceeding {
            teacher_file: Some("t.pdf".into()),
        }
        .complete()
        .unwrap();
        assert_eq!(done.state(), EssayState::Complete);
        assert_eq!(done.teacher_file(), Some(&FileKey::from("t.pdf")));
        assert_eq!(done.review_state(), ReviewState::Off);

        assert!(Lifecycle::Requested.complete().is_err());
        assert!(done.complete().is_err());
    }

    #[test]
    fn attaching_a_teacher_file_reports_the_replaced_one() {
        let (first, replaced) = Lifecycle::Proceeding { teacher_file: None }
            .attach_teacher_file("a.pdf".into())
            .unwrap();
        assert_eq!(replaced, None);

        let (second, replaced) = first.attach_teacher_file("b.pdf".into()).unwrap();
        assert_eq!(replaced, Some(FileKey::from("a.pdf")));
        assert_eq!(second.teacher_file(), Some(&FileKey::from("b.pdf")));

        assert!(Lifecycle::Requested
            .attach_teacher_file("c.pdf".into())
            .is_err());
    }

    #[test]
    fn teacher_file_only_exists_in_proceed_or_complete() {
        for lifecycle in all_states() {
            if lifecycle.teacher_file().is_some() {
                assert!(matches!(
                    lifecycle.state(),
                    EssayState::Proceed | EssayState::Complete
                ));
            }
        }
    }

    #[test]
    fn review_is_accepted_once_on_complete() {
        let done = Lifecycle::Completed {
            teacher_file: "t.pdf".into(),
            review: None,
        };
        let review = Review {
            score: 5,
            detail: "감사합니다".to_string(),
        };
        let reviewed = done.review_with(review.clone()).unwrap();
        assert_eq!(reviewed.review_state(), ReviewState::On);
        assert_eq!(reviewed.review(), Some(&review));
        assert_eq!(
            reviewed.review_with(review.clone()),
            Err(TransitionError::AlreadyReviewed)
        );
        assert!(Lifecycle::Requested.review_with(review).is_err());
    }
}
