use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{EssayId, FileKey, Lifecycle, Review, TransitionError, User};

/// Lifecycle state as exposed to clients and used to filter listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EssayState {
    Request,
    Proceed,
    Reject,
    Complete,
}

impl EssayState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EssayState::Request => "REQUEST",
            EssayState::Proceed => "PROCEED",
            EssayState::Reject => "REJECT",
            EssayState::Complete => "COMPLETE",
        }
    }
}

impl fmt::Display for EssayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EssayState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REQUEST" => Ok(EssayState::Request),
            "PROCEED" => Ok(EssayState::Proceed),
            "REJECT" => Ok(EssayState::Reject),
            "COMPLETE" => Ok(EssayState::Complete),
            other => Err(format!("unknown essay state {other:?}")),
        }
    }
}

/// Whether the student has reviewed the correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewState {
    On,
    Off,
}

/// Everything needed to insert a fresh essay. Repositories assign the id.
#[derive(Debug, Clone)]
pub struct NewEssay {
    pub student: User,
    pub teacher: User,
    pub univ: String,
    pub exam_year: String,
    pub e_type: String,
    pub inquiry: String,
    pub student_file: FileKey,
}

/// An essay correction request with its current lifecycle.
///
/// The lifecycle is private: it only changes through the transition methods,
/// which delegate to [`Lifecycle`]. `version` is the optimistic concurrency
/// token the repository compares on update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Essay {
    pub id: EssayId,
    pub student: User,
    pub teacher: User,
    pub univ: String,
    pub exam_year: String,
    pub e_type: String,
    pub inquiry: String,
    pub student_file: FileKey,
    lifecycle: Lifecycle,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Essay {
    /// Rebuilds an essay from stored parts.
    pub fn restore(
        id: EssayId,
        draft: NewEssay,
        lifecycle: Lifecycle,
        version: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            student: draft.student,
            teacher: draft.teacher,
            univ: draft.univ,
            exam_year: draft.exam_year,
            e_type: draft.e_type,
            inquiry: draft.inquiry,
            student_file: draft.student_file,
            lifecycle,
            version,
            created_at,
            updated_at,
        }
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn state(&self) -> EssayState {
        self.lifecycle.state()
    }

    pub fn review_state(&self) -> ReviewState {
        self.lifecycle.review_state()
    }

    pub fn reject_detail(&self) -> Option<&str> {
        self.lifecycle.reject_detail()
    }

    pub fn teacher_file(&self) -> Option<&FileKey> {
        self.lifecycle.teacher_file()
    }

    pub fn review(&self) -> Option<&Review> {
        self.lifecycle.review()
    }

    pub fn is_participant(&self, user: &User) -> bool {
        self.student.id == user.id || self.teacher.id == user.id
    }

    pub fn accept(&mut self) -> Result<(), TransitionError> {
        self.lifecycle = self.lifecycle.accept()?;
        Ok(())
    }

    pub fn reject(&mut self, detail: String) -> Result<(), TransitionError> {
        self.lifecycle = self.lifecycle.reject(detail)?;
        Ok(())
    }

    /// Returns the key of the teacher file this one replaced.
    pub fn attach_teacher_file(
        &mut self,
        file: FileKey,
    ) -> Result<Option<FileKey>, TransitionError> {
        let (next, replaced) = self.lifecycle.attach_teacher_file(file)?;
        self.lifecycle = next;
        Ok(replaced)
    }

    pub fn complete(&mut self) -> Result<(), TransitionError> {
        self.lifecycle = self.lifecycle.complete()?;
        Ok(())
    }

    pub fn add_review(&mut self, review: Review) -> Result<(), TransitionError> {
        self.lifecycle = self.lifecycle.review_with(review)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn essay_state_parses_its_own_text() {
        for state in [
            EssayState::Request,
            EssayState::Proceed,
            EssayState::Reject,
            EssayState::Complete,
        ] {
            assert_eq!(state.as_str().parse::<EssayState>(), Ok(state));
        }
        assert!("DONE".parse::<EssayState>().is_err());
    }

    #[test]
    fn failed_transition_leaves_essay_untouched() {
        let teacher = fixtures::teacher1(1);
        let student = fixtures::student1(2);
        let mut essay = fixtures::essay1(1, &student, &teacher, Lifecycle::Requested);
        let before = essay.clone();

        assert!(essay.complete().is_err());
        assert_eq!(essay, before);
    }

    #[test]
    fn participants_are_the_student_and_the_teacher() {
        let teacher = fixtures::teacher1(1);
        let student = fixtures::student1(2);
        let other = fixtures::teacher2(3);
        let essay = fixtures::essay1(1, &student, &teacher, Lifecycle::Requested);

        assert!(essay.is_participant(&teacher));
        assert!(essay.is_participant(&student));
        assert!(!essay.is_participant(&other));
    }

    #[test]
    fn state_serializes_as_upper_case() {
        assert_eq!(
            serde_json::to_string(&EssayState::Proceed).unwrap(),
            "\"PROCEED\""
        );
        assert_eq!(serde_json::to_string(&ReviewState::Off).unwrap(), "\"OFF\"");
    }
}
