//! Builders for fully specified test values. Every call returns a fresh value.

use chrono::{TimeZone, Utc};

use crate::models::{
    Comment, CommentId, Essay, EssayId, FileKey, Lifecycle, NewEssay, Role, User, UserId,
};

pub const STUDENT_FILE: &str = "20240301_314a32f7.pdf";
pub const TEACHER_FILE: &str = "20240305_751b44f7.pdf";

pub fn teacher1(id: i64) -> User {
    User {
        id: UserId(id),
        role: Role::Teacher,
        name: "임탁균".to_string(),
        email: "sulsul@naver.com".to_string(),
        catch_phrase: Some("항상 최선을 다하겠습니다. 화이링".to_string()),
    }
}

pub fn teacher2(id: i64) -> User {
    User {
        id: UserId(id),
        role: Role::Teacher,
        name: "전용수".to_string(),
        email: "smc@gmail.com".to_string(),
        catch_phrase: Some("항상 최선을 다하겠습니다.".to_string()),
    }
}

pub fn student1(id: i64) -> User {
    User {
        id: UserId(id),
        role: Role::Student,
        name: "김경근".to_string(),
        email: "sulsul@gmail.com".to_string(),
        catch_phrase: None,
    }
}

pub fn new_essay1(student: &User, teacher: &User) -> NewEssay {
    NewEssay {
        student: student.clone(),
        teacher: teacher.clone(),
        univ: "홍익대".to_string(),
        exam_year: "2022".to_string(),
        e_type: "수리".to_string(),
        inquiry: "2022년 수리논술 3번 문제까지 첨삭 부탁드립니다.".to_string(),
        student_file: FileKey::from(STUDENT_FILE),
    }
}

pub fn new_essay2(student: &User, teacher: &User) -> NewEssay {
    NewEssay {
        student: student.clone(),
        teacher: teacher.clone(),
        univ: "홍익대".to_string(),
        exam_year: "2023".to_string(),
        e_type: "인문".to_string(),
        inquiry: "2023년 인문논술 1번 문제 첨삭 부탁드립니다.".to_string(),
        student_file: FileKey::from(STUDENT_FILE),
    }
}

pub fn essay1(id: i64, student: &User, teacher: &User, lifecycle: Lifecycle) -> Essay {
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    Essay::restore(
        EssayId(id),
        new_essay1(student, teacher),
        lifecycle,
        0,
        at,
        at,
    )
}

pub fn essay2(id: i64, student: &User, teacher: &User, lifecycle: Lifecycle) -> Essay {
    let at = Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap();
    Essay::restore(
        EssayId(id),
        new_essay2(student, teacher),
        lifecycle,
        0,
        at,
        at,
    )
}

pub fn proceeding_with_file() -> Lifecycle {
    Lifecycle::Proceeding {
        teacher_file: Some(FileKey::from(TEACHER_FILE)),
    }
}

pub fn comment1(id: i64, author: &User, essay: &Essay) -> Comment {
    Comment {
        id: CommentId(id),
        essay_id: essay.id,
        author: author.clone(),
        detail: "3번 문제 풀이도 확인 부탁드립니다.".to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 3, 3, 10, 0, 0).unwrap(),
    }
}

pub fn comment2(id: i64, author: &User, essay: &Essay) -> Comment {
    Comment {
        id: CommentId(id),
        essay_id: essay.id,
        author: author.clone(),
        detail: "네, 함께 확인해 두겠습니다.".to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 3, 3, 11, 0, 0).unwrap(),
    }
}
