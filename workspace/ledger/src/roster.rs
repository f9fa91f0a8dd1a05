//! Read-only access to the student roster.

use model::entities::{school_class, section, student};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    sea_query::{Expr, Func, SimpleExpr},
};
use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::error::{LedgerError, Result};

/// Narrows the roster. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RosterFilter {
    pub class_id: Option<i32>,
    pub section_id: Option<i32>,
    /// Case-insensitive match on name or student code
    pub search: Option<String>,
}

impl RosterFilter {
    fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}

/// A student with class and section names resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentRecord {
    pub student: student::Model,
    pub class_name: String,
    pub section_name: String,
}

impl StudentRecord {
    pub fn effective_fee(&self, default_fee: Decimal) -> Decimal {
        self.student.effective_fee(default_fee)
    }
}

pub async fn get_student<C: ConnectionTrait>(conn: &C, student_id: i32) -> Result<student::Model> {
    student::Entity::find_by_id(student_id)
        .one(conn)
        .await?
        .ok_or_else(|| LedgerError::not_found("student", student_id))
}

/// `LOWER(column) LIKE '%term%'`, so the match ignores case on every backend.
fn contains_ignore_case(column: student::Column, term: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(format!("%{}%", term.to_lowercase()))
}

/// Same as [`get_student`] with class and section names attached.
pub async fn get_student_record<C: ConnectionTrait>(
    conn: &C,
    student_id: i32,
) -> Result<StudentRecord> {
    let student = get_student(conn, student_id).await?;
    let class_name = school_class::Entity::find_by_id(student.class_id)
        .one(conn)
        .await?
        .map(|c| c.name)
        .unwrap_or_default();
    let section_name = section::Entity::find_by_id(student.section_id)
        .one(conn)
        .await?
        .map(|s| s.name)
        .unwrap_or_default();

    Ok(StudentRecord {
        student,
        class_name,
        section_name,
    })
}

/// Lists students matching `filter`, ordered by name.
#[instrument(skip(conn))]
pub async fn list_students<C: ConnectionTrait>(
    conn: &C,
    filter: &RosterFilter,
) -> Result<Vec<StudentRecord>> {
    let mut query = student::Entity::find();
    if let Some(class_id) = filter.class_id {
        query = query.filter(student::Column::ClassId.eq(class_id));
    }
    if let Some(section_id) = filter.section_id {
        query = query.filter(student::Column::SectionId.eq(section_id));
    }
    if let Some(term) = filter.search_term() {
        query = query.filter(
            Condition::any()
                .add(contains_ignore_case(student::Column::Name, term))
                .add(contains_ignore_case(student::Column::StudentCode, term)),
        );
    }

    let students = query
        .order_by_asc(student::Column::Name)
        .order_by_asc(student::Column::Id)
        .all(conn)
        .await?;

    let class_names: HashMap<i32, String> = school_class::Entity::find()
        .all(conn)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let section_names: HashMap<i32, String> = section::Entity::find()
        .all(conn)
        .await?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();

    debug!("Roster filter matched {} students", students.len());

    Ok(students
        .into_iter()
        .map(|student| StudentRecord {
            class_name: class_names.get(&student.class_id).cloned().unwrap_or_default(),
            section_name: section_names
                .get(&student.section_id)
                .cloned()
                .unwrap_or_default(),
            student,
        })
        .collect())
}
