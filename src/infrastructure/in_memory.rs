use crate::domain::exam::Exam;
use crate::domain::ports::{ExamStore, RegistrationStore, StudentStore};
use crate::domain::registration::Registration;
use crate::domain::student::Student;
use crate::error::{RegistrationError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct RegistrationTable {
    rows: HashMap<u64, Registration>,
    next_id: u64,
}

/// A thread-safe in-memory registration store.
///
/// The whole upsert runs under one write lock, which is what serializes
/// concurrent submits for the same (student, exam) pair instead of a
/// database row lock.
#[derive(Default, Clone)]
pub struct InMemoryRegistrationStore {
    inner: Arc<RwLock<RegistrationTable>>,
}

impl InMemoryRegistrationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RegistrationStore for InMemoryRegistrationStore {
    async fn get(&self, id: u64) -> Result<Option<Registration>> {
        let table = self.inner.read().await;
        Ok(table.rows.get(&id).cloned())
    }

    async fn find_by_pair(&self, student: u64, exam: u64) -> Result<Option<Registration>> {
        let table = self.inner.read().await;
        Ok(table
            .rows
            .values()
            .find(|r| r.student == student && r.exam == exam)
            .cloned())
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Registration>> {
        let table = self.inner.read().await;
        Ok(table
            .rows
            .values()
            .find(|r| r.payment_order_id.as_deref() == Some(order_id))
            .cloned())
    }

    async fn upsert_document(
        &self,
        student: u64,
        exam: u64,
        document: &str,
    ) -> Result<Registration> {
        let mut table = self.inner.write().await;

        let existing = table
            .rows
            .values()
            .find(|r| r.student == student && r.exam == exam)
            .map(|r| r.id);
        if let Some(id) = existing {
            let row = table
                .rows
                .get_mut(&id)
                .ok_or(RegistrationError::NotFound("registration"))?;
            if row.is_paid() {
                return Err(RegistrationError::AlreadyPaid);
            }
            row.document = document.to_string();
            return Ok(row.clone());
        }

        table.next_id += 1;
        let id = table.next_id;
        let registration = Registration::new(id, student, exam, document, Utc::now());
        table.rows.insert(id, registration.clone());
        Ok(registration)
    }

    async fn update(&self, registration: Registration) -> Result<()> {
        let mut table = self.inner.write().await;
        if !table.rows.contains_key(&registration.id) {
            return Err(RegistrationError::NotFound("registration"));
        }
        // registration_number carries a global unique constraint
        if let Some(number) = &registration.registration_number
            && table
                .rows
                .values()
                .any(|r| r.id != registration.id && r.registration_number.as_ref() == Some(number))
        {
            return Err(RegistrationError::Validation(format!(
                "registration number {number} is already assigned"
            )));
        }
        table.rows.insert(registration.id, registration);
        Ok(())
    }

    async fn delete(&self, id: u64) -> Result<()> {
        let mut table = self.inner.write().await;
        table.rows.remove(&id);
        Ok(())
    }

    async fn list_by_exam(&self, exam: u64) -> Result<Vec<Registration>> {
        let table = self.inner.read().await;
        let mut rows: Vec<Registration> =
            table.rows.values().filter(|r| r.exam == exam).cloned().collect();
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }

    async fn all(&self) -> Result<Vec<Registration>> {
        let table = self.inner.read().await;
        let mut rows: Vec<Registration> = table.rows.values().cloned().collect();
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }

    async fn number_exists(&self, number: &str) -> Result<bool> {
        let table = self.inner.read().await;
        Ok(table
            .rows
            .values()
            .any(|r| r.registration_number.as_deref() == Some(number)))
    }
}

/// In-memory exam catalog.
#[derive(Default, Clone)]
pub struct InMemoryExamStore {
    exams: Arc<RwLock<HashMap<u64, Exam>>>,
}

impl InMemoryExamStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExamStore for InMemoryExamStore {
    async fn store(&self, exam: Exam) -> Result<()> {
        let mut exams = self.exams.write().await;
        exams.insert(exam.id, exam);
        Ok(())
    }

    async fn get(&self, id: u64) -> Result<Option<Exam>> {
        let exams = self.exams.read().await;
        Ok(exams.get(&id).cloned())
    }
}

/// In-memory student directory.
#[derive(Default, Clone)]
pub struct InMemoryStudentStore {
    students: Arc<RwLock<HashMap<u64, Student>>>,
}

impl InMemoryStudentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StudentStore for InMemoryStudentStore {
    async fn store(&self, student: Student) -> Result<()> {
        let mut students = self.students.write().await;
        students.insert(student.id, student);
        Ok(())
    }

    async fn get(&self, id: u64) -> Result<Option<Student>> {
        let students = self.students.read().await;
        Ok(students.get(&id).cloned())
    }
}
