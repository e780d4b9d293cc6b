use crate::domain::exam::Exam;
use crate::domain::student::Student;
use crate::error::{RegistrationError, Result};
use std::io::Read;

/// Reads the exam catalog from CSV
/// (`id, name, exam_date, location, fees, is_registration_open`).
pub struct ExamReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> ExamReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source);
        Self { reader }
    }

    pub fn exams(self) -> impl Iterator<Item = Result<Exam>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(RegistrationError::from))
    }
}

/// Reads the student directory from CSV
/// (`id, full_name, email, is_staff`).
pub struct StudentReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> StudentReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source);
        Self { reader }
    }

    pub fn students(self) -> impl Iterator<Item = Result<Student>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(RegistrationError::from))
    }
}
