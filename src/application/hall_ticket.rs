use crate::domain::exam::Exam;
use crate::domain::ports::{
    ExamStore, ExamStoreRef, QrRendererRef, RegistrationStore, RegistrationStoreRef, StudentStore,
    StudentStoreRef,
};
use crate::domain::registration::{Registration, Status};
use crate::domain::student::Student;
use crate::error::{RegistrationError, Result};
use chrono::{DateTime, Utc};

/// Printable admission document for an approved registration.
#[derive(Debug, Clone)]
pub struct HallTicket {
    pub registration_number: String,
    pub student_name: String,
    pub exam_name: String,
    pub exam_date: DateTime<Utc>,
    pub location: String,
    pub qr_payload: String,
    pub qr_image: Vec<u8>,
}

/// The QR payload embedded in hall tickets and approval emails.
pub fn qr_payload(registration: &Registration, student: &Student, exam: &Exam) -> String {
    format!(
        "Reg No: {}\nStudent: {}\nExam: {}\nDate: {}\nLocation: {}",
        registration.registration_number.as_deref().unwrap_or(""),
        student.full_name,
        exam.name,
        exam.exam_date,
        exam.location,
    )
}

/// Serves hall tickets to their owning student or to staff.
pub struct HallTicketService {
    registrations: RegistrationStoreRef,
    exams: ExamStoreRef,
    students: StudentStoreRef,
    qr: QrRendererRef,
}

impl HallTicketService {
    pub fn new(
        registrations: RegistrationStoreRef,
        exams: ExamStoreRef,
        students: StudentStoreRef,
        qr: QrRendererRef,
    ) -> Self {
        Self {
            registrations,
            exams,
            students,
            qr,
        }
    }

    pub async fn fetch(&self, requester: &Student, registration_id: u64) -> Result<HallTicket> {
        let registration = self
            .registrations
            .get(registration_id)
            .await?
            .ok_or(RegistrationError::NotFound("registration"))?;

        if !requester.is_staff && registration.student != requester.id {
            return Err(RegistrationError::AccessDenied);
        }
        if registration.status != Status::Approved {
            return Err(RegistrationError::NotApproved);
        }

        let exam = self
            .exams
            .get(registration.exam)
            .await?
            .ok_or(RegistrationError::NotFound("exam"))?;
        let student = self
            .students
            .get(registration.student)
            .await?
            .ok_or(RegistrationError::NotFound("student"))?;

        let payload = qr_payload(&registration, &student, &exam);
        let qr_image = self.qr.render(&payload)?;
        Ok(HallTicket {
            registration_number: registration.registration_number.unwrap_or_default(),
            student_name: student.full_name,
            exam_name: exam.name,
            exam_date: exam.exam_date,
            location: exam.location,
            qr_payload: payload,
            qr_image,
        })
    }
}
