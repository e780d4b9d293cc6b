use crate::domain::registration::Registration;
use crate::error::Result;
use std::io::Write;

/// Writes final registration state as CSV, one row per (student, exam).
pub struct RegistrationWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> RegistrationWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_registrations(&mut self, mut registrations: Vec<Registration>) -> Result<()> {
        registrations.sort_by_key(|r| (r.student, r.exam));

        self.writer.write_record([
            "student",
            "exam",
            "status",
            "payment_status",
            "registration_number",
        ])?;
        for registration in registrations {
            self.writer.write_record([
                registration.student.to_string(),
                registration.exam.to_string(),
                registration.status.to_string(),
                registration.payment_status.to_string(),
                registration.registration_number.unwrap_or_default(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_rows_sorted_by_student_then_exam() {
        let mut a = Registration::new(1, 11, 1, "a.pdf", Utc::now());
        let b = Registration::new(2, 10, 2, "b.pdf", Utc::now());
        let c = Registration::new(3, 10, 1, "c.pdf", Utc::now());
        a.registration_number = Some("REG-2026-AB12".to_string());

        let mut out = Vec::new();
        RegistrationWriter::new(&mut out)
            .write_registrations(vec![a, b, c])
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "student,exam,status,payment_status,registration_number"
        );
        assert_eq!(lines[1], "10,1,Pending,Pending,");
        assert_eq!(lines[2], "10,2,Pending,Pending,");
        assert_eq!(lines[3], "11,1,Pending,Pending,REG-2026-AB12");
    }
}
