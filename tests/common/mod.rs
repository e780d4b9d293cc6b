use std::io::Write;
use tempfile::NamedTempFile;

/// Two exams: #1 open with a 500.00 fee, #2 closed.
pub fn seed_exams() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "id, name, exam_date, location, fees, is_registration_open").unwrap();
    writeln!(file, "1, Entrance Exam, 2026-06-01T09:00:00Z, Block A, 500.00, true").unwrap();
    writeln!(file, "2, Scholarship Test, 2026-07-15T10:00:00Z, Block B, 250.50, false").unwrap();
    file
}

/// Students 10 through 14.
pub fn seed_students() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "id, full_name, email, is_staff").unwrap();
    for id in 10..=14 {
        writeln!(file, "{id}, Student {id}, student{id}@example.com, false").unwrap();
    }
    file
}

pub fn actions_file(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "action, student, exam, document, reason").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file
}
