//! Static section code table.
//!
//! The table is the single source of truth for routing: every admission number
//! carries one of these codes at a fixed offset, and the code names the
//! partition that owns the record. It is immutable at runtime.

use serde::Serialize;

/// One row of the section table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionEntry {
    /// Section code as embedded in admission numbers (1 to 3 digits).
    pub code: &'static str,
    /// Backing collection holding this section's records.
    pub partition: &'static str,
    /// Human readable department name.
    pub department: &'static str,
    /// Short department code.
    pub department_code: &'static str,
    /// Section number within the department (1-based).
    pub section_index: u8,
}

const fn entry(
    code: &'static str,
    partition: &'static str,
    department: &'static str,
    department_code: &'static str,
    section_index: u8,
) -> SectionEntry {
    SectionEntry {
        code,
        partition,
        department,
        department_code,
        section_index,
    }
}

/// Standard section table, in registry order.
pub static SECTION_TABLE: &[SectionEntry] = &[
    // Computer Science and Engineering
    entry("51", "students_cse_1", "Computer Science and Engineering", "CSE", 1),
    entry("52", "students_cse_2", "Computer Science and Engineering", "CSE", 2),
    entry("53", "students_cse_3", "Computer Science and Engineering", "CSE", 3),
    entry("54", "students_cse_4", "Computer Science and Engineering", "CSE", 4),
    // Information Technology
    entry("61", "students_it_1", "Information Technology", "IT", 1),
    entry("62", "students_it_2", "Information Technology", "IT", 2),
    // Artificial Intelligence and Data Science
    entry("71", "students_aids_1", "Artificial Intelligence and Data Science", "AIDS", 1),
    entry("72", "students_aids_2", "Artificial Intelligence and Data Science", "AIDS", 2),
    // Electronics and Communication Engineering
    entry("41", "students_ece_1", "Electronics and Communication Engineering", "ECE", 1),
    entry("42", "students_ece_2", "Electronics and Communication Engineering", "ECE", 2),
    // Electrical and Electronics Engineering
    entry("31", "students_eee_1", "Electrical and Electronics Engineering", "EEE", 1),
    // Mechanical Engineering
    entry("21", "students_mech_1", "Mechanical Engineering", "MECH", 1),
    entry("22", "students_mech_2", "Mechanical Engineering", "MECH", 2),
    // Civil Engineering
    entry("11", "students_civil_1", "Civil Engineering", "CIVIL", 1),
    // Postgraduate programmes use three digit codes
    entry("105", "students_mba_1", "Master of Business Administration", "MBA", 1),
    entry("106", "students_mca_1", "Master of Computer Applications", "MCA", 1),
    entry("107", "students_mtech_1", "Master of Technology", "MTECH", 1),
    // Research scholars
    entry("9", "students_phd_1", "Doctoral Research", "PHD", 1),
];
