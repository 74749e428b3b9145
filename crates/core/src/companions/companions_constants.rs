/// Subjects a companion can teach. Stored lowercase.
pub const SUBJECTS: [&str; 6] = [
    "maths",
    "language",
    "science",
    "history",
    "coding",
    "economics",
];

/// Page size used when a listing does not ask for one.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Pre-filled session length on a fresh form, in minutes.
pub const DEFAULT_DURATION_MINUTES: i64 = 15;

/// Path prefix of the companion detail view.
pub const COMPANION_DETAIL_PATH: &str = "/companions";

/// Returns the canonical subject for user input, if it is a known subject.
pub fn canonical_subject(input: &str) -> Option<&'static str> {
    let needle = input.trim();
    SUBJECTS
        .iter()
        .copied()
        .find(|subject| subject.eq_ignore_ascii_case(needle))
}

/// Navigation target for a companion's detail view.
pub fn companion_detail_path(companion_id: &str) -> String {
    format!("{}/{}", COMPANION_DETAIL_PATH, companion_id)
}
