// SQL schema files, applied in order. Every statement is idempotent.

pub const INITIAL_SCHEMA: &str = include_str!("../../migrations/001_initial_schema.sql");
pub const JOURNALS_SCHEMA: &str = include_str!("../../migrations/002_journals.sql");
pub const USERS_EMAIL_NOT_UNIQUE: &str =
    include_str!("../../migrations/003_users_email_not_unique.sql");

pub const MIGRATIONS: &[(&str, &str)] = &[
    ("001_initial_schema", INITIAL_SCHEMA),
    ("002_journals", JOURNALS_SCHEMA),
    ("003_users_email_not_unique", USERS_EMAIL_NOT_UNIQUE),
];
