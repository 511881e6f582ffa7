//! Common test utilities and fixtures
#![allow(dead_code)]

use opsdesk_core::{Session, Store};
use std::fs;
use std::path::{Path, PathBuf};

/// Session over an in-memory store with the operational tables seeded with a
/// small but realistic data set.
pub fn seeded_session() -> Session {
    let store = Store::open_in_memory().expect("Failed to open in-memory store");
    let session = Session::new(store).expect("Failed to create session");

    session
        .store()
        .execute_batch(
            "INSERT INTO public.creator_registry \
             (id, agency_id, tiktok_id, full_name, domicile, binding_status, phone_number) VALUES \
             (1, 1, 'alpha.creator', 'Alpha Creator', 'Jakarta', 'Bound', '+6281111111111'), \
             (2, 2, 'zee.travels', 'Zee Travels', 'Bandung', 'Unbound', '+6282222222222');

             INSERT INTO public.content_submissions \
             (id, creator_id, management_id, category_id, status_id, posting_date, \
              submission_date, post_type, link_post) VALUES \
             (10, 1, 1, 1, 2, CAST('2026-01-15' AS DATE), CAST('2026-01-16 09:30:00' AS TIMESTAMP), \
              'Video', 'https://www.tiktok.com/@alpha.creator/video/1'), \
             (11, 2, 2, 2, 2, CAST('2026-02-03' AS DATE), CAST('2026-02-03 14:00:00' AS TIMESTAMP), \
              'Video', 'https://www.tiktok.com/@zee.travels/video/2'), \
             (12, 1, 1, 3, 3, CAST('2026-01-20' AS DATE), CAST('2026-01-21 08:00:00' AS TIMESTAMP), \
              'Photo', 'https://www.tiktok.com/@alpha.creator/photo/3');",
        )
        .expect("Failed to seed test data");

    session
}

/// Write a CSV upload into `dir` and return its path
pub fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("Failed to write test CSV");
    path
}
