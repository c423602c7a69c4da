//! Integration test suite

mod helpers;
mod test_next_version;
mod test_release;
mod test_tag;
