//! Shared test fixtures live in `tests/common`; this crate has no library
//! code of its own.
