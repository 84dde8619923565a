//! End-to-end tests through the `fieldex` facade.

mod common;

mod handlers;
mod persistence;
mod search;
