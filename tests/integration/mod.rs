//! Integration tests driving the fw-release binary

mod helpers;
mod test_commands;
mod test_release;
