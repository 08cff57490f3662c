//! Terminal UI utilities

mod spinner;

pub use spinner::{create_spinner, finish_spinner};
