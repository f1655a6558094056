mod walk;

pub use walk::{basename, TreeScanner};
