pub mod config;
pub mod error;
pub mod exif;
pub mod file_ops;
pub mod layout;
pub mod naming;
pub mod walk;

#[cfg(test)]
mod test_utils;
