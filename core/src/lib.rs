pub mod config;
pub mod db;
pub mod ids;
pub mod invitation;
pub mod project;
pub mod task;
pub mod user;
pub mod workspace;

#[cfg(test)]
pub mod test_support;
