pub mod coordinator;
pub mod policy;
pub mod reaper;
pub mod validation;
