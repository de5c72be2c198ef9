pub mod analyses;
pub mod health;
