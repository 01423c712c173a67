pub mod config;
pub mod doctor;
pub mod install;
pub mod run;
