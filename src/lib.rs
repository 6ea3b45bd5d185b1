#[macro_use]
extern crate log;
extern crate pam_client2 as pam_client;

pub mod accounting;
pub mod app;
pub mod authentication;
pub mod common;
pub mod desktop;
pub mod fs;
pub mod sesman;
