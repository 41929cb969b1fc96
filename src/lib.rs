pub mod api;
pub mod archive;
pub mod config;
pub mod db;
pub mod error;
pub mod gate;
pub mod jobs;
pub mod links;
pub mod mailer;
pub mod model;
pub mod music;
pub mod playlist;
pub mod schedule;
pub mod text;

pub use error::{Error, Result};
