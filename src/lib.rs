//! A small polling site: published questions, a voting form, tallies and a
//! JSON export of who voted for what.
//!
//! Questions go live at their `publish_date`; until then every view treats
//! them as missing. Vote counters are only ever bumped inside SQL
//! (`votes = votes + 1`) so concurrent submissions cannot lose a vote.
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod poll;
pub mod routes;
pub mod templates;

pub use config::Config;
pub use error::AppError;
pub use routes::create_routes;
