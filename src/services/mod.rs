pub mod account;
pub mod catalog;
pub mod feed;
pub mod import;
pub mod library;
pub mod profile;
pub mod providers;
pub mod recommendations;
pub mod social;
