//! Host migration for co-op farm saves.
//!
//! A save folder holds the main save document and a companion `SaveGameInfo`
//! document. The pipeline is parse → list players → migrate host → update
//! companion → serialize → nil-field repair; [`core_api::Session`] runs it
//! end to end and the modules below expose each step on its own.

pub mod companion;
pub mod core_api;
pub mod document;
pub mod layout;
pub mod markup;
pub mod migration;
pub mod players;
pub mod repair;
