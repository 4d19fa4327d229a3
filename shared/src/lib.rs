//! Shared types for the print agent
//!
//! Order, printer and job payload models exchanged with the job source.

pub mod models;
