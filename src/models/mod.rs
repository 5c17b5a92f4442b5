pub mod fields;
pub mod requests;
pub mod responses;
pub mod state;
