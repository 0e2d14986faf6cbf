pub mod search;
pub mod vocab;
