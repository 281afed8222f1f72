pub mod core;
pub mod lexile;
pub mod norms;
pub mod records;
pub mod scores;
pub mod settings;
