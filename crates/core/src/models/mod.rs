pub mod market;
pub mod note;
pub mod settings;
pub mod tier;
pub mod weights;
pub mod working_set;
