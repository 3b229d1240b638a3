pub mod collection;
pub mod monthly;
pub mod record;
