pub mod catalog;
pub mod conversation;
pub mod decision;
pub mod load;
