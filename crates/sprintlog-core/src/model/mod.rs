pub mod issue;
pub mod item_key;
pub mod sprint;
