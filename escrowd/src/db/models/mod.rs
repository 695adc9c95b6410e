pub mod escrow;
pub mod users;
