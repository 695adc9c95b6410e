pub mod escrow;
pub mod users;

pub use escrow::Escrow;
pub use users::Users;
