use uuid::Uuid;

// Type aliases for IDs
pub type UserId = Uuid;
pub type TransactionId = Uuid;
