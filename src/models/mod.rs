pub mod _entities;
pub mod enums;

pub mod account;
pub mod binding;
pub mod server;
pub mod transaction;
pub mod transaction_snapshot;

pub use account::Account;
pub use binding::Binding;
pub use server::Server;
pub use transaction::Transaction;
pub use transaction_snapshot::TransactionSnapshot;
