pub mod accounts;
pub mod bindings;
pub mod servers;
pub mod transaction_snapshots;
pub mod transactions;

pub mod prelude {
    pub use super::accounts::Entity as Accounts;
    pub use super::bindings::Entity as Bindings;
    pub use super::servers::Entity as Servers;
    pub use super::transaction_snapshots::Entity as TransactionSnapshots;
    pub use super::transactions::Entity as Transactions;
}
