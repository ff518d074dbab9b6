pub mod resolver;
pub mod set;

pub use resolver::{resolve_wallets, HttpWalletSource, WalletSource};
pub use set::{canonical, WalletSet};
