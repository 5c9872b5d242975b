pub mod directory;
pub mod images;
pub mod ledger;

pub use directory::{HttpDirectory, VoterDirectory};
pub use images::{HttpImageStore, ImageStore};
pub use ledger::{JsonRpcLedger, Ledger, NewCandidate};
