pub mod abi;
pub mod traits;

// Chain client implementations
pub mod json_rpc;
