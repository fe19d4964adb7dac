pub mod contract;
pub mod reader;
pub mod rpc;
pub mod safety_pool;

pub use reader::VaultsClient;
pub use rpc::RpcPool;
pub use safety_pool::SafetyPoolClient;
