pub mod mock_api_server;

pub use mock_api_server::{MockApi, RefreshMode};
