mod key;
mod layer;
mod port;
mod set;

pub use key::{ConfigKey, KeyError};
pub use layer::{ConfigLayer, ValueError};
pub use port::{BrokerPort, PortError};
pub use set::ConfigurationSet;
