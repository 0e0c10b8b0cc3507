//! External service integrations.

pub mod market_price {
    pub use crate::market_price::*;
}

pub mod soil_client {
    pub use crate::soil_client::*;
}

pub mod weather_client {
    pub use crate::weather_client::*;
}

pub mod translation {
    pub use crate::translation::*;
}
