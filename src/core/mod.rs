// Recommendation pipeline and shared errors/models
pub mod scoring {
    pub use crate::scoring::*;
}

pub mod ranking {
    pub use crate::ranking::*;
}

pub mod recommendation {
    pub use crate::recommendation::*;
}

pub mod soil {
    pub use crate::soil::*;
}

pub mod services {
    pub use crate::services::*;
}

pub mod errors {
    pub use crate::errors::*;
}
