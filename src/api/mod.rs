// Thin namespace wrapper for API-layer components
pub mod handlers {
    pub use crate::handlers::*;
}

pub mod community_handler {
    pub use crate::community_handler::*;
}

pub mod routes {
    pub use crate::routes::*;
}
