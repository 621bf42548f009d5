pub mod email;
pub mod health_service;
pub mod jwt_session;
pub mod transfer_gateway;

pub use email::*;
pub use health_service::*;
pub use jwt_session::*;
pub use transfer_gateway::*;
