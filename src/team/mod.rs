//! 法律智能体团队 - 单个智能体、复合团队与默认阵容

pub mod agent;
pub mod response;
pub mod roster;
#[allow(clippy::module_inception)]
pub mod team;

pub use agent::{Agent, AgentId, AgentSpec, Capability, Grounding, Responder};
pub use response::{Message, Response, Role, extract_text};
pub use team::Team;
