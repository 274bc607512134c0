pub mod codes;
pub mod drafts;
pub mod flows;
pub mod phone;
pub mod render;
pub mod replay;
pub mod text;
pub mod tokens;
pub mod validate;

pub use drafts::{BursaryDraft, CommitRequest, IssueDraft, RegistrationDraft};
pub use flows::{FlowId, REGISTRY};
pub use phone::{mask_phone, normalize_phone};
pub use render::{Reply, ReplyKind};
pub use replay::{evaluate, locate, needs_caller, trail, EngineContext, Outcome, Position};
pub use text::{text, Text};
pub use tokens::{parse, TokenSequence};
