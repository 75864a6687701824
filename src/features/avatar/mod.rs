pub mod backend;
pub mod handler;
pub mod initials;
pub mod palette;
pub mod renderer;
mod service;
pub mod store;
pub mod types;

pub use backend::{FsBackend, MemoryBackend, VariantBackend};
pub use handler::create_avatar_router;
pub use initials::Initials;
pub use renderer::{AvatarRenderer, FontCandidate, InitialsRenderer};
pub use service::AvatarService;
pub use store::{Variant, VariantStore};
