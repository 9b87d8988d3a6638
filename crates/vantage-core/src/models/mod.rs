pub mod clip;
pub mod session;

pub use clip::{ClipRecord, PlayableUrl, RequestPurpose, ResolutionSpec, StreamRequestParams};
pub use session::HlsSession;
