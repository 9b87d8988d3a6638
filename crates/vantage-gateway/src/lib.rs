//! The video access gateway core.
//!
//! Turns a request for "video of camera C between T1 and T2" into a playable
//! URL: derives a deterministic remote stream name, requests an edge upload
//! when the remote stream is missing or expired, signs provider requests
//! (SigV4), and rewrites the provider's HLS playlists so every sub-resource
//! routes back through the gateway and is validated against a recorded
//! session.

pub mod edge;
pub mod identity;
pub mod orchestrator;
pub mod playlist;
pub mod provider;
pub mod relay;
pub mod retention;
pub mod session;
pub mod signer;

pub use edge::{EdgeMessenger, HttpEdgeMessenger};
pub use orchestrator::{ClipStore, ClipUploadOrchestrator};
pub use provider::{FragmentPlaylist, ProviderClient, StreamingProvider};
pub use relay::PlaylistRelay;
pub use retention::RetentionSynchronizer;
pub use session::{MemorySessionStore, RedisSessionStore, SessionRegistry, SessionStore};
pub use signer::{Signer, SigningCredentials};
