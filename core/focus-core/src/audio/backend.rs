//! Platform audio primitives the adapter drives.

use crate::error::Result;

/// Handle to a decoded sound buffer.
pub type BufferId = u64;

/// Handle to one playing instance of a buffer.
pub type VoiceId = u64;

/// Buffered, low-latency audio primitive.
pub trait AudioBackend: Send {
    /// False when the platform has no usable buffered audio output.
    fn is_available(&self) -> bool;

    /// Unlocks output after a user interaction.
    fn unlock(&mut self) -> Result<()>;

    fn decode(&mut self, asset: &str) -> Result<BufferId>;

    /// Starts one instance of `buffer` through its own gain stage.
    fn start(&mut self, buffer: BufferId, gain: f32) -> Result<VoiceId>;

    /// Stops a voice. Unknown or finished voices are ignored.
    fn stop(&mut self, voice: VoiceId);

    fn is_playing(&self, voice: VoiceId) -> bool;
}

/// Simple element-based playback used as a one-shot fallback.
pub trait ElementPlayer: Send {
    fn play(&mut self, asset: &str, gain: f32) -> Result<()>;

    fn stop_all(&mut self);
}
