use thiserror::Error;

use crate::resource::SoundHandle;

/// Why a play request was rejected. Play operations log these and report
/// `false`; nothing in the frame loop propagates them further.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayError {
    #[error("invalid sound handle")]
    InvalidHandle,
    #[error("sound {0} could not be resolved")]
    Unresolved(SoundHandle),
    #[error("sound {0} has no decodable audio")]
    NoAudio(SoundHandle),
    #[error("sound {0} has no frames")]
    ZeroFrames(SoundHandle),
    #[error("start frame {start} is past the end of a {frames}-frame sound")]
    StartFrameOutOfRange { start: u64, frames: u64 },
    #[error("volume is below the audible threshold")]
    VolumeTooLow,
}
