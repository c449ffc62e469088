//! Timed arithmetic quiz protocol.
//! Host-driven: no I/O; host passes messages, time and randomness and receives replies.

pub mod aggregate;
pub mod config;
pub mod export;
pub mod ledger;
pub mod protocol;
pub mod puzzle;
pub mod render;
pub mod round;
pub mod session;
pub mod wire;

pub use aggregate::{summarize, Summary};
pub use config::{AnswerPolicy, ClientVars, ConfigError, RoundConfig};
pub use ledger::{Outcome, PlayerId, Trial, TrialLedger};
pub use protocol::{AnswerValue, Inbound, MalformedAnswer, MessageError, Outbound};
pub use puzzle::{Puzzle, PuzzleGenerator};
pub use render::{PlainText, Renderer, SvgDataUri};
pub use round::{HandleError, RoundHandler};
pub use session::{Player, Session, SessionError};
pub use wire::{decode_frame, encode_frame, FrameDecodeError, FrameEncodeError};
