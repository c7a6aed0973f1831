// Crate root: declare modules and control visibility
pub mod backend;
pub mod comment;
pub mod error;
pub mod event_hub;
pub mod hover;
pub mod logging;
pub mod metadata;
pub mod model;
pub mod operand;
pub mod protocol;
pub mod request_handler;
pub mod row;
pub mod serve;
pub mod session;
pub mod snapshot;
pub mod storage;
pub mod transport;
pub mod utils;

// Re-export commonly used API from the library for binaries/tests
pub use comment::render_comment;
pub use event_hub::{Event, EventHub, Upstream};
pub use metadata::MetadataCache;
pub use model::{
    CommentDisplay, Instruction, Operand, OperandInfo, RawComment, RawInstruction,
    DATA_WORD_OPCODE_ID,
};
pub use operand::render_operand;
pub use row::{render_row, RenderedRow};
pub use session::{Session, UiNotifier};
pub use snapshot::{ActiveView, SnapshotStore};
