mod buffer;
pub mod order;
pub mod reader;
pub mod writer;

pub use order::{ByteOrder, Signedness};
pub use reader::BitReader;
pub use writer::BitWriter;
