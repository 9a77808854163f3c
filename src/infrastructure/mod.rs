// Infrastructure implementations for hitgraph: adapters for the debugger
// log, the rendering backend and the table UI.

pub mod capture_log;
pub mod dot_renderer;
pub mod memory;
pub mod selection;
pub mod table_view;

pub use capture_log::{read_capture_log, HitRecord};
pub use dot_renderer::DotRenderer;
pub use memory::{MemoryRenderer, MemoryTableView};
pub use selection::run_selection_loop;
pub use table_view::{JsonTableView, TextTableView};
