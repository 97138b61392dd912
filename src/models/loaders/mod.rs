pub mod table_loader;

pub use table_loader::{load_table, RawTable};
