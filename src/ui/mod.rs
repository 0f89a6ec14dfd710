pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{
    book_header, cancelled, error, header, info, is_quiet, muted, outcome, section, status, success,
    summary_row, warn,
};
pub use table::{BookTable, ContactTable};
pub use theme::{theme, Theme};
