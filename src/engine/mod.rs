//! Everything computed from or applied to a sheet
//!
//! Reads (regions, linear order, navigation) are pure functions of a sheet
//! value. Writes (mutations) return a new sheet. `Session` ties the two
//! together with history, clipboard and selection.

mod history;
mod linearize;
mod mutation;
mod navigate;
mod region;
mod session;

pub use history::{History, HistoryEntry, DEFAULT_CAPACITY};
pub use linearize::{linearize_regions, position_of};
pub use mutation::{
    cut_node, delete_node, insert_node, insert_template, new_sheet, paste_node,
    update_attributes, Clipboard, Edit, MutationError, Position,
};
pub use navigate::{navigate_horizontal, navigate_vertical, region_of, Horizontal, Vertical};
pub use region::{build_regions, Branch, Region};
pub use session::{Modal, Session, SessionError};
