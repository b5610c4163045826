//! CLI formatting utilities.
//!
//! Consistent colors and layout for headers, status lines, summary boxes
//! and result tables.

mod headers;
mod output;
mod progress;
mod status;
mod tables;

pub use headers::{print_section_header, SectionStyle};
pub use output::{format_duration, print_key_value, print_separator_with_spacing, print_summary_box};
pub use progress::create_progress_bar;
pub use status::{print_error, print_info, print_success, print_warning, Status};
pub use tables::{print_command_list, print_library_list, print_result_table};
