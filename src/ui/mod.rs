//! Terminal output for the texsync CLI
//!
//! Uses `cliclack` for spinners and log lines and `indicatif` for the
//! hashing progress bar. When stdout is not a terminal (CI, pipes) every
//! helper falls back to plain prefixed lines.
//!
//! ```rust,ignore
//! use texsync::ui::{self, UiContext, TaskSpinner};
//!
//! let ctx = UiContext::detect();
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Build queued…");
//! spinner.stop("Build b42 succeeded");
//! ui::key_value(&ctx, "Cached", "12 files");
//! ```

mod context;
mod output;
mod progress;
mod prompts;
mod theme;

pub use context::UiContext;
pub use output::{
    intro, key_value, note, outro_error, outro_success, outro_warn, remark, step_info, step_ok,
    step_ok_detail, step_warn, step_warn_hint,
};
pub use progress::{HashProgress, TaskSpinner};
pub use prompts::confirm;
pub use theme::{init_theme, TexsyncTheme};
