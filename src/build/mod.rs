mod clean;
mod compdb;
mod compile;
mod core;
mod dispatch;
mod feedback;
mod layout;
mod library;
mod link;
mod mode;
mod process;
mod staleness;
mod utils;

pub use clean::clean;
pub use compile::{CompileUnit, RELEASE_PROFILE, bitcode_flags, bitcode_unit, compile, native_unit};
pub use self::core::{BuildContext, BuildReport, build_and_run, build_project};
pub use dispatch::dispatch_all;
pub use feedback::FeedbackAnalyzer;
pub use layout::OutputLayout;
pub use library::{LibraryOutcome, build_library, plan_units};
pub use link::{LinkOutcome, LinkPlan, bitcode_link_command, link, msvc_link_command};
pub use mode::{Arch, LinkChoice, LinkStrategy, Mode, ModeRequest};
pub use process::{FAILURE_MARKER, LineClass, OutputLine, ProcessResult, ProcessRunner, Stream, classify};
pub use staleness::{is_stale, is_stale_against};
pub use utils::{BUILD_FILE, load_config, std_flag_clang, std_flag_msvc};
