//! Exit codes for the CLI tool.

/// Project loaded and written
pub const SUCCESS: i32 = 0;
/// Loading or writing the project failed
pub const FATAL_ERROR: i32 = 2;
/// Invalid command line arguments or paths
pub const BAD_ARGS: i32 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    FatalError,
    BadArgs,
}

impl ExitCode {
    /// Returns the numeric exit code
    pub fn code(self) -> i32 {
        match self {
            Self::Success => SUCCESS,
            Self::FatalError => FATAL_ERROR,
            Self::BadArgs => BAD_ARGS,
        }
    }
}
