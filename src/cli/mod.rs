pub mod args;
pub mod play;
pub mod recordings;

pub use args::{Cli, CliCommand, PlayCliArgs, RecordingsCliArgs, RecordingsCommand};
pub use play::handle_play_command;
pub use recordings::handle_recordings_command;
