pub mod recording_shell;
