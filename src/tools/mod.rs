mod command_runner;
mod ffmpeg_command;
mod ffmpeg_transcoder;
mod ffprobe_info;
mod file_mover;
mod file_scanner;
mod filename_parser;
mod media_kind;
mod path_validator;
mod tool_check;
mod transcoder;

pub use command_runner::{CommandOutput, run_command};
pub use ffmpeg_command::FfmpegCommand;
pub use ffmpeg_transcoder::FfmpegTranscoder;
pub use ffprobe_info::{
    ProbeQuery, parse_bit_rate, parse_codec_name, parse_duration, parse_resolution,
};
pub use file_mover::move_file;
pub use file_scanner::{SourceFile, scan_source_files};
pub use filename_parser::ParsedName;
pub use media_kind::{MediaKind, mime_type};
pub use path_validator::{ensure_directory_exists, validate_directory_exists};
pub use tool_check::{REQUIRED_TOOLS, check_external_tools, locate};
pub use transcoder::{Transcoder, VideoProbe};
