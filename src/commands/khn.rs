use clap::Parser;
use std::path::PathBuf;

/// Converts a .cue sheet and its .bin files into a single kHn image.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
pub struct ConvertCommand {
    /// Input .cue file, the referenced .bin files must be in the same folder
    #[arg(value_name = "INPUT_CUE")]
    pub input_cue: PathBuf,

    /// Output kHn file path, defaults to the cue name with .khn extension
    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Game ID used as a prefix for the default output name, e.g. SLUS-00594
    #[arg(long, short = 'g', value_name = "GAME_ID")]
    pub game_id: Option<String>,

    /// Force overwrite of the output file if it already exists
    #[arg(long, short = 'f', default_value_t = false)]
    pub force: bool,
}

/// Converts every .cue sheet in a folder.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
pub struct BatchCommand {
    /// Folder containing .cue and .bin files
    #[arg(value_name = "INPUT_DIR")]
    pub input_dir: PathBuf,

    /// Folder for the kHn files, defaults to the input folder
    #[arg(long, short = 'o', value_name = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(long, short = 'f', default_value_t = false)]
    pub force: bool,
}

/// Prints the parsed track table and the resulting image layout without converting.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
pub struct InfoCommand {
    /// Input .cue file
    #[arg(value_name = "INPUT_CUE")]
    pub input_cue: PathBuf,
}
