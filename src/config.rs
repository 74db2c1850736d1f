// Command line processing for the reference host.

use argh::FromArgs;

/// A small stack-based concatenative language.
#[derive(FromArgs, Debug)]
pub struct Options {
    /// evaluate an expression before any files
    #[argh(option, short = 'e', long = "eval")]
    pub eval: Vec<String>,

    /// print the compiled tree of each source instead of running it
    #[argh(switch, short = 'd')]
    pub dump: bool,

    /// source files to run, one program slot each
    #[argh(positional)]
    pub files: Vec<String>,
}

impl Options {
    pub fn from_env() -> Options {
        argh::from_env()
    }

    /// Without any sources the host drops into the interactive prompt.
    pub fn interactive(&self) -> bool {
        self.eval.is_empty() && self.files.is_empty()
    }
}
