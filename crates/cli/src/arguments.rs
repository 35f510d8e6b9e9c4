//! Command-line parsing.

use std::ffi::OsString;

use clap::{Arg, ArgAction, Command, builder::OsStringValueParser, value_parser};

/// Deterministic help text describing the supported options.
const HELP_TEXT: &str = concat!(
    "oc-scp ",
    env!("CARGO_PKG_VERSION"),
    "\n",
    "\n",
    "Usage: oc-scp [OPTIONS] FROM TO\n",
    "\n",
    "Copies a file or directory tree between the local host and a remote host\n",
    "reached through ssh. Remote operands are written [user@]host:path; an\n",
    "empty remote path names the remote home directory. Copies between two\n",
    "local paths are delegated to cp -R.\n",
    "\n",
    "Options:\n",
    "  -r, --recursive        Copy directories recursively (default).\n",
    "      --no-recursive     Refuse to copy directories.\n",
    "  -P, --port=PORT        Connect to PORT on the remote host.\n",
    "  -i, --identity=FILE    Pass FILE to ssh as the identity file.\n",
    "  -o, --ssh-option=OPT   Pass -o OPT to ssh (repeatable).\n",
    "  -S, --rsh=PROGRAM      Use PROGRAM (with arguments) as the remote shell.\n",
    "  -B, --batch-mode       Never prompt for passwords or passphrases.\n",
    "  -q, --quiet            Disable the progress bar and informational output.\n",
    "  -v, --verbose          Increase verbosity (repeatable).\n",
    "  -h, --help             Show this help message and exit.\n",
    "  -V, --version          Output version information and exit.\n",
    "\n",
    "Environment:\n",
    "  OC_SCP_RSH             Remote shell used when --rsh is absent.\n",
    "  OC_SCP_CP              Program used for local-to-local copies (default cp).\n",
    "  OC_SCP_LOG             Tracing filter directives for developer output.\n",
);

/// Parsed command-line options before environment defaults are applied.
#[derive(Debug, Default, Eq, PartialEq)]
pub(crate) struct ParsedArgs {
    pub(crate) show_help: bool,
    pub(crate) show_version: bool,
    pub(crate) recursive: bool,
    pub(crate) port: Option<u16>,
    pub(crate) identity: Option<OsString>,
    pub(crate) ssh_options: Vec<OsString>,
    pub(crate) rsh: Option<OsString>,
    pub(crate) batch_mode: bool,
    pub(crate) quiet: bool,
    pub(crate) verbosity: u8,
    pub(crate) operands: Vec<OsString>,
}

/// Builds the `clap` command used for parsing.
fn clap_command() -> Command {
    Command::new("oc-scp")
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg_required_else_help(false)
        .arg(
            Arg::new("help")
                .long("help")
                .short('h')
                .help("Show this help message and exit.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .short('V')
                .help("Output version information and exit.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("recursive")
                .long("recursive")
                .short('r')
                .help("Copy directories recursively (default).")
                .action(ArgAction::SetTrue)
                .overrides_with("no-recursive"),
        )
        .arg(
            Arg::new("no-recursive")
                .long("no-recursive")
                .help("Refuse to copy directories.")
                .action(ArgAction::SetTrue)
                .overrides_with("recursive"),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .short('P')
                .value_name("PORT")
                .help("Connect to PORT on the remote host.")
                .num_args(1)
                .action(ArgAction::Set)
                .value_parser(value_parser!(u16).range(1..)),
        )
        .arg(
            Arg::new("identity")
                .long("identity")
                .short('i')
                .value_name("FILE")
                .help("Pass FILE to ssh as the identity file.")
                .num_args(1)
                .action(ArgAction::Set)
                .value_parser(OsStringValueParser::new()),
        )
        .arg(
            Arg::new("ssh-option")
                .long("ssh-option")
                .short('o')
                .value_name("OPT")
                .help("Pass -o OPT to ssh.")
                .action(ArgAction::Append)
                .value_parser(OsStringValueParser::new()),
        )
        .arg(
            Arg::new("rsh")
                .long("rsh")
                .short('S')
                .value_name("PROGRAM")
                .help("Use PROGRAM as the remote shell.")
                .num_args(1)
                .action(ArgAction::Set)
                .value_parser(OsStringValueParser::new()),
        )
        .arg(
            Arg::new("batch-mode")
                .long("batch-mode")
                .short('B')
                .help("Never prompt for passwords or passphrases.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .help("Disable the progress bar and informational output.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Increase verbosity.")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("operands")
                .action(ArgAction::Append)
                .num_args(0..)
                .value_parser(OsStringValueParser::new()),
        )
}

/// Parses command-line arguments into a [`ParsedArgs`] structure.
pub(crate) fn parse_args<I, S>(arguments: I) -> Result<ParsedArgs, clap::Error>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut args: Vec<OsString> = arguments.into_iter().map(Into::into).collect();

    if args.is_empty() {
        args.push(OsString::from("oc-scp"));
    }

    let mut matches = clap_command().try_get_matches_from(args)?;

    let recursive = !matches.get_flag("no-recursive");
    let operands = matches
        .remove_many::<OsString>("operands")
        .map(|values| values.collect())
        .unwrap_or_default();
    let ssh_options = matches
        .remove_many::<OsString>("ssh-option")
        .map(|values| values.collect())
        .unwrap_or_default();

    Ok(ParsedArgs {
        show_help: matches.get_flag("help"),
        show_version: matches.get_flag("version"),
        recursive,
        port: matches.remove_one::<u16>("port"),
        identity: matches.remove_one::<OsString>("identity"),
        ssh_options,
        rsh: matches.remove_one::<OsString>("rsh"),
        batch_mode: matches.get_flag("batch-mode"),
        quiet: matches.get_flag("quiet"),
        verbosity: matches.get_count("verbose"),
        operands,
    })
}

/// Renders the help text describing the supported options.
pub(crate) fn render_help() -> String {
    HELP_TEXT.to_owned()
}
