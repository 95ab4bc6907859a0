// This file is part of the ppguard package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use clap::{crate_version, Arg, ArgAction, Command};

const ABOUT: &str = "Preprocess C/C++ files while preserving #include directives";
const USAGE: &str = "ppguard [OPTION]... INPUT...";
const AFTER_HELP: &str = "\
Each #include line is hidden behind a pair of synthetic lines (the pre
stage), the file is run through the preprocessor (the mid stage), and the
includes that survived conditional compilation are restored (the post
stage). The default preprocessor command is 'clang -E -P -C -'; see the
-p, -c, -D, -K and -S options.

Inputs and outputs are paired positionally and each pair is processed
concurrently; pairing stops at the shorter list. With no output given,
every input is written to stdout. Use '-' for stdin or stdout, and prefix
a path with '@' to read one path per line from that file.

The -I and -O options require the stdbuf executable to be in $PATH.

The LOG_LEVEL environment variable (error, warn, info, debug, trace)
overrides the default 'warn' verbosity.";

pub mod options {
    pub const INPUT: &str = "input";
    pub const VERSION: &str = "version";
    pub const OUT: &str = "out";
    pub const QUEUE: &str = "queue";
    pub const POLL: &str = "poll";
    pub const TIMEOUT: &str = "timeout";
    pub const TEST: &str = "test";
    pub const STAGE: &str = "stage";
    pub const SCRIPT: &str = "script";
    pub const RANGE: &str = "range";
    pub const PATH: &str = "path";
    pub const CLANG: &str = "clang";
    pub const IBUFF: &str = "ibuff";
    pub const OBUFF: &str = "obuff";
    pub const DEFINE: &str = "define";
    pub const KEEP: &str = "keep";
    pub const NO_KEEP: &str = "no-keep";
}

pub fn uu_app() -> Command {
    Command::new(ppcore::util_name())
        .version(crate_version!())
        .disable_version_flag(true)
        .about(ABOUT)
        .override_usage(USAGE)
        .after_help(AFTER_HELP)
        .infer_long_args(true)
        .arg(
            Arg::new(options::VERSION)
                .short('v')
                .long(options::VERSION)
                .help("Print version")
                .action(ArgAction::Version),
        )
        .arg(
            Arg::new(options::INPUT)
                .help("input file path(s); use '-' to read from stdin, '@FILE' to read paths from FILE")
                .value_name("INPUT")
                .num_args(1..)
                .required(true),
        )
        .arg(
            Arg::new(options::OUT)
                .short('o')
                .long(options::OUT)
                .help("output file path; use '-' for stdout, '@FILE' to read paths from FILE")
                .value_name("OUT")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new(options::QUEUE)
                .short('q')
                .long(options::QUEUE)
                .help("line queue size limit for communicating with the preprocessor; <= 0 makes the queues unbounded")
                .value_name("SIZE")
                .default_value("0")
                .allow_hyphen_values(true)
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(options::POLL)
                .short('P')
                .long(options::POLL)
                .help("period for polling each carrier thread until it finished its work")
                .value_name("SEC")
                .default_value("1.0")
                .allow_hyphen_values(true)
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            Arg::new(options::TIMEOUT)
                .short('U')
                .long(options::TIMEOUT)
                .help("time to wait until the preprocessor finished its work")
                .value_name("SEC")
                .default_value("1.0")
                .allow_hyphen_values(true)
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            Arg::new(options::TEST)
                .short('t')
                .long(options::TEST)
                .help("discard all output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(options::STAGE)
                .short('s')
                .long(options::STAGE)
                .help("what stages to run")
                .value_name("STAGE")
                .num_args(1..)
                .action(ArgAction::Append)
                .value_parser(["pre", "mid", "post", "full"])
                .default_values(["full"]),
        )
        .arg(
            Arg::new(options::SCRIPT)
                .short('S')
                .long(options::SCRIPT)
                .help("run a shell script instead of the default preprocessor command")
                .value_name("SCRIPT"),
        )
        .arg(
            Arg::new(options::RANGE)
                .short('r')
                .long(options::RANGE)
                .help("process only the given line range(s), each as 'UPPER,LOWER' with LOWER < index < UPPER")
                .value_name("RANGE")
                .num_args(1..)
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new(options::PATH)
                .short('p')
                .long(options::PATH)
                .help("path to the preprocessor executable (default: search clang in $PATH)")
                .value_name("EXEC"),
        )
        .arg(
            Arg::new(options::CLANG)
                .short('c')
                .long(options::CLANG)
                .help("argument forwarded to the preprocessor")
                .value_name("ARG")
                .allow_hyphen_values(true)
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new(options::IBUFF)
                .short('I')
                .long(options::IBUFF)
                .help("buffering for the preprocessor's stdin")
                .value_name("MODE")
                .value_parser(["def", "line", "zero"])
                .default_value("def"),
        )
        .arg(
            Arg::new(options::OBUFF)
                .short('O')
                .long(options::OBUFF)
                .help("buffering for the preprocessor's stdout")
                .value_name("MODE")
                .value_parser(["def", "line", "zero"])
                .default_value("def"),
        )
        .arg(
            Arg::new(options::DEFINE)
                .short('D')
                .long(options::DEFINE)
                .help("preprocessor definitions (used for resolving #ifdef/#ifndef)")
                .value_name("DEF")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new(options::KEEP)
                .short('K')
                .long(options::KEEP)
                .help("pass -C to the preprocessor so comments are kept (default)")
                .overrides_with(options::NO_KEEP)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(options::NO_KEEP)
                .long(options::NO_KEEP)
                .help("do not pass -C to the preprocessor")
                .overrides_with(options::KEEP)
                .action(ArgAction::SetTrue),
        )
}
