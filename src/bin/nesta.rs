use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::exit;

use anyhow::Result;
use simple_logger::SimpleLogger;

use nesta_config::Settings;
use nesta_css::compiler::Compiler;
use nesta_css::config::CompilerConfig;

fn bail(message: &str) -> ! {
    eprintln!("error: {message}");
    exit(1);
}

fn build_command() -> clap::Command {
    clap::Command::new("nesta")
        .version("0.1.0")
        .about("Nesta CSS preprocessor")
        .subcommand_required(true)
        .subcommand(
            clap::Command::new("compile")
                .about("Compile a stylesheet to plain CSS")
                .arg(
                    clap::Arg::new("input")
                        .help("The input stylesheet. Use - to read from stdin.")
                        .required(true)
                        .index(1),
                )
                .arg(
                    clap::Arg::new("output")
                        .help("The stylesheet to write to. Use - to write to stdout.")
                        .required(true)
                        .index(2),
                )
                .arg(
                    clap::Arg::new("conf")
                        .help("Config file path (overrides the default lookup)")
                        .long("conf")
                        .value_name("FILE"),
                )
                .arg(
                    clap::Arg::new("default_encoding")
                        .long("default-encoding")
                        .value_name("ENC"),
                )
                .arg(
                    clap::Arg::new("source_encoding")
                        .long("source-encoding")
                        .value_name("ENC"),
                )
                .arg(
                    clap::Arg::new("dest_encoding")
                        .long("dest-encoding")
                        .value_name("ENC"),
                )
                .arg(
                    clap::Arg::new("enable_imports")
                        .long("enable-imports")
                        .value_name("(yes|no)")
                        .help("(default: yes)"),
                )
                .arg(
                    clap::Arg::new("enable_flatten")
                        .long("enable-flatten")
                        .value_name("(yes|no)")
                        .help("(default: yes)"),
                )
                .arg(
                    clap::Arg::new("enable_solve")
                        .long("enable-solve")
                        .value_name("(yes|no)")
                        .help("(default: yes)"),
                )
                .arg(
                    clap::Arg::new("curfile_relative_imports")
                        .long("curfile-relative-imports")
                        .value_name("(enable|disable)")
                        .help("(default: enable)"),
                )
                .arg(
                    clap::Arg::new("toplevel_relative_imports")
                        .long("toplevel-relative-imports")
                        .value_name("(enable|disable)")
                        .help("(default: enable)"),
                )
                .arg(
                    clap::Arg::new("debug")
                        .help("Enable debug logging")
                        .short('d')
                        .long("debug")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
}

/// Command-line values override file values, which override the defaults
fn gather_settings(matches: &clap::ArgMatches) -> Settings {
    let conf = matches.get_one::<String>("conf").map(PathBuf::from);
    let mut settings = match Settings::load(conf.as_deref()) {
        Ok(settings) => settings,
        Err(err) => bail(&err.to_string()),
    };

    for option in [
        "default_encoding",
        "source_encoding",
        "dest_encoding",
        "enable_imports",
        "enable_flatten",
        "enable_solve",
        "curfile_relative_imports",
        "toplevel_relative_imports",
    ] {
        if let Some(value) = matches.get_one::<String>(option) {
            if let Err(err) = settings.set(option, value) {
                bail(&err.to_string());
            }
        }
    }

    settings
}

fn compiler_config(settings: &Settings) -> CompilerConfig {
    CompilerConfig {
        default_encoding: settings.default_encoding.clone(),
        source_encoding: settings.source_encoding.clone(),
        dest_encoding: settings.dest_encoding.clone(),
        enable_imports: settings.enable_imports,
        enable_solve: settings.enable_solve,
        enable_flatten: settings.enable_flatten,
        curfile_relative_imports: settings.curfile_relative_imports,
        toplevel_relative_imports: settings.toplevel_relative_imports,
        stop_on_import_not_found: settings.stop_on_import_not_found,
        stop_on_import_syntax_error: settings.stop_on_import_syntax_error,
        import_directories: settings.import_directories.clone(),
        ..CompilerConfig::default()
    }
}

fn run_compile(matches: &clap::ArgMatches) -> Result<()> {
    if matches.get_flag("debug") {
        SimpleLogger::new().init()?;
    }

    let settings = gather_settings(matches);
    let compiler = Compiler::new(compiler_config(&settings));

    let input = matches
        .get_one::<String>("input")
        .map(String::as_str)
        .unwrap_or("-");
    let output = matches
        .get_one::<String>("output")
        .map(String::as_str)
        .unwrap_or("-");

    if input == "-" {
        let mut bytes = Vec::new();
        std::io::stdin().read_to_end(&mut bytes)?;
        let compiled = match compiler.compile_bytes(&bytes, "<stdin>") {
            Ok(compiled) => compiled,
            Err(err) => bail(&err.to_string()),
        };
        write_output(output, &compiled)?;
    } else {
        let input = Path::new(input);
        if output == "-" {
            let bytes = std::fs::read(input)?;
            let compiled = match compiler.compile_bytes(&bytes, &input.display().to_string()) {
                Ok(compiled) => compiled,
                Err(err) => bail(&err.to_string()),
            };
            write_output("-", &compiled)?;
        } else if let Err(err) = compiler.compile_file(input, Path::new(output)) {
            bail(&err.to_string());
        }
    }

    Ok(())
}

fn write_output(output: &str, bytes: &[u8]) -> Result<()> {
    if output == "-" {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(bytes)?;
        stdout.flush()?;
    } else {
        std::fs::write(output, bytes)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let matches = build_command().get_matches();

    match matches.subcommand() {
        Some(("compile", sub_matches)) => run_compile(sub_matches),
        _ => bail("expected a subcommand"),
    }
}
