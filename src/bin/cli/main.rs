//! Command-line editor for 3MF slicer projects.
//!
//! Loads a project, validates every document against the project's rules and
//! writes it to a new archive.

mod exit_codes;

use anyhow::{Context, bail};
use clap::{ArgAction, Parser};
use exit_codes::ExitCode;
use std::path::{Path, PathBuf};
use threemf_editor::project::constants::PROJECT_EXTENSION;
use threemf_editor::{OutputTarget, Options, ProjectEditor, WrittenOutput};

/// Load a 3MF slicer project and write it back out
#[derive(Parser, Debug)]
#[command(name = "threemf-editor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Project to load
    input_file: PathBuf,

    /// Project to write; must not exist yet
    output_file: PathBuf,

    /// Log attributes and elements no schema consumes [default]
    #[arg(long, overrides_with = "noprint_xml_unused")]
    print_xml_unused: bool,
    #[arg(long, overrides_with = "print_xml_unused")]
    noprint_xml_unused: bool,

    /// Fail on attributes and elements no schema consumes [default]
    #[arg(long, overrides_with = "noassert_xml_unused")]
    assert_xml_unused: bool,
    #[arg(long, overrides_with = "assert_xml_unused")]
    noassert_xml_unused: bool,

    /// Recover from malformed XML [default]
    #[arg(long, overrides_with = "norecover_xml_errors")]
    recover_xml_errors: bool,
    #[arg(long, overrides_with = "recover_xml_errors")]
    norecover_xml_errors: bool,

    /// Treat undeclared namespace prefixes as unbound
    #[arg(long, overrides_with = "norecover_undeclared_namespace")]
    recover_undeclared_namespace: bool,
    #[arg(long, overrides_with = "recover_undeclared_namespace")]
    norecover_undeclared_namespace: bool,

    /// YAML file with load options; flags given on the command line win
    #[arg(long, value_name = "YAML")]
    options: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Defaults applied when neither a flag nor an options file decides.
const DEFAULT_OPTIONS: Options = Options {
    print_xml_unused: true,
    assert_xml_unused: true,
    recover_xml_errors: true,
    recover_undeclared_namespace: false,
};

fn flag(on: bool, off: bool, base: bool) -> bool {
    if on {
        true
    } else if off {
        false
    } else {
        base
    }
}

impl Cli {
    /// Merge the options file (or the defaults) with the paired flags.
    fn resolve_options(&self) -> anyhow::Result<Options> {
        let base = match &self.options {
            Some(path) => Options::from_yaml_file(path)
                .with_context(|| format!("Failed to read options from {}", path.display()))?,
            None => DEFAULT_OPTIONS,
        };

        Ok(Options {
            print_xml_unused: flag(
                self.print_xml_unused,
                self.noprint_xml_unused,
                base.print_xml_unused,
            ),
            assert_xml_unused: flag(
                self.assert_xml_unused,
                self.noassert_xml_unused,
                base.assert_xml_unused,
            ),
            recover_xml_errors: flag(
                self.recover_xml_errors,
                self.norecover_xml_errors,
                base.recover_xml_errors,
            ),
            recover_undeclared_namespace: flag(
                self.recover_undeclared_namespace,
                self.norecover_undeclared_namespace,
                base.recover_undeclared_namespace,
            ),
        })
    }

    fn log_spec(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

fn has_project_extension(path: &Path) -> bool {
    path.to_str()
        .is_some_and(|name| name.ends_with(PROJECT_EXTENSION))
}

/// Refuse paths before anything is loaded or written.
fn check_paths(input: &Path, output: &Path) -> anyhow::Result<()> {
    if !input.exists() {
        bail!("Input file {} does not exist", input.display());
    }
    if !has_project_extension(input) {
        bail!("Input file {} is not a {PROJECT_EXTENSION} file", input.display());
    }
    if output.exists() {
        bail!("Output file {} already exists", output.display());
    }
    if !has_project_extension(output) {
        bail!("Output file {} is not a {PROJECT_EXTENSION} file", output.display());
    }
    Ok(())
}

fn edit(cli: &Cli, options: Options) -> anyhow::Result<()> {
    let editor = ProjectEditor::new(
        cli.input_file.as_path(),
        OutputTarget::Path(cli.output_file.clone()),
        options,
    )
    .with_context(|| format!("Failed to load {}", cli.input_file.display()))?;

    let container = editor.container();
    println!(
        "{}: {} model document(s), {} object(s), {} metafile(s)",
        cli.input_file.display(),
        container.model_documents().len(),
        container.object_index().len(),
        container.metafiles().len(),
    );
    if let Some(config) = container.config() {
        println!("  config: {}", config.path());
        let orphaned = container.orphaned_config_objects();
        if !orphaned.is_empty() {
            println!("  config objects without a model object: {}", orphaned.join(", "));
        }
    }

    match editor.write().context("Failed to write project")? {
        WrittenOutput::File(path) => println!("Wrote {}", path.display()),
        WrittenOutput::Memory(bytes) => println!("Wrote {} bytes", bytes.len()),
    }
    Ok(())
}

fn run(cli: &Cli) -> ExitCode {
    if let Err(e) = check_paths(&cli.input_file, &cli.output_file) {
        eprintln!("Error: {e}");
        return ExitCode::BadArgs;
    }
    let options = match cli.resolve_options() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::BadArgs;
        },
    };
    log::debug!("Options: {options:?}");

    match edit(cli, options) {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FatalError
        },
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = if e.use_stderr() {
                exit_codes::BAD_ARGS
            } else {
                exit_codes::SUCCESS
            };
            std::process::exit(code);
        },
    };

    let _logger = match flexi_logger::Logger::try_with_env_or_str(cli.log_spec())
        .and_then(|logger| logger.log_to_stderr().start())
    {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("Warning: failed to start logger: {e}");
            None
        },
    };

    std::process::exit(run(&cli).code());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["threemf-editor", "in.3mf", "out.3mf"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        assert_eq!(parse(&[]).resolve_options().unwrap(), DEFAULT_OPTIONS);
    }

    #[test]
    fn test_paired_flags_last_wins() {
        let options = parse(&["--noassert-xml-unused", "--recover-undeclared-namespace"])
            .resolve_options()
            .unwrap();
        assert!(!options.assert_xml_unused);
        assert!(options.recover_undeclared_namespace);
        assert!(options.print_xml_unused);

        let options = parse(&["--norecover-xml-errors", "--recover-xml-errors"])
            .resolve_options()
            .unwrap();
        assert!(options.recover_xml_errors);

        let options = parse(&["--print-xml-unused", "--noprint-xml-unused"])
            .resolve_options()
            .unwrap();
        assert!(!options.print_xml_unused);
    }

    #[test]
    fn test_options_file_is_overridden_by_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.yaml");
        std::fs::write(
            &path,
            "print_xml_unused: false\nassert_xml_unused: false\nrecover_undeclared_namespace: true\n",
        )
        .unwrap();
        let path = path.to_str().unwrap();

        let options = parse(&["--options", path, "--assert-xml-unused"])
            .resolve_options()
            .unwrap();
        assert!(!options.print_xml_unused);
        assert!(options.assert_xml_unused);
        assert!(!options.recover_xml_errors);
        assert!(options.recover_undeclared_namespace);
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(parse(&[]).log_spec(), "warn");
        assert_eq!(parse(&["-v"]).log_spec(), "info");
        assert_eq!(parse(&["-vv"]).log_spec(), "debug");
    }

    #[test]
    fn test_check_paths() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.3mf");
        std::fs::write(&input, b"").unwrap();
        let wrong_ext = dir.path().join("in.zip");
        std::fs::write(&wrong_ext, b"").unwrap();
        let output = dir.path().join("out.3mf");

        assert!(check_paths(&input, &output).is_ok());
        assert!(check_paths(&dir.path().join("missing.3mf"), &output).is_err());
        assert!(check_paths(&wrong_ext, &output).is_err());
        assert!(check_paths(&input, &input).is_err());
        assert!(check_paths(&input, &dir.path().join("out.zip")).is_err());
    }

    #[test]
    fn test_bad_paths_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.3mf");
        let cli = Cli::try_parse_from([
            "threemf-editor",
            dir.path().join("missing.3mf").to_str().unwrap(),
            output.to_str().unwrap(),
        ])
        .unwrap();

        assert_eq!(run(&cli), ExitCode::BadArgs);
        assert!(!output.exists());
    }

    #[test]
    fn test_load_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.3mf");
        std::fs::write(&input, b"not a zip").unwrap();
        let output = dir.path().join("out.3mf");
        let cli = Cli::try_parse_from([
            "threemf-editor",
            input.to_str().unwrap(),
            output.to_str().unwrap(),
        ])
        .unwrap();

        assert_eq!(run(&cli), ExitCode::FatalError);
        assert!(!output.exists());
    }
}
