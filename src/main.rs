//! `jam` command line.
//!
//! Build mode prints the IR to stdout, writes an object file and links it into an
//! executable. Run mode JIT-executes the entry function instead. Logs go to stderr.

use std::{fs, path::PathBuf, process};

use anyhow::Context;
use clap::Parser;
use inkwell::context::Context as LlvmContext;
use tracing::{error, info, level_filters::LevelFilter};

use jam::{
    backend::{host_triple, write_object},
    compile_source,
    config::{LogFormat, Settings},
    jit,
    link::link_executable,
    CompileError,
};

#[derive(Parser)]
#[command(name = "jam")]
#[command(version)]
#[command(about = "Compile Jam source to a native executable", long_about = None)]
struct Cli {
    /// JIT-execute the entry function instead of building an executable
    #[arg(long)]
    run: bool,

    #[arg(value_name = "FILENAME")]
    input: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version print to stdout and succeed; anything else is a usage error
            let _ = err.print();
            process::exit(if err.use_stderr() { 1 } else { 0 });
        }
    };

    let settings = Settings::from_env();
    init_tracing(&settings);
    info!(
        output = %settings.output_path().display(),
        output_source = %settings.output.source,
        entry = %settings.entry.value,
        entry_source = %settings.entry.source,
        "settings resolved"
    );

    let src = fs::read_to_string(&cli.input)
        .with_context(|| format!("Could not open file {}", cli.input.display()))?;

    let ctx = LlvmContext::create();
    let codegen = compile_source(&ctx, &src).inspect_err(log_failure)?;

    if cli.run {
        codegen.verify().inspect_err(log_failure)?;
        let entry = settings.entry.value.as_str();
        let signature = codegen
            .signature(entry)
            .cloned()
            .ok_or_else(|| CompileError::UnknownFunction(entry.to_string()))
            .inspect_err(log_failure)?;
        let outcome = jit::run(codegen.module(), entry, &signature).inspect_err(log_failure)?;
        println!("{}", outcome.report(entry));
        return Ok(());
    }

    print!("{}", codegen.print_ir());

    let out_exe = settings.output_path();
    let obj = settings.object_path();
    let triple = host_triple();
    write_object(codegen.module(), &triple, &obj).inspect_err(log_failure)?;
    link_executable(&obj, out_exe)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perm = fs::metadata(out_exe)?.permissions();
        perm.set_mode(0o755);
        fs::set_permissions(out_exe, perm)?;
    }

    println!("Built {}", out_exe.display());
    Ok(())
}

fn init_tracing(settings: &Settings) {
    let level = settings
        .log_level
        .value
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::WARN);
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .with_level(true);
    match settings.log_format.value {
        LogFormat::Json => builder.json().with_current_span(false).init(),
        LogFormat::Text => builder.init(),
    }
}

fn log_failure(err: &CompileError) {
    error!(category = err.category(), error = %err, "compilation failed");
}
